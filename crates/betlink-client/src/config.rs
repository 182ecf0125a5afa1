//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/betlink/config.toml` by default:
//!
//! ```toml
//! [agency]
//! id = "1"
//!
//! [server]
//! address = "server:12345"
//! framing = "length-prefixed"
//!
//! [batch]
//! max_amount = 100
//!
//! [data]
//! path = "/data/agency-1.csv"
//! ```
//!
//! Command-line flags override individual values (see [`crate::cli::Cli`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use betlink_core::{BatchLimits, DEFAULT_MAX_BATCH_AMOUNT, MAX_PACKET_SIZE};
use betlink_protocol::Framing;

use crate::session::SessionOptions;

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the betlink client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Agency identity.
    pub agency: AgencySettings,

    /// Server/connection settings.
    pub server: ServerSettings,

    /// Batching ceilings.
    pub batch: BatchSettings,

    /// Input data.
    pub data: DataSettings,

    /// Exchange behavior.
    pub session: SessionSettings,

    /// Logging.
    pub log: LogSettings,
}

/// Agency settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgencySettings {
    /// Agency identifier stamped on every bet.
    pub id: Option<String>,
}

/// Server/connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// `host:port` of the server.
    pub address: String,

    /// Connection timeout in seconds.
    pub connect_timeout: u64,

    /// Read/write timeout in seconds; unset blocks indefinitely.
    pub io_timeout: Option<u64>,

    /// Message framing; must match the server.
    pub framing: FramingSetting,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:12345".to_string(),
            connect_timeout: 5,
            io_timeout: None,
            framing: FramingSetting::default(),
        }
    }
}

impl ServerSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout.map(Duration::from_secs)
    }
}

/// Framing names accepted in config and on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FramingSetting {
    /// 4-byte length header before each message.
    #[default]
    LengthPrefixed,
    /// Newline-terminated messages only.
    Delimited,
}

impl From<FramingSetting> for Framing {
    fn from(setting: FramingSetting) -> Self {
        match setting {
            FramingSetting::LengthPrefixed => Framing::LengthPrefixed,
            FramingSetting::Delimited => Framing::Delimited,
        }
    }
}

/// Batching ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Maximum bets per batch.
    pub max_amount: usize,

    /// Maximum serialized bytes per batch.
    pub max_bytes: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_amount: DEFAULT_MAX_BATCH_AMOUNT,
            max_bytes: MAX_PACKET_SIZE,
        }
    }
}

/// Input data settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// CSV file with the agency's bets.
    pub path: Option<PathBuf>,
}

/// Exchange behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Ask the server for winners after the last batch.
    pub request_winners: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            request_winners: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("betlink")
            .join("config.toml")
    }

    /// Checks that everything a send run needs is present and sane.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();

        match self.agency.id.as_deref().map(str::trim) {
            None | Some("") => problems.push("agency.id is not set".to_string()),
            Some(id) if id.contains([',', ';', '=', '\n']) => {
                problems.push(format!("agency.id {id:?} contains a reserved character"))
            }
            Some(_) => {}
        }
        if self.server.address.trim().is_empty() {
            problems.push("server.address is empty".to_string());
        }
        if self.data.path.is_none() {
            problems.push("data.path is not set".to_string());
        }
        if self.batch.max_amount == 0 {
            problems.push("batch.max_amount must be at least 1".to_string());
        }
        if self.batch.max_bytes == 0 {
            problems.push("batch.max_bytes must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }

    pub fn batch_limits(&self) -> BatchLimits {
        BatchLimits::new(self.batch.max_amount, self.batch.max_bytes)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            request_winners: self.session.request_winners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn complete() -> ClientConfig {
        let mut config = ClientConfig::default();
        config.agency.id = Some("1".to_string());
        config.data.path = Some(PathBuf::from("/data/agency-1.csv"));
        config
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.server.address, "127.0.0.1:12345");
        assert_eq!(config.server.framing, FramingSetting::LengthPrefixed);
        assert_eq!(config.batch.max_amount, DEFAULT_MAX_BATCH_AMOUNT);
        assert_eq!(config.batch.max_bytes, MAX_PACKET_SIZE);
        assert!(config.session.request_winners);
        assert_eq!(config.log.level, "info");
        assert!(config.server.io_timeout().is_none());
    }

    #[test]
    fn parses_full_file() {
        let toml_content = r#"
[agency]
id = "4"

[server]
address = "server:12345"
connect_timeout = 2
io_timeout = 30
framing = "delimited"

[batch]
max_amount = 25

[data]
path = "/data/agency-4.csv"

[session]
request_winners = false

[log]
level = "debug"
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.agency.id.as_deref(), Some("4"));
        assert_eq!(config.server.address, "server:12345");
        assert_eq!(config.server.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.server.io_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(Framing::from(config.server.framing), Framing::Delimited);
        assert_eq!(config.batch.max_amount, 25);
        assert_eq!(config.batch.max_bytes, MAX_PACKET_SIZE);
        assert!(!config.session.request_winners);
        assert_eq!(config.log.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ClientConfig = toml::from_str("[batch]\nmax_amount = 3\n").unwrap();
        assert_eq!(config.batch.max_amount, 3);
        assert_eq!(config.server.connect_timeout, 5);
        assert_eq!(config.batch_limits(), BatchLimits::new(3, MAX_PACKET_SIZE));
    }

    #[test]
    fn unknown_framing_is_rejected() {
        let result: Result<ClientConfig, _> = toml::from_str("[server]\nframing = \"carrier-pigeon\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agency]\nid = \"2\"").unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.agency.id.as_deref(), Some("2"));
    }

    #[test]
    fn load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.contains("failed to read config"));
    }

    #[test]
    fn load_from_invalid_toml_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch\nmax_amount = ").unwrap();
        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(err.contains("failed to parse config"));
    }

    #[test]
    fn serialized_config_reloads() {
        let config = complete();
        let text = toml::to_string_pretty(&config).unwrap();
        let reloaded: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(reloaded.agency.id, config.agency.id);
        assert_eq!(reloaded.data.path, config.data.path);
        assert_eq!(reloaded.server.framing, config.server.framing);
    }

    #[test]
    fn validate_complete_config() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut config = ClientConfig::default();
        config.batch.max_amount = 0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("agency.id"));
        assert!(err.contains("data.path"));
        assert!(err.contains("max_amount"));
    }

    #[test]
    fn validate_rejects_reserved_agency_id() {
        let mut config = complete();
        config.agency.id = Some("1,2".to_string());
        assert!(config.validate().unwrap_err().contains("reserved"));
    }

    #[test]
    fn default_path_is_namespaced() {
        assert!(ClientConfig::default_path()
            .to_string_lossy()
            .contains("betlink"));
    }
}
