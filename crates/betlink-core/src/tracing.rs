//! Tracing setup for betlink binaries
//!
//! Library code only emits events; installing the global subscriber is left
//! to the binary, which calls [`init_tracing`] once at startup. Log output
//! always goes to stderr so that stdout stays free for command output.
//!
//! ```ignore
//! use betlink_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::for_cli(false, false, "info")?)?;
//! ```

use std::io;
use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Target prefix shared by every betlink crate.
const TARGET_PREFIX: &str = "betlink";

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),

    /// Unrecognized log level name
    #[error("invalid log level: {0:?}")]
    InvalidLevel(String),
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line human-readable format
    Pretty,
    /// Single-line human-readable format (default)
    #[default]
    Compact,
    /// JSON, one object per line
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level for betlink's own events when `RUST_LOG` is not set
    pub default_level: Level,
    /// Output format for log messages
    pub output_format: TracingOutputFormat,
    /// Whether to include file/line information
    pub include_location: bool,
    /// Whether to include the event target (module path)
    pub include_target: bool,
    /// Whether to include timestamps
    pub include_timestamp: bool,
    /// Explicit filter directive; takes precedence over `RUST_LOG`
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            include_timestamp: true,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Interactive debugging: every debug event, with source locations.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_location: true,
            include_target: true,
            include_timestamp: false,
            ..Self::default()
        }
    }

    /// Unattended runs (containers, CI): JSON lines for a log collector.
    #[must_use]
    pub fn unattended() -> Self {
        Self {
            output_format: TracingOutputFormat::Json,
            include_target: true,
            ..Self::default()
        }
    }

    /// Picks a preset from the command-line switches.
    ///
    /// `debug` wins over `level`; `json` only changes the output format.
    pub fn for_cli(debug: bool, json: bool, level: &str) -> Result<Self, TracingError> {
        match (debug, json) {
            (true, false) => Ok(Self::cli_debug()),
            (true, true) => Ok(Self::unattended().with_level(Level::DEBUG)),
            (false, true) => Self::unattended().with_level_name(level),
            (false, false) => Self::default().with_level_name(level),
        }
    }

    /// Set the default log level from its name (`"info"`, `"DEBUG"`, ...)
    pub fn with_level_name(self, name: &str) -> Result<Self, TracingError> {
        let level =
            Level::from_str(name.trim()).map_err(|_| TracingError::InvalidLevel(name.to_string()))?;
        Ok(self.with_level(level))
    }

    /// Set the default log level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set an explicit filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The directive used when neither an explicit filter nor `RUST_LOG` is
    /// set: betlink events at the default level, everything else off.
    pub fn default_directive(&self) -> String {
        format!("{}={}", TARGET_PREFIX, self.default_level)
    }

    fn filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(ref directive) = self.env_filter {
            return Ok(EnvFilter::try_new(directive)?);
        }
        Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive())))
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(io::stderr)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(self.include_target);

        match (self.output_format, self.include_timestamp) {
            (TracingOutputFormat::Pretty, true) => layer.pretty().boxed(),
            (TracingOutputFormat::Pretty, false) => layer.pretty().without_time().boxed(),
            (TracingOutputFormat::Compact, true) => layer.compact().boxed(),
            (TracingOutputFormat::Compact, false) => layer.compact().without_time().boxed(),
            (TracingOutputFormat::Json, true) => layer.json().boxed(),
            (TracingOutputFormat::Json, false) => layer.json().without_time().boxed(),
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// Call once, at startup. `RUST_LOG` overrides the default level unless
/// the config carries an explicit filter.
///
/// # Errors
///
/// Fails if a global subscriber is already set or the filter directive does
/// not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let subscriber = tracing_subscriber::registry()
        .with(config.layer())
        .with(config.filter()?);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(!config.include_location);
        assert!(config.include_timestamp);
        assert!(config.env_filter.is_none());
        assert_eq!(config.default_directive(), "betlink=INFO");
    }

    #[test]
    fn cli_debug_config() {
        let config = TracingConfig::cli_debug();
        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(config.include_location);
        assert!(!config.include_timestamp);
    }

    #[test]
    fn unattended_config() {
        let config = TracingConfig::unattended();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert!(config.include_timestamp);
    }

    #[test]
    fn for_cli_presets() {
        assert_eq!(
            TracingConfig::for_cli(true, false, "error").unwrap(),
            TracingConfig::cli_debug()
        );

        let json_debug = TracingConfig::for_cli(true, true, "error").unwrap();
        assert_eq!(json_debug.output_format, TracingOutputFormat::Json);
        assert_eq!(json_debug.default_level, Level::DEBUG);

        let json = TracingConfig::for_cli(false, true, "warn").unwrap();
        assert_eq!(json.output_format, TracingOutputFormat::Json);
        assert_eq!(json.default_level, Level::WARN);

        let plain = TracingConfig::for_cli(false, false, "trace").unwrap();
        assert_eq!(plain.output_format, TracingOutputFormat::Compact);
        assert_eq!(plain.default_level, Level::TRACE);
    }

    #[test]
    fn level_names() {
        let config = TracingConfig::default().with_level_name("debug").unwrap();
        assert_eq!(config.default_level, Level::DEBUG);

        let config = TracingConfig::default().with_level_name(" WARN ").unwrap();
        assert_eq!(config.default_level, Level::WARN);

        assert!(matches!(
            TracingConfig::default().with_level_name("loud"),
            Err(TracingError::InvalidLevel(_))
        ));
        assert!(TracingConfig::for_cli(false, false, "loud").is_err());
    }

    #[test]
    fn explicit_filter_must_parse() {
        let config = TracingConfig::default().with_env_filter("betlink=loudest");
        assert!(matches!(config.filter(), Err(TracingError::EnvFilter(_))));

        let config = TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Pretty)
            .with_env_filter("betlink_protocol=trace");
        assert_eq!(config.output_format, TracingOutputFormat::Pretty);
        assert!(config.filter().is_ok());
    }
}
