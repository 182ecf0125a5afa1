//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{ClientConfig, FramingSetting};

/// betlink - submit an agency's bets in batches and fetch its winners
#[derive(Debug, Parser)]
#[command(name = "betlink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "BETLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    // --- Overrides for config.toml ---
    /// Agency identifier
    #[arg(long, env = "BETLINK_AGENCY")]
    pub agency: Option<String>,

    /// Server address (host:port)
    #[arg(long, env = "BETLINK_SERVER")]
    pub server: Option<String>,

    /// CSV file with the agency's bets
    #[arg(long, env = "BETLINK_DATA")]
    pub data: Option<PathBuf>,

    /// Maximum bets per batch
    #[arg(long, env = "BETLINK_BATCH_MAX_AMOUNT")]
    pub batch_max_amount: Option<usize>,

    /// Message framing (must match the server)
    #[arg(long, value_enum)]
    pub framing: Option<FramingSetting>,

    /// Connection timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not ask for winners after sending
    #[arg(long)]
    pub no_winners: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Applies command-line overrides on top of file configuration.
    pub fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(ref agency) = self.agency {
            config.agency.id = Some(agency.clone());
        }
        if let Some(ref server) = self.server {
            config.server.address = server.clone();
        }
        if let Some(ref data) = self.data {
            config.data.path = Some(data.clone());
        }
        if let Some(max_amount) = self.batch_max_amount {
            config.batch.max_amount = max_amount;
        }
        if let Some(framing) = self.framing {
            config.server.framing = framing;
        }
        if let Some(timeout) = self.timeout {
            config.server.connect_timeout = timeout;
        }
        if self.no_winners {
            config.session.request_winners = false;
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send the bets file to the server (default)
    Send,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump the effective configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
