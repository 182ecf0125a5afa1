//! CLI, configuration, bet loading and the batch submission session
//!
//! This crate provides the `betlink` command-line client: it reads an
//! agency's bets from CSV, ships them to the server in batches over a
//! framed TCP connection, and finally asks for the agency's winners.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod loader;
pub mod session;
pub mod signals;

pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use loader::{load_bets, BetReader, LoadError};
pub use session::{
    connect, NoopObserver, Session, SessionError, SessionObserver, SessionOptions, SessionReport,
    TracingObserver,
};
pub use signals::{ShutdownHandle, SignalHandler};
