//! Client error types.

use std::io;

use thiserror::Error;

use crate::loader::LoadError;
use crate::session::SessionError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Connection to server failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The bets file could not be opened or read.
    #[error("bet loading failed: {0}")]
    Load(#[from] LoadError),

    /// The exchange with the server failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The blocking send task panicked or was cancelled.
    #[error("send task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Tracing(#[from] betlink_core::TracingError),
}

impl ClientError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
