//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while framing or unframing messages.
///
/// Every variant leaves the channel in an unknown position within the
/// stream; the connection must be closed.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before a whole frame arrived.
    #[error("connection closed mid-frame: expected {expected} bytes, got {received}")]
    ConnectionClosed { expected: usize, received: usize },

    /// A complete frame did not end with the message delimiter.
    #[error("missing delimiter")]
    MissingDelimiter,

    /// A payload to send contains the delimiter byte.
    #[error("payload contains the message delimiter at byte {position}")]
    DelimiterInPayload { position: usize },

    /// Frame exceeds the maximum allowed size.
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}
