//! Message framing and the control message vocabulary for betlink.
//!
//! # Wire format
//!
//! Every message is UTF-8 text terminated by a `\n` delimiter. Two framings
//! are supported, and both ends of a connection must use the same one:
//!
//! - [`Framing::LengthPrefixed`] (default): a 4-byte big-endian length
//!   covering payload plus delimiter, then the payload, then `\n`.
//! - [`Framing::Delimited`]: the payload followed by `\n`, nothing else.
//!
//! Payloads are either a batch of bets (`<bet>;<bet>;...`) or one of the
//! control tokens modelled by [`Message`].
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use betlink_protocol::{encode_frame, FramedChannel, Framing, Message};
//!
//! let bytes = encode_frame(Framing::LengthPrefixed, "SUCCESS").unwrap();
//! let mut channel = FramedChannel::new(Cursor::new(bytes), Framing::LengthPrefixed);
//! assert_eq!(channel.receive_message().unwrap(), Message::Success);
//! ```

mod error;
mod framing;
mod message;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{decode_frame, encode_frame, FramedChannel, Framing};
pub use message::Message;

/// Byte that terminates every message payload.
pub const MESSAGE_DELIMITER: u8 = b'\n';

/// Width of the length header in [`Framing::LengthPrefixed`].
pub const SIZE_BYTES: usize = 4;

/// Largest frame accepted on send or receive (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;
