//! Message framing over a blocking byte stream.
//!
//! A single `read` or `write` on a stream may move fewer bytes than asked
//! for. [`FramedChannel`] loops until a whole frame has been written or read,
//! so callers only ever see complete messages.
//!
//! ```text
//! LengthPrefixed:
//! +----------------+------------------+------+
//! | length (4 BE)  |  payload         | \n   |
//! +----------------+------------------+------+
//!                  |<----- length --------->|
//!
//! Delimited:
//! +------------------+------+
//! |  payload         | \n   |
//! +------------------+------+
//! ```

use std::io::{self, Read, Write};

use tracing::trace;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::Message;
use crate::{MAX_FRAME_SIZE, MESSAGE_DELIMITER, SIZE_BYTES};

/// Bytes requested per `read` call in delimited mode.
const READ_CHUNK: usize = 1024;

/// How messages are delimited on the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Framing {
    /// 4-byte big-endian length header, then payload and delimiter.
    #[default]
    LengthPrefixed,
    /// Payload followed by the delimiter; the payload may not contain it.
    Delimited,
}

/// Encodes `text` as one complete frame.
///
/// # Errors
///
/// Fails if the frame would exceed [`MAX_FRAME_SIZE`], or if delimited
/// framing is used and `text` contains the delimiter.
pub fn encode_frame(framing: Framing, text: &str) -> ProtocolResult<Vec<u8>> {
    let payload = text.as_bytes();
    let frame_len = payload.len() + 1;
    if frame_len > MAX_FRAME_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: frame_len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buffer = match framing {
        Framing::LengthPrefixed => {
            let mut buffer = Vec::with_capacity(SIZE_BYTES + frame_len);
            buffer.extend_from_slice(&(frame_len as u32).to_be_bytes());
            buffer
        }
        Framing::Delimited => {
            if let Some(position) = payload.iter().position(|&b| b == MESSAGE_DELIMITER) {
                return Err(ProtocolError::DelimiterInPayload { position });
            }
            Vec::with_capacity(frame_len)
        }
    };

    buffer.extend_from_slice(payload);
    buffer.push(MESSAGE_DELIMITER);
    Ok(buffer)
}

/// Decodes the first frame in `data`.
///
/// Returns the payload text and the number of bytes the frame occupied.
/// A buffer that ends before the frame does fails with
/// [`ProtocolError::ConnectionClosed`].
pub fn decode_frame(framing: Framing, data: &[u8]) -> ProtocolResult<(String, usize)> {
    match framing {
        Framing::LengthPrefixed => {
            if data.len() < SIZE_BYTES {
                return Err(ProtocolError::ConnectionClosed {
                    expected: SIZE_BYTES,
                    received: data.len(),
                });
            }

            let mut header = [0u8; SIZE_BYTES];
            header.copy_from_slice(&data[..SIZE_BYTES]);
            let len = checked_frame_len(header)?;

            let end = SIZE_BYTES + len;
            if data.len() < end {
                return Err(ProtocolError::ConnectionClosed {
                    expected: end,
                    received: data.len(),
                });
            }

            let text = payload_text(data[SIZE_BYTES..end].to_vec())?;
            Ok((text, end))
        }
        Framing::Delimited => {
            let position = data
                .iter()
                .position(|&b| b == MESSAGE_DELIMITER)
                .ok_or(ProtocolError::ConnectionClosed {
                    expected: data.len() + 1,
                    received: data.len(),
                })?;

            let text = payload_text(data[..=position].to_vec())?;
            Ok((text, position + 1))
        }
    }
}

/// A message channel over a bidirectional byte stream.
///
/// The channel exclusively owns the stream. After any error the stream
/// position is undefined and the channel must be dropped.
pub struct FramedChannel<S> {
    stream: S,
    framing: Framing,
    /// Bytes read past the end of the last delimited frame.
    pending: Vec<u8>,
}

impl<S> FramedChannel<S> {
    /// Wraps `stream`; both peers must agree on `framing`.
    pub fn new(stream: S, framing: Framing) -> Self {
        Self {
            stream,
            framing,
            pending: Vec::new(),
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Returns a mutable reference to the underlying stream.
    ///
    /// Reading from it directly desynchronizes the channel.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Unwraps the channel, discarding any buffered bytes.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Write> FramedChannel<S> {
    /// Sends `text` as one frame, looping until every byte is written.
    pub fn send(&mut self, text: &str) -> ProtocolResult<()> {
        let frame = encode_frame(self.framing, text)?;
        write_fully(&mut self.stream, &frame)?;
        self.stream.flush()?;
        trace!(bytes = frame.len(), "frame sent");
        Ok(())
    }

    /// Encodes and sends a control message.
    pub fn send_message(&mut self, message: &Message) -> ProtocolResult<()> {
        self.send(&message.encode())
    }
}

impl<S: Read> FramedChannel<S> {
    /// Receives one whole frame and returns its payload, delimiter stripped.
    ///
    /// End of stream before the frame completes is an error, never an
    /// empty message.
    pub fn receive(&mut self) -> ProtocolResult<String> {
        let text = match self.framing {
            Framing::LengthPrefixed => self.receive_length_prefixed()?,
            Framing::Delimited => self.receive_delimited()?,
        };
        trace!(bytes = text.len(), "frame received");
        Ok(text)
    }

    /// Receives one frame and decodes it as a control message.
    pub fn receive_message(&mut self) -> ProtocolResult<Message> {
        Ok(Message::decode(&self.receive()?))
    }

    fn receive_length_prefixed(&mut self) -> ProtocolResult<String> {
        let mut header = [0u8; SIZE_BYTES];
        read_fully(&mut self.stream, &mut header)?;
        let len = checked_frame_len(header)?;

        let mut frame = vec![0u8; len];
        read_fully(&mut self.stream, &mut frame)?;
        payload_text(frame)
    }

    fn receive_delimited(&mut self) -> ProtocolResult<String> {
        let mut scanned = 0;
        loop {
            if let Some(offset) = self.pending[scanned..]
                .iter()
                .position(|&b| b == MESSAGE_DELIMITER)
            {
                let frame: Vec<u8> = self.pending.drain(..=scanned + offset).collect();
                return payload_text(frame);
            }
            scanned = self.pending.len();

            if self.pending.len() >= MAX_FRAME_SIZE {
                return Err(ProtocolError::MessageTooLarge {
                    size: self.pending.len(),
                    max: MAX_FRAME_SIZE,
                });
            }

            let mut chunk = [0u8; READ_CHUNK];
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    return Err(ProtocolError::ConnectionClosed {
                        expected: self.pending.len() + 1,
                        received: self.pending.len(),
                    });
                }
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Validates a length header.
fn checked_frame_len(header: [u8; SIZE_BYTES]) -> ProtocolResult<usize> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }
    // Even an empty payload carries its delimiter.
    if len == 0 {
        return Err(ProtocolError::MissingDelimiter);
    }
    Ok(len)
}

/// Strips the trailing delimiter from a complete frame body.
fn payload_text(mut frame: Vec<u8>) -> ProtocolResult<String> {
    if frame.pop() != Some(MESSAGE_DELIMITER) {
        return Err(ProtocolError::MissingDelimiter);
    }
    Ok(String::from_utf8(frame)?)
}

fn write_fully<W: Write>(writer: &mut W, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "stream accepted no bytes",
                ));
            }
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> ProtocolResult<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(ProtocolError::ConnectionClosed {
                    expected: buf.len(),
                    received: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
