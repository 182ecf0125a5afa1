//! The batch submission exchange with the server.
//!
//! A session is strictly request/reply over one connection:
//!
//! ```text
//! client                          server
//!   | -- <bet>;<bet>;... -------->  |
//!   | <------- SUCCESS | FAIL ----  |   (once per batch)
//!   | -- BETS_SENT -------------->  |
//!   | -- GET_WINNERS ------------>  |   (optional)
//!   | <------- WINNERS:<dni>,... -  |
//! ```
//!
//! The next batch is never sent before the previous reply has been read and
//! decoded. Any failure aborts the run: the session makes one attempt to
//! send `CLIENT_SHUTDOWN` and drops the connection. Batches already
//! acknowledged stay stored on the server.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use betlink_core::{Batch, Winners};
use betlink_protocol::{FramedChannel, Message, ProtocolError};

use crate::signals::ShutdownHandle;

/// Why a session stopped before completing.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Framing or transport failure; the connection is unusable.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server announced it is shutting down.
    #[error("server is shutting down")]
    ServerShutdown,

    /// The server replied with something the exchange does not allow here.
    #[error("unexpected reply from server: {0:?}")]
    UnexpectedReply(String),

    /// A local shutdown was requested.
    #[error("shutdown requested")]
    Interrupted,

    /// The caller gave up for a reason outside the exchange.
    #[error("aborted: {0}")]
    Aborted(String),
}

/// Tunables for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Ask for winners after the last batch.
    pub request_winners: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            request_winners: true,
        }
    }
}

/// Outcome of a completed session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Batches the server answered, accepted or not.
    pub batches_sent: usize,
    /// Batches the server answered with `FAIL`.
    pub batches_rejected: usize,
    /// Bets in batches answered with `SUCCESS`.
    pub bets_acknowledged: usize,
    /// Winners, when requested.
    pub winners: Option<Winners>,
}

/// Receives progress notifications from a [`Session`].
///
/// All methods default to doing nothing.
pub trait SessionObserver {
    fn batch_acknowledged(&mut self, _index: usize, _bets: usize) {}

    fn batch_rejected(&mut self, _index: usize, _bets: usize) {}

    fn winners_received(&mut self, _winners: &Winners) {}

    fn failed(&mut self, _error: &SessionError) {}

    /// The connection has been released, after success or failure.
    fn closed(&mut self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Observer that reports progress as `tracing` events.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    agency: String,
}

impl TracingObserver {
    pub fn new(agency: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
        }
    }
}

impl SessionObserver for TracingObserver {
    fn batch_acknowledged(&mut self, index: usize, bets: usize) {
        info!(action = "batch_sent", result = "success", agency = %self.agency, batch = index, bets);
    }

    fn batch_rejected(&mut self, index: usize, bets: usize) {
        warn!(action = "batch_sent", result = "fail", agency = %self.agency, batch = index, bets);
    }

    fn winners_received(&mut self, winners: &Winners) {
        info!(
            action = "winners_query",
            result = "success",
            agency = %self.agency,
            winners = winners.len()
        );
    }

    fn failed(&mut self, error: &SessionError) {
        error!(action = "session", result = "fail", agency = %self.agency, error = %error);
    }

    fn closed(&mut self) {
        info!(action = "close_connection", result = "success", agency = %self.agency);
    }
}

/// One connection's worth of batch submission.
pub struct Session<S, O> {
    channel: FramedChannel<S>,
    observer: O,
    options: SessionOptions,
    shutdown: Option<ShutdownHandle>,
    report: SessionReport,
    /// A write failed midway, so the stream may end in a partial frame.
    partial_write: bool,
}

impl<S: Read + Write, O: SessionObserver> Session<S, O> {
    pub fn new(channel: FramedChannel<S>, observer: O, options: SessionOptions) -> Self {
        Self {
            channel,
            observer,
            options,
            shutdown: None,
            report: SessionReport::default(),
            partial_write: false,
        }
    }

    /// Polls `handle` before every message and stops once it fires.
    pub fn with_shutdown(mut self, handle: ShutdownHandle) -> Self {
        self.shutdown = Some(handle);
        self
    }

    /// Progress so far.
    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Sends every batch, then finishes the exchange.
    pub fn run(
        mut self,
        batches: impl IntoIterator<Item = Batch>,
    ) -> Result<SessionReport, SessionError> {
        for batch in batches {
            if let Err(e) = self.send_batch(&batch) {
                self.abort(&e);
                return Err(e);
            }
        }
        self.finish()
    }

    /// Sends one batch and waits for the server's verdict.
    ///
    /// A `FAIL` reply is not an error: the batch is counted as rejected and
    /// the exchange may continue. After an `Err`, the session must be
    /// [aborted](Session::abort).
    ///
    /// A batch whose frame would exceed
    /// [`MAX_FRAME_SIZE`](betlink_protocol::MAX_FRAME_SIZE) fails with
    /// [`ProtocolError::MessageTooLarge`] before anything is written. This
    /// is the only way a single bet, batched alone, can fail to ship.
    pub fn send_batch(&mut self, batch: &Batch) -> Result<(), SessionError> {
        self.check_shutdown()?;

        let index = self.report.batches_sent;
        debug!(batch = index, bets = batch.len(), bytes = batch.byte_len(), "sending batch");
        self.send_frame(&batch.serialize())?;

        let reply = self.channel.receive()?;
        match Message::decode(&reply) {
            Message::Success => {
                self.report.batches_sent += 1;
                self.report.bets_acknowledged += batch.len();
                self.observer.batch_acknowledged(index, batch.len());
                Ok(())
            }
            Message::Fail => {
                self.report.batches_sent += 1;
                self.report.batches_rejected += 1;
                self.observer.batch_rejected(index, batch.len());
                Ok(())
            }
            Message::ServerShutdown => Err(SessionError::ServerShutdown),
            _ => Err(SessionError::UnexpectedReply(reply)),
        }
    }

    /// Announces the end of the bets, fetches winners if configured, and
    /// releases the connection.
    pub fn finish(mut self) -> Result<SessionReport, SessionError> {
        match self.complete() {
            Ok(()) => {
                self.observer.closed();
                Ok(self.report)
            }
            Err(e) => {
                self.abort(&e);
                Err(e)
            }
        }
    }

    /// Best-effort `CLIENT_SHUTDOWN`, then releases the connection.
    ///
    /// The notice is skipped when an earlier write failed midway: the peer
    /// would read it as the tail of the unfinished frame.
    pub fn abort(mut self, reason: &SessionError) {
        self.observer.failed(reason);
        if self.partial_write {
            debug!(action = "send_shutdown_message", result = "skip", "stream ends in a partial frame");
        } else if let Err(e) = self.channel.send_message(&Message::ClientShutdown) {
            warn!(action = "send_shutdown_message", result = "fail", error = %e);
        } else {
            debug!(action = "send_shutdown_message", result = "success");
        }
        self.observer.closed();
    }

    fn complete(&mut self) -> Result<(), SessionError> {
        self.check_shutdown()?;
        self.send_frame(&Message::BetsSent.encode())?;

        if !self.options.request_winners {
            return Ok(());
        }

        self.check_shutdown()?;
        self.send_frame(&Message::GetWinners.encode())?;
        let reply = self.channel.receive()?;
        match Message::decode(&reply) {
            Message::Winners(winners) => {
                self.observer.winners_received(&winners);
                self.report.winners = Some(winners);
                Ok(())
            }
            Message::ServerShutdown => Err(SessionError::ServerShutdown),
            _ => Err(SessionError::UnexpectedReply(reply)),
        }
    }

    fn send_frame(&mut self, text: &str) -> Result<(), SessionError> {
        match self.channel.send(text) {
            Ok(()) => Ok(()),
            Err(e) => {
                // Size and encoding checks fail before any byte is written.
                if matches!(e, ProtocolError::Io(_)) {
                    self.partial_write = true;
                }
                Err(e.into())
            }
        }
    }

    fn check_shutdown(&self) -> Result<(), SessionError> {
        match self.shutdown {
            Some(ref handle) if handle.is_shutdown() => Err(SessionError::Interrupted),
            _ => Ok(()),
        }
    }
}

/// Opens a TCP connection to `address`, trying each resolved address in
/// turn.
///
/// `io_timeout` bounds every individual read and write; `None` blocks.
pub fn connect(
    address: &str,
    connect_timeout: Duration,
    io_timeout: Option<Duration>,
) -> io::Result<TcpStream> {
    let mut last_error = None;

    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, connect_timeout) {
            Ok(stream) => {
                stream.set_read_timeout(io_timeout)?;
                stream.set_write_timeout(io_timeout)?;
                stream.set_nodelay(true)?;
                debug!(action = "connect", result = "success", peer = %addr);
                return Ok(stream);
            }
            Err(e) => {
                debug!(action = "connect", result = "fail", peer = %addr, error = %e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{address} did not resolve to any address"),
        )
    }))
}
