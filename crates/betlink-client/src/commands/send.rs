//! Send command: load bets, submit them in batches, report winners.

use tracing::info;

use betlink_core::Batches;
use betlink_protocol::FramedChannel;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::loader::load_bets;
use crate::session::{connect, Session, SessionError, SessionReport, TracingObserver};
use crate::signals::{ShutdownHandle, SignalHandler};

/// Runs one send session, stopping early on SIGTERM/SIGINT.
///
/// The exchange itself is blocking and runs on the blocking thread pool.
pub async fn run_until_signal(config: ClientConfig) -> ClientResult<SessionReport> {
    let signals = SignalHandler::new();
    signals.spawn_listener();
    let shutdown = signals.shutdown_handle();

    tokio::task::spawn_blocking(move || run(&config, shutdown)).await?
}

/// Runs one send session on the current thread.
///
/// Malformed CSV lines are skipped. Any bet that is well formed ships, except
/// one whose batch frame would exceed
/// [`MAX_FRAME_SIZE`](betlink_protocol::MAX_FRAME_SIZE): that aborts the run
/// with a protocol error.
pub fn run(config: &ClientConfig, shutdown: ShutdownHandle) -> ClientResult<SessionReport> {
    config.validate().map_err(ClientError::Config)?;

    let agency = config.agency.id.as_deref().unwrap_or_default().trim();
    let data_path = config
        .data
        .path
        .as_deref()
        .ok_or_else(|| ClientError::config("data.path is not set"))?;

    let mut reader = load_bets(data_path, agency)?;

    let address = config.server.address.as_str();
    let stream = connect(
        address,
        config.server.connect_timeout(),
        config.server.io_timeout(),
    )
    .map_err(|e| ClientError::Connection(format!("failed to connect to {}: {}", address, e)))?;
    info!(action = "connect", result = "success", agency, server = %address);

    let channel = FramedChannel::new(stream, config.server.framing.into());
    let mut session = Session::new(
        channel,
        TracingObserver::new(agency),
        config.session_options(),
    )
    .with_shutdown(shutdown);

    let mut load_error = None;
    for batch in Batches::new(reader.valid_bets(&mut load_error), config.batch_limits()) {
        if let Err(e) = session.send_batch(&batch) {
            session.abort(&e);
            return Err(e.into());
        }
    }

    if let Some(e) = load_error {
        session.abort(&SessionError::Aborted(e.to_string()));
        return Err(e.into());
    }

    Ok(session.finish()?)
}
