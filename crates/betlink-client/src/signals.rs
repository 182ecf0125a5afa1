//! Signal handling for graceful shutdown.
//!
//! SIGTERM and SIGINT (Ctrl+C elsewhere) flip a shared flag. The blocking
//! session polls that flag between messages, tells the server it is leaving,
//! and stops; a message already on the wire always completes first.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Signal handler that turns process signals into a shutdown flag.
pub struct SignalHandler {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    /// Creates a new signal handler.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Spawns the signal listener task.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn spawn_listener(&self) {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!(error = %e, "failed to install signal handlers");
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => info!(action = "signal", signal = "SIGTERM", "initiating shutdown"),
                _ = sigint.recv() => info!(action = "signal", signal = "SIGINT", "initiating shutdown"),
            }
            let _ = shutdown_tx.send(true);

            debug!("signal listener stopped");
        });
    }

    /// Non-Unix implementation: only Ctrl+C.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!(action = "signal", signal = "ctrl-c", "initiating shutdown");
                let _ = shutdown_tx.send(true);
            }
        });
    }

    /// Returns true if shutdown has been signaled.
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Creates a shutdown handle that can be passed to other components.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
            rx: self.shutdown_rx.clone(),
        }
    }
}

/// A handle for triggering or checking shutdown status.
///
/// Checking is a non-blocking read, so the handle can be polled from
/// blocking code running outside the runtime.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutdownHandle {
    /// Creates a handle not connected to any signal listener.
    pub fn detached() -> Self {
        SignalHandler::new().shutdown_handle()
    }

    /// Triggers a shutdown.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Returns true if shutdown has been triggered.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn handle_triggers_shutdown() {
        let handler = SignalHandler::new();
        let handle = handler.shutdown_handle();
        assert!(!handler.is_shutdown());
        assert!(!handle.is_shutdown());

        handle.trigger();
        assert!(handler.is_shutdown());
        assert!(handle.is_shutdown());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let handle = ShutdownHandle::detached();
        let clone = handle.clone();
        clone.trigger();
        assert!(handle.is_shutdown());
    }

    #[tokio::test]
    async fn listener_leaves_flag_clear_until_signaled() {
        let handler = SignalHandler::new();
        handler.spawn_listener();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handler.is_shutdown());
    }

    #[test]
    fn blocking_thread_sees_trigger() {
        let handle = ShutdownHandle::detached();
        let observer = handle.clone();
        handle.trigger();
        let seen = std::thread::spawn(move || observer.is_shutdown()).join().unwrap();
        assert!(seen);
    }
}
