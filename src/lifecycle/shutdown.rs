//! Shutdown coordination for the relay.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown_signal;

/// Fans a single stop request out to every serving task.
///
/// Clones share one channel, so any holder can stop all servers.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for `HttpServer::run` or `run_tls`. Subscribe before
    /// triggering; a receiver created afterwards never fires.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop. Returns false if nobody was listening.
    pub fn trigger(&self) -> bool {
        self.tx.send(()).is_ok()
    }

    /// Trigger once SIGINT or SIGTERM arrives.
    pub fn trigger_on_signal(&self) -> JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            if !shutdown.trigger() {
                tracing::debug!("Stop signal arrived with no server running");
            }
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
