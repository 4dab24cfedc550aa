// src/engine/reload.rs

use tokio::sync::broadcast;
use tracing::debug;

/// Live-reload notification channel.
///
/// The dev server subscribes one receiver per connected browser; the watch
/// runtime calls [`LiveReload::notify`] after successful rebuilds.
#[derive(Debug, Clone)]
pub struct LiveReload {
    tx: broadcast::Sender<()>,
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal all connected viewers. Returns how many were reached.
    pub fn notify(&self) -> usize {
        // No subscribers is fine: nobody has the page open.
        let reached = self.tx.send(()).unwrap_or(0);
        debug!(reached, "live reload dispatched");
        reached
    }
}
