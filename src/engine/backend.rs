// src/engine/backend.rs

//! Pluggable task backend for the watch runtime.
//!
//! The runtime talks to a [`TaskBackend`] instead of the resolver directly,
//! so tests can substitute a backend that records requests and reports
//! completions without touching the filesystem.

use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::dag::{BoxFuture, Resolver, TaskName};
use crate::engine::{TaskOutcome, WatchEvent};
use crate::errors::Result;

pub trait TaskBackend: Send {
    /// Start the body of `task`. Completion must be reported later as
    /// [`WatchEvent::TaskFinished`] on the runtime channel.
    fn spawn_task(&mut self, task: TaskName) -> BoxFuture<'_, Result<()>>;
}

/// Production backend: runs bodies through the [`Resolver`] on the
/// current Tokio runtime, one spawned future per dispatch.
pub struct RegistryBackend {
    resolver: Resolver,
    events: mpsc::Sender<WatchEvent>,
}

impl RegistryBackend {
    pub fn new(resolver: Resolver, events: mpsc::Sender<WatchEvent>) -> Self {
        Self { resolver, events }
    }
}

impl TaskBackend for RegistryBackend {
    fn spawn_task(&mut self, task: TaskName) -> BoxFuture<'_, Result<()>> {
        let resolver = self.resolver.clone();
        let events = self.events.clone();

        Box::pin(async move {
            tokio::spawn(async move {
                let outcome = match resolver.run_single(&task).await {
                    Ok(()) => TaskOutcome::Success,
                    Err(err) => {
                        error!(task = %task, "{err}");
                        TaskOutcome::Failed
                    }
                };
                if events
                    .send(WatchEvent::TaskFinished { task, outcome })
                    .await
                    .is_err()
                {
                    warn!("watch runtime gone; dropping task completion");
                }
            });
            Ok(())
        })
    }
}
