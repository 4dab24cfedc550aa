// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::backend::TaskBackend;
use crate::engine::core::{WatchCommand, WatchCore};
use crate::engine::reload::LiveReload;
use crate::engine::WatchEvent;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    /// Stop once the core is idle and no events are queued. Only useful for
    /// driving the loop from tests.
    pub exit_when_idle: bool,
}

/// Async shell around [`WatchCore`].
///
/// Reads [`WatchEvent`]s, feeds them to the core and carries out the
/// resulting commands: task bodies go to the backend, reloads go to the
/// [`LiveReload`] channel.
pub struct WatchRuntime<B: TaskBackend> {
    core: WatchCore,
    event_rx: mpsc::Receiver<WatchEvent>,
    backend: B,
    reload: LiveReload,
    options: WatchOptions,
}

impl<B: TaskBackend> fmt::Debug for WatchRuntime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRuntime")
            .field("core", &self.core)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<B: TaskBackend> WatchRuntime<B> {
    pub fn new(
        core: WatchCore,
        event_rx: mpsc::Receiver<WatchEvent>,
        backend: B,
        reload: LiveReload,
        options: WatchOptions,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            reload,
            options,
        }
    }

    /// Main event loop. Returns when a shutdown is requested or the event
    /// channel closes.
    pub async fn run(mut self) -> Result<()> {
        info!("watch loop started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "watch loop received event");

            if !self.dispatch(event).await? {
                break;
            }

            if self.options.exit_when_idle && self.core.is_idle() && self.event_rx.is_empty() {
                debug!("idle with no queued events; exiting");
                break;
            }
        }

        info!("watch loop stopped");
        Ok(())
    }

    /// Feed one event through the core, including the follow-up
    /// `ReloadDispatched` events produced by reload commands.
    async fn dispatch(&mut self, event: WatchEvent) -> Result<bool> {
        let mut events = VecDeque::from([event]);

        while let Some(event) = events.pop_front() {
            let step = self.core.step(event);

            for command in step.commands {
                match command {
                    WatchCommand::RunTask(task) => {
                        self.backend.spawn_task(task).await?;
                    }
                    WatchCommand::NotifyReload { task } => {
                        self.reload.notify();
                        events.push_back(WatchEvent::ReloadDispatched { task });
                    }
                }
            }

            if !step.keep_running {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
