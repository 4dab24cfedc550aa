// src/engine/mod.rs

//! Watch-mode engine.
//!
//! This module ties together:
//! - the pure per-task state machine ([`core`]) deciding what to re-run and
//!   when to signal a reload
//! - the coalescing of changes that arrive while a task is busy ([`queue`])
//! - the async shell ([`runtime`]) that reads events, spawns task bodies
//!   through a [`TaskBackend`] and dispatches reloads
//!
//! The core holds no channels and does no IO, so it is unit tested on its own.

use crate::dag::TaskName;

/// What a watch binding does when one of its paths changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingAction {
    /// Tasks to re-run (bodies only, never their prerequisites).
    pub tasks: Vec<TaskName>,
    /// Send a reload straight away, without waiting for any task.
    pub reload: bool,
}

impl BindingAction {
    pub fn reload() -> Self {
        Self {
            tasks: Vec::new(),
            reload: true,
        }
    }

    pub fn tasks<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self {
            tasks: tasks.into_iter().map(Into::into).collect(),
            reload: false,
        }
    }

    pub fn and_reload(mut self) -> Self {
        self.reload = true;
        self
    }
}

/// Result of one body execution, as seen by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Per-task phase inside a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for changes.
    Idle,
    /// Body dispatched, completion not yet reported.
    Triggered,
    /// Body succeeded, reload signal being dispatched.
    Notifying,
}

/// Events flowing into the watch runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A debounced batch touched paths of this binding.
    Changed { binding: usize },
    /// A task body finished.
    TaskFinished { task: TaskName, outcome: TaskOutcome },
    /// The reload signal requested for `task` went out.
    ReloadDispatched { task: Option<TaskName> },
    /// Stop the session (Ctrl-C).
    Shutdown,
}

pub mod backend;
pub mod core;
pub mod queue;
pub mod reload;
pub mod runtime;

pub use backend::{RegistryBackend, TaskBackend};
pub use self::core::{CoreStep, WatchCommand, WatchCore};
pub use queue::PendingTriggers;
pub use reload::LiveReload;
pub use runtime::{WatchOptions, WatchRuntime};
