// src/engine/core.rs

//! Pure watch-session state machine.
//!
//! Consumes [`WatchEvent`]s and produces [`WatchCommand`]s for the IO shell.
//! Per task the phases are:
//!
//! ```text
//! Idle --change--> Triggered --success--> Notifying --reload sent--> Idle
//!                      \--failure--> Idle
//! ```
//!
//! A change for a task that is not `Idle` is parked in [`PendingTriggers`]
//! and replayed once the task is back to `Idle`.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::TaskName;
use crate::engine::queue::PendingTriggers;
use crate::engine::{BindingAction, Phase, TaskOutcome, WatchEvent};

/// What the IO shell should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    /// Spawn the body of this task.
    RunTask(TaskName),
    /// Tell connected viewers to refresh. `task` is the rebuild that caused
    /// it, `None` for reload-only bindings.
    NotifyReload { task: Option<TaskName> },
}

/// Result of feeding one event into the core.
#[derive(Debug, Default)]
pub struct CoreStep {
    pub commands: Vec<WatchCommand>,
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct WatchCore {
    bindings: Vec<BindingAction>,
    phases: HashMap<TaskName, Phase>,
    pending: PendingTriggers,
}

impl WatchCore {
    pub fn new(bindings: Vec<BindingAction>) -> Self {
        Self {
            bindings,
            phases: HashMap::new(),
            pending: PendingTriggers::new(),
        }
    }

    pub fn phase(&self, task: &str) -> Phase {
        self.phases.get(task).copied().unwrap_or(Phase::Idle)
    }

    /// True when no task is busy and nothing is waiting to rerun.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.phases.values().all(|p| *p == Phase::Idle)
    }

    pub fn step(&mut self, event: WatchEvent) -> CoreStep {
        let mut step = CoreStep {
            commands: Vec::new(),
            keep_running: true,
        };

        match event {
            WatchEvent::Changed { binding } => self.on_changed(binding, &mut step),
            WatchEvent::TaskFinished { task, outcome } => {
                self.on_finished(task, outcome, &mut step)
            }
            WatchEvent::ReloadDispatched { task } => {
                if let Some(task) = task {
                    self.on_reloaded(task, &mut step);
                }
            }
            WatchEvent::Shutdown => {
                info!("watch session shutting down");
                step.keep_running = false;
            }
        }

        step
    }

    fn on_changed(&mut self, binding: usize, step: &mut CoreStep) {
        let Some(action) = self.bindings.get(binding).cloned() else {
            warn!(binding, "change reported for unknown binding");
            return;
        };

        if action.reload {
            step.commands.push(WatchCommand::NotifyReload { task: None });
        }
        for task in &action.tasks {
            self.trigger(task, step);
        }
    }

    fn trigger(&mut self, task: &str, step: &mut CoreStep) {
        match self.phase(task) {
            Phase::Idle => {
                debug!(task = %task, "Idle -> Triggered");
                self.phases.insert(task.to_string(), Phase::Triggered);
                step.commands.push(WatchCommand::RunTask(task.to_string()));
            }
            Phase::Triggered | Phase::Notifying => {
                self.pending.record(task);
            }
        }
    }

    fn on_finished(&mut self, task: TaskName, outcome: TaskOutcome, step: &mut CoreStep) {
        if self.phase(&task) != Phase::Triggered {
            warn!(task = %task, phase = ?self.phase(&task), "completion for task that was not running");
            return;
        }

        match outcome {
            TaskOutcome::Success => {
                debug!(task = %task, "Triggered -> Notifying");
                self.phases.insert(task.clone(), Phase::Notifying);
                step.commands.push(WatchCommand::NotifyReload { task: Some(task) });
            }
            TaskOutcome::Failed => {
                warn!(task = %task, "rebuild failed; still watching");
                self.settle(task, step);
            }
        }
    }

    fn on_reloaded(&mut self, task: TaskName, step: &mut CoreStep) {
        if self.phase(&task) == Phase::Notifying {
            debug!(task = %task, "Notifying -> Idle");
            self.settle(task, step);
        }
    }

    fn settle(&mut self, task: TaskName, step: &mut CoreStep) {
        self.phases.insert(task.clone(), Phase::Idle);
        if self.pending.take(&task) {
            self.trigger(&task, step);
        }
    }
}
