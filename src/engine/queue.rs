// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::dag::TaskName;

/// Re-run requests recorded while their task was busy.
///
/// Any number of changes for one task collapse into a single entry, so a
/// busy task is re-run at most once after it settles, and never overlaps
/// with itself.
#[derive(Debug, Default)]
pub struct PendingTriggers {
    tasks: VecDeque<TaskName>,
}

impl PendingTriggers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn contains(&self, task: &str) -> bool {
        self.tasks.iter().any(|t| t == task)
    }

    /// Remember that `task` should run again. Returns false if it already
    /// was pending.
    pub fn record(&mut self, task: &str) -> bool {
        if self.contains(task) {
            debug!(task = %task, "coalesced trigger into pending rerun");
            return false;
        }
        debug!(task = %task, "queued rerun while task is busy");
        self.tasks.push_back(task.to_string());
        true
    }

    /// Remove `task` from the pending set, returning whether it was there.
    pub fn take(&mut self, task: &str) -> bool {
        match self.tasks.iter().position(|t| t == task) {
            Some(pos) => {
                self.tasks.remove(pos);
                true
            }
            None => false,
        }
    }
}
