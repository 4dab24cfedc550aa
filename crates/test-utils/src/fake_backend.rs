use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use siteflow::dag::{BoxFuture, TaskName};
use siteflow::engine::{TaskBackend, TaskOutcome, WatchEvent};
use siteflow::errors::Result;
use tokio::sync::mpsc;

/// A fake backend that:
/// - records which task bodies were started
/// - immediately reports `TaskFinished`, failing the tasks listed in
///   `failing` and succeeding everything else.
pub struct FakeBackend {
    runtime_tx: mpsc::Sender<WatchEvent>,
    started: Arc<Mutex<Vec<TaskName>>>,
    failing: HashSet<TaskName>,
}

impl FakeBackend {
    pub fn new(runtime_tx: mpsc::Sender<WatchEvent>, started: Arc<Mutex<Vec<TaskName>>>) -> Self {
        Self {
            runtime_tx,
            started,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }
}

impl TaskBackend for FakeBackend {
    fn spawn_task(&mut self, task: TaskName) -> BoxFuture<'_, Result<()>> {
        let tx = self.runtime_tx.clone();
        let started = Arc::clone(&self.started);
        let outcome = if self.failing.contains(&task) {
            TaskOutcome::Failed
        } else {
            TaskOutcome::Success
        };

        Box::pin(async move {
            started.lock().unwrap().push(task.clone());
            tx.send(WatchEvent::TaskFinished { task, outcome })
                .await
                .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }
}
