// src/dag/task.rs

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::dag::registry::TaskRegistry;
use crate::dag::TaskName;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How the current invocation is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A single top-level invocation from the CLI; failures are fatal.
    OneShot,
    /// Re-runs driven by the watch loop while a dev server is up.
    /// Lint violations are reported but do not fail the task.
    Serve,
}

/// Everything a task body gets to see while it runs.
#[derive(Clone)]
pub struct TaskContext {
    pub root: PathBuf,
    pub config: Arc<ConfigFile>,
    pub mode: Mode,
    pub registry: Arc<TaskRegistry>,
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("root", &self.root)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl TaskContext {
    /// Resolve a project-relative path.
    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }
}

/// The executable part of a task.
///
/// Bodies report completion through the returned future: `Ok(())` on
/// success, an error (optionally a [`LintFailure`](crate::errors::LintFailure))
/// otherwise.
pub trait TaskBody: Send + Sync {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'static, anyhow::Result<()>>;
}

impl<F, Fut> TaskBody for F
where
    F: Fn(TaskContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn run(&self, ctx: TaskContext) -> BoxFuture<'static, anyhow::Result<()>> {
        Box::pin(self(ctx))
    }
}

/// A registered task: name, ordered prerequisites and body.
#[derive(Clone)]
pub struct Task {
    name: TaskName,
    prerequisites: Vec<TaskName>,
    body: Arc<dyn TaskBody>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("prerequisites", &self.prerequisites)
            .finish_non_exhaustive()
    }
}

impl Task {
    pub(crate) fn new(name: TaskName, prerequisites: Vec<TaskName>, body: Arc<dyn TaskBody>) -> Self {
        Self {
            name,
            prerequisites,
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prerequisites in declaration order.
    pub fn prerequisites(&self) -> &[TaskName] {
        &self.prerequisites
    }

    pub fn run(&self, ctx: TaskContext) -> BoxFuture<'static, anyhow::Result<()>> {
        self.body.run(ctx)
    }
}
