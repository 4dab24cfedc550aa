// src/dag/registry.rs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::dag::graph::validate_graph;
use crate::dag::task::{Task, TaskBody};
use crate::dag::TaskName;
use crate::errors::{Result, SiteflowError};

/// Collects task definitions before they are frozen into a [`TaskRegistry`].
///
/// Prerequisites may name tasks registered later; references and
/// acyclicity are checked once, in [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tasks: Vec<Task>,
    index: HashMap<TaskName, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task definition.
    ///
    /// Fails with [`SiteflowError::DuplicateTask`] if `name` is taken; the
    /// builder is left untouched in that case.
    pub fn register<B>(&mut self, name: &str, prerequisites: &[&str], body: B) -> Result<&mut Self>
    where
        B: TaskBody + 'static,
    {
        if self.index.contains_key(name) {
            return Err(SiteflowError::DuplicateTask(name.to_string()));
        }

        let prerequisites: Vec<TaskName> = prerequisites.iter().map(|s| s.to_string()).collect();
        debug!(task = %name, ?prerequisites, "registering task");

        self.index.insert(name.to_string(), self.tasks.len());
        self.tasks
            .push(Task::new(name.to_string(), prerequisites, Arc::new(body)));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validate the collected tasks and freeze them.
    pub fn build(self) -> Result<TaskRegistry> {
        validate_graph(&self.tasks)?;
        Ok(TaskRegistry {
            tasks: self.tasks,
            index: self.index,
        })
    }
}

/// Immutable mapping from task name to [`Task`].
///
/// Iteration follows registration order, which is what `--list` prints.
#[derive(Debug)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    index: HashMap<TaskName, usize>,
}

impl TaskRegistry {
    pub fn lookup(&self, name: &str) -> Result<&Task> {
        self.index
            .get(name)
            .map(|&i| &self.tasks[i])
            .ok_or_else(|| SiteflowError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(Task::name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn unchecked(builder: RegistryBuilder) -> Self {
        Self {
            tasks: builder.tasks,
            index: builder.index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_: crate::dag::TaskContext) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn duplicate_registration_leaves_builder_unchanged() {
        let mut builder = RegistryBuilder::new();
        builder.register("css", &[], noop).unwrap();

        let err = builder.register("css", &["js"], noop).unwrap_err();
        assert!(matches!(err, SiteflowError::DuplicateTask(ref n) if n == "css"));
        assert_eq!(builder.len(), 1);

        let registry = builder.build().unwrap();
        assert!(registry.lookup("css").unwrap().prerequisites().is_empty());
    }

    #[test]
    fn lookup_of_unknown_name_fails() {
        let registry = RegistryBuilder::new().build().unwrap();
        assert!(matches!(
            registry.lookup("bogus"),
            Err(SiteflowError::UnknownTask(ref n)) if n == "bogus"
        ));
    }

    #[test]
    fn names_follow_registration_order() {
        let mut builder = RegistryBuilder::new();
        builder
            .register("zeta", &[], noop)
            .unwrap()
            .register("alpha", &["zeta"], noop)
            .unwrap()
            .register("mid", &[], noop)
            .unwrap();
        let registry = builder.build().unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }
}
