// src/dag/mod.rs

//! Task registry and dependency resolution.
//!
//! - [`task`] defines a task, its body trait and the per-run context.
//! - [`registry`] builds the immutable, validated task registry.
//! - [`graph`] checks prerequisite references and acyclicity.
//! - [`resolver`] expands a requested task into its prerequisite chain and
//!   executes it sequentially.

pub mod graph;
pub mod registry;
pub mod resolver;
pub mod task;

pub use registry::{RegistryBuilder, TaskRegistry};
pub use resolver::{Resolver, RunContext};
pub use task::{BoxFuture, Mode, Task, TaskBody, TaskContext};

/// Canonical task name type used throughout the crate.
pub type TaskName = String;
