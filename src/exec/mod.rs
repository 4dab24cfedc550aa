// src/exec/mod.rs

//! External process execution.
//!
//! Processors that live outside this crate (script transpiler, linters) are
//! invoked as shell commands through [`command::run_shell`].

pub mod command;

pub use command::{run_shell, CommandOutput};
