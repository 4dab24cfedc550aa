// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteflowError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Cyclic task dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Task '{task}' failed: {source:#}")]
    Processing {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Task '{task}' reported lint violations:\n{report}")]
    LintViolation { task: String, report: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SiteflowError {
    /// Name of the task this error originated from, if any.
    pub fn task(&self) -> Option<&str> {
        match self {
            SiteflowError::Processing { task, .. } | SiteflowError::LintViolation { task, .. } => {
                Some(task)
            }
            SiteflowError::UnknownTask(task) | SiteflowError::DuplicateTask(task) => Some(task),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SiteflowError>;

/// Error a task body returns when a linter reports violations.
///
/// The resolver turns it into [`SiteflowError::LintViolation`] so callers
/// can tell rule failures apart from processing errors.
#[derive(Error, Debug)]
#[error("{report}")]
pub struct LintFailure {
    pub report: String,
}
