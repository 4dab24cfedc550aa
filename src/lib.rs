// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod server;
pub mod tasks;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::dag::{Resolver, TaskRegistry};
use crate::errors::Result;
use crate::tasks::frontend_registry;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project root and config loading
/// - the built-in task registry
/// - the resolver, which runs the requested task and its prerequisites
pub async fn run(args: CliArgs) -> Result<()> {
    let root = project_root(args.root.as_deref())?;
    let config_path = root.join(&args.config);
    let cfg = Arc::new(load_and_validate(&config_path)?);
    debug!(root = %root.display(), config = %config_path.display(), "configuration loaded");

    let registry = Arc::new(frontend_registry()?);
    let resolver = Resolver::new(Arc::clone(&registry), root, cfg);

    if args.list {
        print_tasks(&registry, &resolver, &args.task)?;
        return Ok(());
    }

    let ctx = resolver.run(&args.task).await?;
    info!(task = %args.task, ran = ctx.completed().len(), "done");
    Ok(())
}

fn project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let root = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(errors::SiteflowError::Config(format!(
            "project root {} is not a directory",
            root.display()
        )));
    }
    Ok(root)
}

/// `--list` output: every task with its prerequisites, then the plan for
/// the requested task.
fn print_tasks(registry: &TaskRegistry, resolver: &Resolver, task: &str) -> Result<()> {
    println!("siteflow tasks ({}):", registry.len());
    for t in registry.tasks() {
        if t.prerequisites().is_empty() {
            println!("  - {}", t.name());
        } else {
            println!("  - {} <- {}", t.name(), t.prerequisites().join(", "));
        }
    }
    println!();

    let plan = resolver.plan(task)?;
    println!("plan for `{task}`: {}", plan.join(" -> "));

    debug!("listing complete (no execution)");
    Ok(())
}
