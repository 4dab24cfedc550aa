// src/tasks/scripts.rs

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::dag::{Mode, TaskContext};
use crate::errors::LintFailure;
use crate::exec::run_shell;
use crate::tasks::files::{blocking, copy_into, expand};
use crate::tasks::{JS_SOURCES, TMP_JS};

/// `js`: transpile scripts into the intermediate tree.
///
/// With `[commands].js` set, that command does the work; otherwise the
/// sources are copied unchanged.
pub async fn js(ctx: TaskContext) -> Result<()> {
    if let Some(cmd) = ctx.config.commands.js.as_deref() {
        let out = run_shell(&ctx.root, cmd).await?;
        if !out.success {
            bail!("`{cmd}` exited with status {}\n{}", out.code, out.combined());
        }
        return Ok(());
    }

    let root = ctx.root.clone();
    blocking(move || {
        let files = expand(&root, &[JS_SOURCES], &[])?;
        let (written, unchanged) = copy_into(&files, &[root.join(TMP_JS)])?;
        info!(written, unchanged, "scripts copied");
        Ok(())
    })
    .await
}

/// `lint`: application scripts.
pub async fn lint(ctx: TaskContext) -> Result<()> {
    let cmd = ctx.config.commands.lint.clone();
    run_linter(&ctx, "lint", cmd.as_deref()).await
}

/// `lint:test`: test specs.
pub async fn lint_test(ctx: TaskContext) -> Result<()> {
    let cmd = ctx.config.commands.lint_test.clone();
    run_linter(&ctx, "lint:test", cmd.as_deref()).await
}

/// Violations fail the task in one-shot runs and are only reported while
/// a dev server is up.
async fn run_linter(ctx: &TaskContext, task: &str, cmd: Option<&str>) -> Result<()> {
    let Some(cmd) = cmd else {
        info!(task = %task, "no lint command configured; skipping");
        return Ok(());
    };

    let out = run_shell(&ctx.root, cmd).await?;
    if out.success {
        return Ok(());
    }

    let report = out.combined();
    match ctx.mode {
        Mode::Serve => {
            warn!(task = %task, "lint violations:\n{report}");
            Ok(())
        }
        Mode::OneShot => Err(LintFailure { report }.into()),
    }
}
