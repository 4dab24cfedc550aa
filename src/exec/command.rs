// src/exec/command.rs

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

/// Captured result of a finished shell command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout and stderr joined, trimmed, for error reports.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let err = self.stderr.trim_end();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }
}

/// Run `cmd` through the platform shell with `cwd` as working directory.
///
/// A non-zero exit is not an error here; callers decide what it means.
/// Failing to spawn or wait on the process is.
pub async fn run_shell(cwd: &Path, cmd: &str) -> Result<CommandOutput> {
    info!(cmd = %cmd, "running external command");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    let output = command
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("spawning `{cmd}`"))?;

    let code = output.status.code().unwrap_or(-1);
    debug!(cmd = %cmd, exit_code = code, "external command exited");

    Ok(CommandOutput {
        success: output.status.success(),
        code,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_exit_code_and_streams() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_shell(dir.path(), "echo out; echo err >&2; exit 3")
            .await
            .unwrap();

        assert!(!out.success);
        assert_eq!(out.code, 3);
        assert_eq!(out.combined(), "out\nerr");
    }

    #[tokio::test]
    async fn runs_in_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let out = run_shell(dir.path(), "ls").await.unwrap();
        assert!(out.success);
        assert!(out.stdout.contains("marker.txt"));
    }
}
