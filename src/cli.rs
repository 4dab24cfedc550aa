// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `siteflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "siteflow",
    version,
    about = "Build, watch and serve a static front-end project.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run, together with its prerequisites.
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Path to the config file (TOML), relative to the project root unless
    /// absolute. A missing file means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Project root. Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the registered tasks and the execution plan for TASK, then
    /// exit without running anything.
    #[arg(long)]
    pub list: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_defaults_to_default() {
        let args = CliArgs::try_parse_from(["siteflow"]).unwrap();
        assert_eq!(args.task, "default");
        assert_eq!(args.config, PathBuf::from("Siteflow.toml"));
        assert!(!args.list);
    }

    #[test]
    fn explicit_task_and_flags() {
        let args = CliArgs::try_parse_from([
            "siteflow",
            "serve:dist",
            "--root",
            "site",
            "--log-level",
            "debug",
            "--list",
        ])
        .unwrap();
        assert_eq!(args.task, "serve:dist");
        assert_eq!(args.root, Some(PathBuf::from("site")));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.list);
    }
}
