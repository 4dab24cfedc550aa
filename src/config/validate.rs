// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{Result, SiteflowError};

const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - `server.port` is not 0
/// - `watch.debounce_ms` is within `1..=10000`
/// - configured commands are not blank
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_server(cfg)?;
    validate_watch(cfg)?;
    validate_commands(cfg)?;
    Ok(())
}

fn validate_server(cfg: &ConfigFile) -> Result<()> {
    if cfg.server.port == 0 {
        return Err(SiteflowError::Config(
            "[server].port must be a fixed port (got 0)".to_string(),
        ));
    }
    if cfg.server.host.trim().is_empty() {
        return Err(SiteflowError::Config("[server].host must not be empty".to_string()));
    }
    Ok(())
}

fn validate_watch(cfg: &ConfigFile) -> Result<()> {
    let ms = cfg.watch.debounce_ms;
    if ms == 0 || ms > MAX_DEBOUNCE_MS {
        return Err(SiteflowError::Config(format!(
            "[watch].debounce_ms must be between 1 and {MAX_DEBOUNCE_MS} (got {ms})"
        )));
    }
    Ok(())
}

fn validate_commands(cfg: &ConfigFile) -> Result<()> {
    let entries = [
        ("js", &cfg.commands.js),
        ("lint", &cfg.commands.lint),
        ("lint_test", &cfg.commands.lint_test),
    ];
    for (key, value) in entries {
        if let Some(cmd) = value {
            if cmd.trim().is_empty() {
                return Err(SiteflowError::Config(format!(
                    "[commands].{key} is set but empty"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ConfigFile::default()).is_ok());
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let mut cfg = ConfigFile::default();
        cfg.watch.debounce_ms = 0;
        assert!(matches!(validate_config(&cfg), Err(SiteflowError::Config(_))));
    }

    #[test]
    fn blank_command_is_rejected() {
        let mut cfg = ConfigFile::default();
        cfg.commands.lint = Some("   ".to_string());
        let err = validate_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("lint"));
    }
}
