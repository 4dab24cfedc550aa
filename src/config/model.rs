// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from `Siteflow.toml`.
///
/// ```toml
/// [server]
/// port = 9000
///
/// [watch]
/// debounce_ms = 100
///
/// [commands]
/// js = "npx babel app/assets/js --out-dir .tmp/assets/js --source-maps"
/// lint = "npx eslint app/assets/js"
/// lint_test = "npx eslint --env mocha test/spec"
/// ```
///
/// All sections are optional; the defaults reproduce the stock project
/// layout (`app/`, `.tmp/`, `dist/`, `test/`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub commands: CommandsSection,
}

/// `[server]` section: where the development server listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Window in which bursts of filesystem events collapse into one batch.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl WatchSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// `[commands]` section: external processors invoked through the shell.
///
/// Every entry is optional. An unset `js` means scripts are copied as-is;
/// an unset lint command means that lint task is skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsSection {
    #[serde(default)]
    pub js: Option<String>,

    #[serde(default)]
    pub lint: Option<String>,

    #[serde(default)]
    pub lint_test: Option<String>,
}
