use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use siteflow::config::ConfigFile;
use siteflow::dag::{RegistryBuilder, Resolver, TaskContext, TaskRegistry};
use siteflow::errors::LintFailure;
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
#[derive(Default)]
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn with_js(mut self, cmd: &str) -> Self {
        self.config.commands.js = Some(cmd.to_string());
        self
    }

    pub fn with_lint(mut self, cmd: &str) -> Self {
        self.config.commands.lint = Some(cmd.to_string());
        self
    }

    pub fn with_lint_test(mut self, cmd: &str) -> Self {
        self.config.commands.lint_test = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        self.config
    }
}

/// A throwaway project tree on disk.
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating temp project"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn file(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().expect("file has a parent")).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// A resolver over `registry` rooted at this project.
    pub fn resolver(&self, registry: TaskRegistry, config: ConfigFile) -> Resolver {
        Resolver::new(Arc::new(registry), self.root(), Arc::new(config))
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared log of task bodies that ran, in order.
pub type RunLog = Arc<Mutex<Vec<String>>>;

/// Builds registries whose bodies only record that they ran.
pub struct RecordingRegistry {
    builder: RegistryBuilder,
    log: RunLog,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self {
            builder: RegistryBuilder::new(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn task(mut self, name: &str, prerequisites: &[&str]) -> Self {
        let log = Arc::clone(&self.log);
        let label = name.to_string();
        self.builder
            .register(name, prerequisites, move |_: TaskContext| {
                let log = Arc::clone(&log);
                let label = label.clone();
                async move {
                    log.lock().unwrap().push(label);
                    Ok::<(), anyhow::Error>(())
                }
            })
            .expect("registering test task");
        self
    }

    /// A task that records itself and then fails with a processing error.
    pub fn failing(mut self, name: &str, prerequisites: &[&str]) -> Self {
        let log = Arc::clone(&self.log);
        let label = name.to_string();
        self.builder
            .register(name, prerequisites, move |_: TaskContext| {
                let log = Arc::clone(&log);
                let label = label.clone();
                async move {
                    log.lock().unwrap().push(label.clone());
                    Err::<(), _>(anyhow::anyhow!("{label} exploded"))
                }
            })
            .expect("registering test task");
        self
    }

    /// A task that records itself and then reports lint violations.
    pub fn lint_failing(mut self, name: &str, prerequisites: &[&str]) -> Self {
        let log = Arc::clone(&self.log);
        let label = name.to_string();
        self.builder
            .register(name, prerequisites, move |_: TaskContext| {
                let log = Arc::clone(&log);
                let label = label.clone();
                async move {
                    log.lock().unwrap().push(label);
                    Err::<(), _>(anyhow::Error::from(LintFailure {
                        report: "main.js:1:1 Missing semicolon".to_string(),
                    }))
                }
            })
            .expect("registering test task");
        self
    }

    pub fn build(self) -> (TaskRegistry, RunLog) {
        let registry = self.builder.build().expect("valid test registry");
        (registry, self.log)
    }
}

impl Default for RecordingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
