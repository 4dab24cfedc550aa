// src/dag/resolver.rs

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::config::ConfigFile;
use crate::dag::registry::TaskRegistry;
use crate::dag::task::{Mode, TaskContext};
use crate::dag::TaskName;
use crate::errors::{LintFailure, Result, SiteflowError};

/// Per-invocation record of which tasks already completed.
///
/// A shared prerequisite runs at most once per top-level invocation.
#[derive(Debug, Default)]
pub struct RunContext {
    completed: HashSet<TaskName>,
    order: Vec<TaskName>,
}

impl RunContext {
    pub fn is_complete(&self, name: &str) -> bool {
        self.completed.contains(name)
    }

    /// Tasks in the order their bodies finished successfully.
    pub fn completed(&self) -> &[TaskName] {
        &self.order
    }

    fn mark_complete(&mut self, name: &str) {
        if self.completed.insert(name.to_string()) {
            self.order.push(name.to_string());
        }
    }
}

/// Expands a requested task into its prerequisite chain and runs it.
///
/// Execution is strictly sequential: each body's future is awaited before
/// the next one starts, prerequisites in declaration order.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<TaskRegistry>,
    root: PathBuf,
    config: Arc<ConfigFile>,
    mode: Mode,
}

impl Resolver {
    pub fn new(registry: Arc<TaskRegistry>, root: impl Into<PathBuf>, config: Arc<ConfigFile>) -> Self {
        Self {
            registry,
            root: root.into(),
            config,
            mode: Mode::OneShot,
        }
    }

    /// Rebuild a resolver from inside a running task body.
    pub fn from_context(ctx: &TaskContext) -> Self {
        Self {
            registry: Arc::clone(&ctx.registry),
            root: ctx.root.clone(),
            config: Arc::clone(&ctx.config),
            mode: ctx.mode,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn context(&self) -> TaskContext {
        TaskContext {
            root: self.root.clone(),
            config: Arc::clone(&self.config),
            mode: self.mode,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Linear execution order for `name`: transitive prerequisites
    /// (depth-first, declaration order, deduplicated) followed by `name`.
    ///
    /// Unknown names and cycles are reported here, before any body runs.
    pub fn plan(&self, name: &str) -> Result<Vec<TaskName>> {
        let mut visiting = Vec::new();
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        self.visit(name, &mut visiting, &mut seen, &mut order)?;
        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        visiting: &mut Vec<TaskName>,
        seen: &mut HashSet<TaskName>,
        order: &mut Vec<TaskName>,
    ) -> Result<()> {
        if seen.contains(name) {
            return Ok(());
        }
        if let Some(pos) = visiting.iter().position(|n| n == name) {
            let mut cycle = visiting[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(SiteflowError::CyclicDependency { cycle });
        }

        let task = self.registry.lookup(name)?;
        visiting.push(name.to_string());
        for dep in task.prerequisites() {
            self.visit(dep, visiting, seen, order)?;
        }
        visiting.pop();

        seen.insert(name.to_string());
        order.push(name.to_string());
        Ok(())
    }

    /// Run `name` and everything it depends on.
    ///
    /// The first failing body aborts the chain; the error carries the
    /// originating task name.
    pub async fn run(&self, name: &str) -> Result<RunContext> {
        let plan = self.plan(name)?;
        info!(task = %name, ?plan, "resolved task chain");

        let mut run = RunContext::default();
        for step in &plan {
            if run.is_complete(step) {
                continue;
            }
            self.execute(step).await?;
            run.mark_complete(step);
        }
        Ok(run)
    }

    /// Run a single body without touching its prerequisites.
    ///
    /// Used by the watch loop, which re-runs only the bound task.
    pub async fn run_single(&self, name: &str) -> Result<()> {
        self.execute(name).await
    }

    async fn execute(&self, name: &str) -> Result<()> {
        let task = self.registry.lookup(name)?;
        let started = Instant::now();
        info!(task = %name, "starting");

        match task.run(self.context()).await {
            Ok(()) => {
                info!(task = %name, elapsed_ms = started.elapsed().as_millis() as u64, "finished");
                Ok(())
            }
            Err(err) => {
                error!(task = %name, error = %format!("{err:#}"), "failed");
                Err(classify_failure(name, err))
            }
        }
    }
}

fn classify_failure(task: &str, err: anyhow::Error) -> SiteflowError {
    match err.downcast::<LintFailure>() {
        Ok(lint) => SiteflowError::LintViolation {
            task: task.to_string(),
            report: lint.report,
        },
        Err(err) => {
            debug!(task = %task, "classified as processing error");
            SiteflowError::Processing {
                task: task.to_string(),
                source: err,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::dag::RegistryBuilder;

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        name: &'static str,
    ) -> impl Fn(TaskContext) -> std::future::Ready<anyhow::Result<()>> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_| {
            log.lock().unwrap().push(name.to_string());
            std::future::ready(Ok(()))
        }
    }

    fn resolver(builder: RegistryBuilder) -> Resolver {
        Resolver::new(
            Arc::new(TaskRegistry::unchecked(builder)),
            ".",
            Arc::new(ConfigFile::default()),
        )
    }

    #[tokio::test]
    async fn runtime_cycle_is_reported_before_any_body_runs() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = RegistryBuilder::new();
        builder.register("leaf", &[], recorder(&log, "leaf")).unwrap();
        builder.register("a", &["leaf", "b"], recorder(&log, "a")).unwrap();
        builder.register("b", &["a"], recorder(&log, "b")).unwrap();

        let err = resolver(builder).run("a").await.unwrap_err();
        match err {
            SiteflowError::CyclicDependency { cycle } => assert_eq!(cycle, vec!["a", "b", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn shared_prerequisite_runs_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = RegistryBuilder::new();
        builder.register("base", &[], recorder(&log, "base")).unwrap();
        builder.register("left", &["base"], recorder(&log, "left")).unwrap();
        builder.register("right", &["base"], recorder(&log, "right")).unwrap();
        builder.register("top", &["left", "right"], recorder(&log, "top")).unwrap();

        let run = resolver(builder).run("top").await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["base", "left", "right", "top"]);
        assert_eq!(run.completed(), ["base", "left", "right", "top"]);
    }

    #[tokio::test]
    async fn lint_failure_is_classified() {
        let mut builder = RegistryBuilder::new();
        builder
            .register("lint", &[], |_: TaskContext| async {
                Err::<(), _>(anyhow::Error::new(LintFailure {
                    report: "app.js:1:1 no-undef".to_string(),
                }))
            })
            .unwrap();

        match resolver(builder).run("lint").await {
            Err(SiteflowError::LintViolation { task, report }) => {
                assert_eq!(task, "lint");
                assert!(report.contains("no-undef"));
            }
            other => panic!("expected lint violation, got {other:?}"),
        }
    }
}
