// src/tasks/serve.rs

//! Development server sessions: `serve`, `serve:dist` and `serve:test`.
//!
//! A session binds the configured address, starts the static server, and
//! (when the profile has watch bindings) runs the watch loop until Ctrl-C.
//! Re-runs inside the session use [`Mode::Serve`], so lint violations are
//! reported without stopping anything.

use std::path::Path;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::dag::{Mode, Resolver, TaskContext};
use crate::engine::{
    BindingAction, LiveReload, RegistryBackend, WatchCore, WatchEvent, WatchOptions, WatchRuntime,
};
use crate::server::{self, ServerProfile};
use crate::tasks::{APP, COMPONENTS, DIST, TEST, TMP};
use crate::watch::{spawn_watcher, WatchBinding};

/// Everything that differs between the three server tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub server: ServerProfile,
    pub bindings: Vec<WatchBinding>,
}

pub fn app_session(root: &Path) -> Session {
    Session {
        server: ServerProfile::new(root, &[TMP, APP]).route("/bower_components", root.join(COMPONENTS)),
        bindings: vec![
            WatchBinding::new(
                &["app/*.html", "app/assets/images/**/*", ".tmp/assets/fonts/**/*"],
                BindingAction::reload(),
            ),
            WatchBinding::new(&["app/assets/sass/**/*.scss"], BindingAction::tasks(["sass"])),
            WatchBinding::new(&["app/assets/js/**/*.js"], BindingAction::tasks(["js"])),
            WatchBinding::new(&["app/assets/fonts/**/*"], BindingAction::tasks(["fonts"])),
            WatchBinding::new(&["bower.json"], BindingAction::tasks(["wiredep", "fonts"])),
        ],
    }
}

pub fn dist_session(root: &Path) -> Session {
    Session {
        server: ServerProfile::new(root, &[DIST]),
        bindings: Vec::new(),
    }
}

pub fn test_session(root: &Path) -> Session {
    Session {
        server: ServerProfile::new(root, &[TEST])
            .route("/js", root.join(TMP).join("assets/js"))
            .route("/bower_components", root.join(COMPONENTS)),
        bindings: vec![
            WatchBinding::new(&["app/assets/js/**/*.js"], BindingAction::tasks(["js"])),
            WatchBinding::new(
                &["test/spec/**/*.js"],
                BindingAction::tasks(["lint:test"]).and_reload(),
            ),
        ],
    }
}

pub async fn serve(ctx: TaskContext) -> anyhow::Result<()> {
    let session = app_session(&ctx.root);
    run_session(ctx, session).await
}

pub async fn serve_dist(ctx: TaskContext) -> anyhow::Result<()> {
    let session = dist_session(&ctx.root);
    run_session(ctx, session).await
}

pub async fn serve_test(ctx: TaskContext) -> anyhow::Result<()> {
    let session = test_session(&ctx.root);
    run_session(ctx, session).await
}

async fn run_session(ctx: TaskContext, session: Session) -> anyhow::Result<()> {
    let addr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding dev server to {addr}"))?;

    let reload = LiveReload::new();
    let (event_tx, event_rx) = mpsc::channel::<WatchEvent>(256);

    let _watcher = if session.bindings.is_empty() {
        None
    } else {
        Some(spawn_watcher(
            ctx.root.clone(),
            &session.bindings,
            ctx.config.watch.debounce(),
            event_tx.clone(),
        )?)
    };

    let shutdown_events = event_tx.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("listening for Ctrl-C failed: {err}");
            return;
        }
        info!("Ctrl-C received; shutting down");
        let _ = shutdown_events.send(WatchEvent::Shutdown).await;
    });

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let router = server::router(&session.server, reload.clone());
    let server = tokio::spawn(server::serve(listener, router, async move {
        let _ = stop_rx.await;
    }));

    let resolver = Resolver::from_context(&ctx).with_mode(Mode::Serve);
    let backend = RegistryBackend::new(resolver, event_tx);
    let core = WatchCore::new(session.bindings.iter().map(|b| b.action.clone()).collect());
    let runtime = WatchRuntime::new(core, event_rx, backend, reload, WatchOptions::default());

    let outcome = runtime.run().await;

    let _ = stop_tx.send(());
    server.await.context("dev server panicked")??;
    outcome?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::frontend_registry;

    #[test]
    fn bound_tasks_exist_in_the_registry() {
        let registry = frontend_registry().unwrap();
        let root = Path::new("/project");

        for session in [app_session(root), dist_session(root), test_session(root)] {
            for binding in &session.bindings {
                for task in &binding.action.tasks {
                    assert!(registry.contains(task), "unbound task {task}");
                }
            }
        }
    }

    #[test]
    fn app_session_serves_intermediate_tree_first() {
        let root = Path::new("/project");
        let session = app_session(root);
        assert_eq!(
            session.server.bases,
            vec![root.join(".tmp"), root.join("app")]
        );
        assert_eq!(session.server.routes[0].0, "/bower_components");
        assert!(dist_session(root).bindings.is_empty());
    }
}
