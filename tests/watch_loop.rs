use std::sync::{Arc, Mutex};

use siteflow::engine::{
    BindingAction, LiveReload, WatchCore, WatchEvent, WatchOptions, WatchRuntime,
};
use siteflow::errors::Result;
use siteflow_test_utils::fake_backend::FakeBackend;
use siteflow_test_utils::{init_tracing, with_timeout};
use tokio::sync::mpsc;

fn bindings() -> Vec<BindingAction> {
    vec![
        BindingAction::reload(),
        BindingAction::tasks(["sass"]),
        BindingAction::tasks(["js"]),
    ]
}

struct Session {
    tx: mpsc::Sender<WatchEvent>,
    started: Arc<Mutex<Vec<String>>>,
    reload: LiveReload,
    runtime: WatchRuntime<FakeBackend>,
}

fn session(failing: Option<&str>) -> Session {
    let (tx, rx) = mpsc::channel(64);
    let started = Arc::new(Mutex::new(Vec::new()));
    let mut backend = FakeBackend::new(tx.clone(), Arc::clone(&started));
    if let Some(task) = failing {
        backend = backend.failing(task);
    }
    let reload = LiveReload::new();
    let runtime = WatchRuntime::new(
        WatchCore::new(bindings()),
        rx,
        backend,
        reload.clone(),
        WatchOptions {
            exit_when_idle: true,
        },
    );
    Session {
        tx,
        started,
        reload,
        runtime,
    }
}

#[tokio::test]
async fn change_reruns_only_the_bound_task_and_reloads() -> Result<()> {
    init_tracing();
    let s = session(None);
    let mut viewer = s.reload.subscribe();

    s.tx.send(WatchEvent::Changed { binding: 1 }).await.unwrap();
    with_timeout(s.runtime.run()).await?;

    assert_eq!(*s.started.lock().unwrap(), vec!["sass"]);
    assert!(viewer.try_recv().is_ok());
    assert!(viewer.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn reload_only_binding_runs_no_task() -> Result<()> {
    let s = session(None);
    let mut viewer = s.reload.subscribe();

    s.tx.send(WatchEvent::Changed { binding: 0 }).await.unwrap();
    with_timeout(s.runtime.run()).await?;

    assert!(s.started.lock().unwrap().is_empty());
    assert!(viewer.try_recv().is_ok());
    Ok(())
}

#[tokio::test]
async fn failed_rebuild_keeps_watching_without_reload() -> Result<()> {
    let s = session(Some("sass"));
    let mut viewer = s.reload.subscribe();

    // Second change lands while the first run is still in flight.
    s.tx.send(WatchEvent::Changed { binding: 1 }).await.unwrap();
    s.tx.send(WatchEvent::Changed { binding: 1 }).await.unwrap();
    s.tx.send(WatchEvent::Changed { binding: 2 }).await.unwrap();
    with_timeout(s.runtime.run()).await?;

    assert_eq!(*s.started.lock().unwrap(), vec!["sass", "js", "sass"]);
    // Only the successful `js` rebuild reloads.
    assert!(viewer.try_recv().is_ok());
    assert!(viewer.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn shutdown_stops_the_loop() -> Result<()> {
    let s = session(None);
    s.tx.send(WatchEvent::Shutdown).await.unwrap();
    s.tx.send(WatchEvent::Changed { binding: 1 }).await.unwrap();

    with_timeout(s.runtime.run()).await?;
    assert!(s.started.lock().unwrap().is_empty());
    Ok(())
}
