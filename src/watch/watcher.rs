// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::WatchEvent;
use crate::errors::Result;
use crate::watch::patterns::{watch_roots, BindingMatcher, WatchBinding};

/// Keeps the debounced watcher alive. Dropping it releases every OS watch.
pub struct WatcherHandle {
    _inner: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a debounced watcher for `bindings` under `root`.
///
/// Each debounced batch is matched against the bindings; every binding hit
/// by at least one create/modify/remove path gets exactly one
/// [`WatchEvent::Changed`], in binding order.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: &[WatchBinding],
    debounce: Duration,
    events: mpsc::Sender<WatchEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);
    let matcher = BindingMatcher::compile(bindings)?;
    debug!(bindings = matcher.len(), root = %root.display(), "watch bindings compiled");

    // Channel from the blocking notify callback into the async world.
    let (batch_tx, mut batch_rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();

    let mut debouncer = new_debouncer(debounce, None, move |res: DebounceEventResult| match res {
        Ok(batch) => {
            let paths: Vec<PathBuf> = batch
                .into_iter()
                .filter(|de| {
                    matches!(
                        de.event.kind,
                        EventKind::Create(..) | EventKind::Modify(..) | EventKind::Remove(..)
                    )
                })
                .flat_map(|de| de.event.paths)
                .collect();
            if !paths.is_empty() && batch_tx.send(paths).is_err() {
                warn!("watch loop gone; dropping filesystem events");
            }
        }
        Err(errors) => {
            for err in errors {
                error!("file watch error: {err}");
            }
        }
    })
    .map_err(anyhow::Error::from)?;

    for (dir, mode) in watch_roots(&root, bindings) {
        debouncer.watch(&dir, mode).map_err(anyhow::Error::from)?;
        info!(?dir, ?mode, "watching");
    }

    tokio::spawn(async move {
        while let Some(paths) = batch_rx.recv().await {
            let mut hit = BTreeSet::new();
            for path in &paths {
                match relative_str(&root, path) {
                    Some(rel) => {
                        for binding in matcher.matching(&rel) {
                            debug!(path = %rel, binding, "watch match");
                            hit.insert(binding);
                        }
                    }
                    None => warn!(?path, ?root, "could not relativize path"),
                }
            }

            for binding in hit {
                if events.send(WatchEvent::Changed { binding }).await.is_err() {
                    error!("watch runtime channel closed; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: debouncer })
}

/// Convert a path into a string relative to `root`, with forward slashes.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/project");
        assert_eq!(
            relative_str(root, Path::new("/project/app/index.html")).as_deref(),
            Some("app/index.html")
        );
        assert!(relative_str(root, Path::new("/elsewhere/x")).is_none());
    }
}
