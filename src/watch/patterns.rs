// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use notify::RecursiveMode;

use crate::engine::BindingAction;
use crate::errors::Result;

/// Glob patterns (relative to the project root) plus what to do when any
/// matching path changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBinding {
    pub patterns: Vec<String>,
    pub action: BindingAction,
}

impl WatchBinding {
    pub fn new(patterns: &[&str], action: BindingAction) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            action,
        }
    }
}

/// Compiled pattern sets, indexed like the bindings they came from.
#[derive(Clone)]
pub struct BindingMatcher {
    sets: Vec<GlobSet>,
}

impl fmt::Debug for BindingMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingMatcher")
            .field("bindings", &self.sets.len())
            .finish()
    }
}

impl BindingMatcher {
    pub fn compile(bindings: &[WatchBinding]) -> Result<Self> {
        let mut sets = Vec::with_capacity(bindings.len());
        for (i, binding) in bindings.iter().enumerate() {
            let set = build_globset(&binding.patterns)
                .with_context(|| format!("building globset for watch binding #{i}"))?;
            sets.push(set);
        }
        Ok(Self { sets })
    }

    /// Indices of bindings interested in `rel_path` (forward slashes,
    /// relative to the project root).
    pub fn matching<'a>(&'a self, rel_path: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.sets
            .iter()
            .enumerate()
            .filter(move |(_, set)| set.is_match(rel_path))
            .map(|(i, _)| i)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// `*` stays within one path segment, `**` crosses them.
pub(crate) fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Static directory prefix of a glob: everything before the first segment
/// containing a wildcard. For a pattern without wildcards this is the
/// pattern itself.
///
/// `app/assets/js/**/*.js` -> `app/assets/js`, `app/*.html` -> `app`.
pub fn glob_base(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| !c.as_os_str().to_string_lossy().contains(['*', '?', '[', '{']))
        .collect()
}

/// Directories to hand to the OS watcher for the given bindings.
///
/// Wildcard patterns watch their static base recursively; plain file
/// patterns watch the parent directory only. A directory that does not
/// exist yet (e.g. `.tmp/assets/fonts` before the first build) is replaced
/// by its nearest existing ancestor inside `root`, watched recursively so
/// the directory is seen once created. Recursive roots nested inside
/// another recursive root are dropped.
pub fn watch_roots(root: &Path, bindings: &[WatchBinding]) -> Vec<(PathBuf, RecursiveMode)> {
    let mut recursive = Vec::new();
    let mut flat = Vec::new();

    for pattern in bindings.iter().flat_map(|b| b.patterns.iter()) {
        let base = glob_base(pattern);
        if base.as_os_str() == pattern.as_str() {
            let dir = match base.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => root.join(parent),
                _ => root.to_path_buf(),
            };
            if dir.is_dir() {
                flat.push(dir);
            } else {
                recursive.push(nearest_existing(root, &dir));
            }
        } else {
            let dir = root.join(base);
            if dir.is_dir() {
                recursive.push(dir);
            } else {
                recursive.push(nearest_existing(root, &dir));
            }
        }
    }

    recursive.sort();
    recursive.dedup();
    let mut collapsed: Vec<PathBuf> = Vec::new();
    for path in recursive {
        if let Some(last) = collapsed.last() {
            if path.starts_with(last) {
                continue;
            }
        }
        collapsed.push(path);
    }

    flat.sort();
    flat.dedup();
    flat.retain(|dir| !collapsed.iter().any(|r| dir.starts_with(r)));

    collapsed
        .into_iter()
        .map(|p| (p, RecursiveMode::Recursive))
        .chain(flat.into_iter().map(|p| (p, RecursiveMode::NonRecursive)))
        .filter(|(p, _)| p.is_dir())
        .collect()
}

fn nearest_existing(root: &Path, dir: &Path) -> PathBuf {
    dir.ancestors()
        .take_while(|a| a.starts_with(root))
        .find(|a| a.is_dir())
        .unwrap_or(root)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings() -> Vec<WatchBinding> {
        vec![
            WatchBinding::new(
                &["app/*.html", "app/assets/images/**/*"],
                BindingAction::reload(),
            ),
            WatchBinding::new(&["app/assets/sass/**/*.scss"], BindingAction::tasks(["sass"])),
            WatchBinding::new(&["bower.json"], BindingAction::tasks(["wiredep", "fonts"])),
        ]
    }

    #[test]
    fn glob_base_stops_at_first_wildcard() {
        assert_eq!(glob_base("app/assets/js/**/*.js"), PathBuf::from("app/assets/js"));
        assert_eq!(glob_base("app/*.html"), PathBuf::from("app"));
        assert_eq!(glob_base("bower.json"), PathBuf::from("bower.json"));
        assert_eq!(glob_base("*.txt"), PathBuf::new());
    }

    #[test]
    fn matcher_respects_segment_boundaries() {
        let matcher = BindingMatcher::compile(&bindings()).unwrap();
        assert_eq!(matcher.len(), 3);
        assert!(!matcher.is_empty());
        assert!(BindingMatcher::compile(&[]).unwrap().is_empty());

        let hits: Vec<_> = matcher.matching("app/index.html").collect();
        assert_eq!(hits, vec![0]);

        let hits: Vec<_> = matcher.matching("app/partials/nav.html").collect();
        assert!(hits.is_empty());

        let hits: Vec<_> = matcher.matching("app/assets/sass/base/_vars.scss").collect();
        assert_eq!(hits, vec![1]);

        let hits: Vec<_> = matcher.matching("bower.json").collect();
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn roots_collapse_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("app/assets/images")).unwrap();
        std::fs::create_dir_all(dir.path().join("app/assets/sass")).unwrap();

        let roots = watch_roots(dir.path(), &bindings());
        let paths: Vec<_> = roots.iter().map(|(p, _)| p.clone()).collect();

        // `app` (from app/*.html) covers both asset dirs; bower.json watches the root flat.
        assert_eq!(paths, vec![dir.path().join("app"), dir.path().to_path_buf()]);
        assert_eq!(roots[0].1, RecursiveMode::Recursive);
        assert_eq!(roots[1].1, RecursiveMode::NonRecursive);
    }

    #[test]
    fn missing_dirs_fall_back_to_nearest_existing_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".tmp/assets")).unwrap();
        let bindings = vec![
            WatchBinding::new(&[".tmp/assets/fonts/**/*"], BindingAction::reload()),
            WatchBinding::new(&["test/spec/**/*.js"], BindingAction::tasks(["lint:test"])),
        ];

        let roots = watch_roots(dir.path(), &bindings);

        // `test/` is missing entirely, so the project root covers both.
        assert_eq!(roots, vec![(dir.path().to_path_buf(), RecursiveMode::Recursive)]);

        let fonts_only = watch_roots(dir.path(), &bindings[..1]);
        assert_eq!(
            fonts_only,
            vec![(dir.path().join(".tmp/assets"), RecursiveMode::Recursive)]
        );
    }
}
