// src/tasks/files.rs

//! Source enumeration and output writing shared by the task bodies.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use tracing::debug;

use crate::watch::glob_base;
use crate::watch::patterns::build_globset;

/// A matched input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the static base of the pattern that matched it;
    /// outputs keep this layout under their destination directory.
    pub rel: PathBuf,
}

/// Expand project-relative `includes`, dropping anything matched by
/// `excludes`. Only regular files are returned, sorted by path.
pub fn expand(root: &Path, includes: &[&str], excludes: &[&str]) -> Result<Vec<SourceFile>> {
    let excludes: Vec<String> = excludes.iter().map(|s| s.to_string()).collect();
    let exclude_set = build_globset(&excludes)?;
    let escaped_root = Pattern::escape(&root.to_string_lossy());

    let mut files = Vec::new();
    for pattern in includes {
        let base = root.join(glob_base(pattern));
        let full = format!("{escaped_root}/{pattern}");

        for entry in glob::glob(&full).with_context(|| format!("invalid source glob {pattern}"))? {
            let path = entry.with_context(|| format!("reading matches of {pattern}"))?;
            if !path.is_file() {
                continue;
            }
            let root_rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            if exclude_set.is_match(&root_rel) {
                debug!(path = %root_rel, "excluded");
                continue;
            }
            let rel = if base == path {
                PathBuf::from(path.file_name().unwrap_or_default())
            } else {
                path.strip_prefix(&base).unwrap_or(&path).to_path_buf()
            };
            files.push(SourceFile { path, rel });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

/// Write `bytes` to `dest` unless it already holds identical content.
/// Returns whether the file was written.
pub fn write_if_changed(dest: &Path, bytes: &[u8]) -> Result<bool> {
    if dest.is_file() {
        let existing = fs::read(dest).with_context(|| format!("reading {}", dest.display()))?;
        if blake3::hash(&existing) == blake3::hash(bytes) {
            return Ok(false);
        }
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(dest, bytes).with_context(|| format!("writing {}", dest.display()))?;
    Ok(true)
}

/// Copy each file to every destination directory, preserving `rel`.
/// Returns `(written, unchanged)` counts.
pub fn copy_into(files: &[SourceFile], dests: &[PathBuf]) -> Result<(usize, usize)> {
    let mut written = 0;
    let mut unchanged = 0;
    for file in files {
        let bytes = fs::read(&file.path).with_context(|| format!("reading {}", file.path.display()))?;
        for dest in dests {
            if write_if_changed(&dest.join(&file.rel), &bytes)? {
                written += 1;
            } else {
                unchanged += 1;
            }
        }
    }
    Ok((written, unchanged))
}

/// Run blocking filesystem work off the async scheduler.
pub async fn blocking<F>(work: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("task body panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    #[test]
    fn expand_keeps_layout_below_glob_base() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app/assets/js/main.js");
        touch(dir.path(), "app/assets/js/lib/util.js");
        touch(dir.path(), "app/assets/js/readme.md");

        let files = expand(dir.path(), &["app/assets/js/**/*.js"], &[]).unwrap();
        let rels: Vec<_> = files.iter().map(|f| f.rel.clone()).collect();
        assert_eq!(rels, vec![PathBuf::from("lib/util.js"), PathBuf::from("main.js")]);
    }

    #[test]
    fn expand_applies_excludes_and_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app/index.html");
        touch(dir.path(), "app/robots.txt");
        touch(dir.path(), "app/.htaccess");

        let files = expand(dir.path(), &["app/*.*"], &["app/*.html"]).unwrap();
        let rels: Vec<_> = files.iter().map(|f| f.rel.to_string_lossy().into_owned()).collect();
        assert_eq!(rels, vec![".htaccess", "robots.txt"]);
    }

    #[test]
    fn literal_file_pattern_flattens_to_file_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bower_components/icons/fonts/icons.woff");

        let files = expand(dir.path(), &["bower_components/icons/fonts/icons.woff"], &[]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel, PathBuf::from("icons.woff"));
    }

    #[test]
    fn unchanged_content_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out/a.txt");
        assert!(write_if_changed(&dest, b"one").unwrap());
        assert!(!write_if_changed(&dest, b"one").unwrap());
        assert!(write_if_changed(&dest, b"two").unwrap());
    }
}
