// src/tasks/assets.rs

//! Static asset tasks: images, fonts, extras, clean, plus the size report
//! logged after `build`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::dag::TaskContext;
use crate::tasks::files::{blocking, copy_into, expand, SourceFile};
use crate::tasks::wiredep::Manifest;
use crate::tasks::{APP, DIST, FONT_EXTENSIONS, FONT_SOURCES, IMAGE_SOURCES, TMP};

/// `images`: copy images into the intermediate and distribution trees.
pub async fn images(ctx: TaskContext) -> Result<()> {
    let root = ctx.root.clone();
    blocking(move || {
        let files = expand(&root, &[IMAGE_SOURCES], &[])?;
        let dests = [
            root.join(TMP).join("assets/images"),
            root.join(DIST).join("assets/images"),
        ];
        let (written, unchanged) = copy_into(&files, &dests)?;
        info!(written, unchanged, "images copied");
        Ok(())
    })
    .await
}

/// `fonts`: font files from installed components and from the app,
/// flattened into `assets/fonts/` of both trees.
pub async fn fonts(ctx: TaskContext) -> Result<()> {
    let root = ctx.root.clone();
    blocking(move || {
        let mut files = component_fonts(&root)?;
        files.extend(expand(&root, &[FONT_SOURCES], &[])?);

        let dests = [
            root.join(TMP).join("assets/fonts"),
            root.join(DIST).join("assets/fonts"),
        ];
        let (written, unchanged) = copy_into(&files, &dests)?;
        info!(written, unchanged, "fonts copied");
        Ok(())
    })
    .await
}

/// Manifest problems only degrade the font set; they are left for
/// `wiredep` to report as failures.
fn component_fonts(root: &Path) -> Result<Vec<SourceFile>> {
    let manifest = match Manifest::load(root) {
        Ok(Some(manifest)) => manifest,
        Ok(None) => return Ok(Vec::new()),
        Err(err) => {
            warn!("skipping component fonts: {err:#}");
            return Ok(Vec::new());
        }
    };

    let (files, errors) = manifest.files(root);
    for err in errors {
        warn!("skipping component: {err:#}");
    }

    Ok(files
        .into_iter()
        .filter(|f| {
            f.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FONT_EXTENSIONS.contains(&e))
        })
        .filter_map(|rel| {
            let name = rel.file_name()?.into();
            Some(SourceFile {
                path: root.join(&rel),
                rel: name,
            })
        })
        .collect())
}

/// `extras`: top-level app files other than pages, dotfiles included.
pub async fn extras(ctx: TaskContext) -> Result<()> {
    let root = ctx.root.clone();
    blocking(move || {
        let include = format!("{APP}/*.*");
        let exclude = format!("{APP}/*.html");
        let files = expand(&root, &[&include], &[&exclude])?;
        let (written, unchanged) = copy_into(&files, &[root.join(DIST)])?;
        info!(written, unchanged, "extras copied");
        Ok(())
    })
    .await
}

/// `clean`: remove the intermediate and distribution trees.
pub async fn clean(ctx: TaskContext) -> Result<()> {
    let root = ctx.root.clone();
    blocking(move || {
        for dir in [TMP, DIST] {
            let path = root.join(dir);
            match fs::remove_dir_all(&path) {
                Ok(()) => info!(dir, "removed"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(err).with_context(|| format!("removing {}", path.display()));
                }
            }
        }
        Ok(())
    })
    .await
}

/// Total file count and byte size of the distribution tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeReport {
    pub files: usize,
    pub bytes: u64,
}

pub fn dist_report(root: &Path) -> Result<SizeReport> {
    let pattern = format!("{DIST}/**/*");
    let mut report = SizeReport::default();
    for file in expand(root, &[&pattern], &[])? {
        let meta = fs::metadata(&file.path).with_context(|| format!("stat {}", file.path.display()))?;
        report.files += 1;
        report.bytes += meta.len();
    }
    Ok(report)
}

/// `build` body: the prerequisites did the work; log what landed in `dist/`.
pub async fn build(ctx: TaskContext) -> Result<()> {
    let root = ctx.root.clone();
    blocking(move || {
        let report = dist_report(&root)?;
        info!(files = report.files, bytes = report.bytes, "build size");
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn component_fonts_are_flattened_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "bower_components/icons/fonts/icons.woff", "w");
        touch(root, "bower_components/icons/css/icons.css", "c");
        touch(
            root,
            "bower.json",
            r#"{"dependencies": {"icons": "1"}, "overrides": {"icons": {"main": ["fonts/icons.woff", "css/icons.css"]}}}"#,
        );

        let fonts = component_fonts(root).unwrap();
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].rel, Path::new("icons.woff"));
    }

    #[test]
    fn broken_manifest_yields_no_component_fonts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bower.json", "{ not json");
        assert!(component_fonts(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn report_counts_dist_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dist/index.html", "12345");
        touch(dir.path(), "dist/assets/css/main.css", "123");
        touch(dir.path(), "app/index.html", "ignored");

        let report = dist_report(dir.path()).unwrap();
        assert_eq!(report, SizeReport { files: 2, bytes: 8 });
    }
}
