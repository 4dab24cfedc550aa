// src/tasks/styles.rs

use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use crate::dag::TaskContext;
use crate::tasks::files::{blocking, expand, write_if_changed};
use crate::tasks::{SASS_SOURCES, TMP_CSS};

/// `sass`: compile top-level stylesheets into the intermediate tree.
///
/// Partials (`_name.scss`) are only reachable through `@import`. The
/// project root is on the load path so `bower_components/...` imports
/// resolve.
pub async fn sass(ctx: TaskContext) -> Result<()> {
    let root = ctx.root.clone();
    blocking(move || compile_styles(&root)).await
}

fn compile_styles(root: &Path) -> Result<()> {
    let options = grass::Options::default()
        .style(grass::OutputStyle::Expanded)
        .load_path(root);

    let mut compiled = 0;
    for file in expand(root, &[SASS_SOURCES], &[])? {
        let is_partial = file
            .path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('_'));
        if is_partial {
            debug!(path = %file.path.display(), "skipping partial");
            continue;
        }

        let css = grass::from_path(&file.path, &options)
            .map_err(|err| anyhow!("{}: {}", file.path.display(), err))?;

        let dest = root.join(TMP_CSS).join(file.rel.with_extension("css"));
        write_if_changed(&dest, css.as_bytes())?;
        compiled += 1;
    }

    info!(compiled, "stylesheets compiled");
    Ok(())
}

/// Minify already-built CSS (used when packing for distribution).
pub fn compress_css(css: &str) -> Result<String> {
    let options = grass::Options::default()
        .style(grass::OutputStyle::Compressed)
        .input_syntax(grass::InputSyntax::Css);
    grass::from_string(css.to_string(), &options).map_err(|err| anyhow!("{err}"))
}
