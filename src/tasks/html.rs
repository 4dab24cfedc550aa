// src/tasks/html.rs

//! `html`: pack pages for distribution.
//!
//! Each `<!-- build:css out.css -->` / `<!-- build:js out.js -->` block is
//! replaced by a single reference to `out`, whose content is the
//! concatenation of every asset referenced inside the block.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::info;

use crate::dag::TaskContext;
use crate::tasks::files::{blocking, expand, write_if_changed};
use crate::tasks::styles::compress_css;
use crate::tasks::{APP, DIST, HTML_SOURCES, TMP};

static BUILD_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*build:(css|js)\s+(\S+)\s*-->(.*?)<!--\s*endbuild\s*-->")
        .expect("static regex")
});
static CSS_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<link[^>]*\shref=["']([^"']+)["']"#).expect("static regex"));
static JS_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<script[^>]*\ssrc=["']([^"']+)["']"#).expect("static regex"));
static LINE_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s*\n\s*<").expect("static regex"));
static PREFORMATTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>").expect("static regex")
});

pub async fn html(ctx: TaskContext) -> Result<()> {
    let root = ctx.root.clone();
    blocking(move || pack_pages(&root)).await
}

fn pack_pages(root: &Path) -> Result<()> {
    let search = [root.join(TMP), root.join(APP), root.to_path_buf()];
    let dist = root.join(DIST);

    let mut bundles: BTreeMap<String, String> = BTreeMap::new();
    let mut pages = 0;

    for page in expand(root, &[HTML_SOURCES], &[])? {
        let source = fs::read_to_string(&page.path)
            .with_context(|| format!("reading {}", page.path.display()))?;
        let packed = pack_page(&source, &search, &mut bundles)
            .with_context(|| format!("packing {}", page.path.display()))?;
        write_if_changed(&dist.join(&page.rel), collapse_whitespace(&packed).as_bytes())?;
        pages += 1;
    }

    for (out, content) in &bundles {
        write_if_changed(&dist.join(out.trim_start_matches('/')), content.as_bytes())?;
    }

    info!(pages, bundles = bundles.len(), "pages packed");
    Ok(())
}

/// Rewrite build blocks in one page, collecting bundle contents keyed by
/// output path.
fn pack_page(source: &str, search: &[PathBuf], bundles: &mut BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for caps in BUILD_BLOCK.captures_iter(source) {
        let whole = caps.get(0).ok_or_else(|| anyhow!("empty build block match"))?;
        let kind = &caps[1];
        let target = caps[2].to_string();
        let body = &caps[3];

        let refs = match kind {
            "css" => &*CSS_REF,
            _ => &*JS_REF,
        };

        let mut parts = Vec::new();
        for asset in refs.captures_iter(body) {
            let url = asset[1].split(['?', '#']).next().unwrap_or_default();
            let path = locate(url, search)
                .ok_or_else(|| anyhow!("cannot find `{url}` in .tmp, app or project root"))?;
            parts.push(
                fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?,
            );
        }

        let joined = parts.join("\n");
        let bundle = match kind {
            "css" => compress_css(&joined).with_context(|| format!("minifying {target}"))?,
            _ => joined,
        };
        bundles.insert(target.clone(), bundle);

        out.push_str(&source[last..whole.start()]);
        match kind {
            "css" => out.push_str(&format!(r#"<link rel="stylesheet" href="{target}">"#)),
            _ => out.push_str(&format!(r#"<script src="{target}"></script>"#)),
        }
        last = whole.end();
    }

    out.push_str(&source[last..]);
    Ok(out)
}

fn locate(url: &str, search: &[PathBuf]) -> Option<PathBuf> {
    let rel = url.trim_start_matches('/');
    search.iter().map(|dir| dir.join(rel)).find(|p| p.is_file())
}

/// Drop whitespace runs between tags that span a line break. Gaps that
/// start inside `<pre>` or `<textarea>` are kept as written.
fn collapse_whitespace(html: &str) -> String {
    let kept: Vec<_> = PREFORMATTED.find_iter(html).map(|m| m.range()).collect();

    LINE_GAP
        .replace_all(html, |caps: &regex::Captures| {
            let gap = &caps[0];
            let at = caps.get(0).map_or(0, |m| m.start());
            if kept.iter().any(|r| r.contains(&at)) {
                gap.to_string()
            } else {
                "><".to_string()
            }
        })
        .into_owned()
}
