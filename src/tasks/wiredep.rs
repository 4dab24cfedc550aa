// src/tasks/wiredep.rs

//! `wiredep`: inject front-end library references into sources.
//!
//! The manifest (`bower.json`) lists dependencies by name and version. Each
//! component's files come from `overrides.<name>.main` in the manifest, or
//! from the `main` field of the component's own `.bower.json`/`bower.json`
//! under `bower_components/<name>/`.
//!
//! Injection blocks look like:
//!
//! ```text
//! <!-- bower:css -->            // bower:scss
//! <!-- endbower -->             // endbower
//! ```
//!
//! Processing is best-effort: every target file is attempted, and the task
//! fails at the end if any of them (or any component) could not be handled.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::dag::TaskContext;
use crate::tasks::files::{blocking, expand, write_if_changed};
use crate::tasks::{COMPONENTS, HTML_SOURCES, MANIFEST, SASS_SOURCES};

#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub overrides: BTreeMap<String, ComponentMeta>,
}

/// The part of a component descriptor we care about.
#[derive(Debug, Default, Deserialize)]
pub struct ComponentMeta {
    #[serde(default)]
    pub main: Option<MainFiles>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MainFiles {
    One(String),
    Many(Vec<String>),
}

impl MainFiles {
    fn to_vec(&self) -> Vec<String> {
        match self {
            MainFiles::One(f) => vec![f.clone()],
            MainFiles::Many(fs) => fs.clone(),
        }
    }
}

/// A resolved dependency: name, declared version and its files relative to
/// the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub version: String,
    pub files: Vec<PathBuf>,
}

impl Manifest {
    /// Read `bower.json` from `root`. `Ok(None)` when there is no manifest.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = root.join(MANIFEST);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let manifest = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(manifest))
    }

    /// Resolve every dependency; failures are returned alongside the
    /// components that did resolve.
    pub fn components(&self, root: &Path) -> (Vec<Component>, Vec<anyhow::Error>) {
        let mut resolved = Vec::new();
        let mut errors = Vec::new();

        for (name, version) in &self.dependencies {
            match self.resolve(root, name) {
                Ok(files) => resolved.push(Component {
                    name: name.clone(),
                    version: version.clone(),
                    files,
                }),
                Err(err) => errors.push(err),
            }
        }

        (resolved, errors)
    }

    fn resolve(&self, root: &Path, name: &str) -> Result<Vec<PathBuf>> {
        let dir = Path::new(COMPONENTS).join(name);

        let main = match self.overrides.get(name).and_then(|o| o.main.clone()) {
            Some(main) => main,
            None => read_component_main(root, &dir, name)?,
        };

        let mut files = Vec::new();
        for file in main.to_vec() {
            let rel = dir.join(file.trim_start_matches("./"));
            if !root.join(&rel).is_file() {
                bail!("component `{name}` lists missing file {}", rel.display());
            }
            files.push(rel);
        }
        Ok(files)
    }

    /// All component files, in dependency order.
    pub fn files(&self, root: &Path) -> (Vec<PathBuf>, Vec<anyhow::Error>) {
        let (components, errors) = self.components(root);
        let files = components.into_iter().flat_map(|c| c.files).collect();
        (files, errors)
    }
}

fn read_component_main(root: &Path, dir: &Path, name: &str) -> Result<MainFiles> {
    for descriptor in [".bower.json", "bower.json"] {
        let path = root.join(dir).join(descriptor);
        if !path.is_file() {
            continue;
        }
        let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let meta: ComponentMeta =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        return meta
            .main
            .ok_or_else(|| anyhow!("component `{name}` declares no `main` files"));
    }
    bail!("component `{name}` is not installed under {}", dir.display())
}

pub async fn wiredep(ctx: TaskContext) -> Result<()> {
    let root = ctx.root.clone();
    blocking(move || inject_all(&root)).await
}

fn inject_all(root: &Path) -> Result<()> {
    let Some(manifest) = Manifest::load(root)? else {
        info!("no {MANIFEST}; nothing to inject");
        return Ok(());
    };

    let (files, mut failures) = manifest.files(root);
    for err in &failures {
        warn!("{err:#}");
    }

    let mut rewritten = 0;
    for target in expand(root, &[HTML_SOURCES, SASS_SOURCES], &[])? {
        match inject_file(root, &target.path, &files) {
            Ok(true) => rewritten += 1,
            Ok(false) => {}
            Err(err) => {
                let err = err.context(format!("{}", target.path.display()));
                warn!("{err:#}");
                failures.push(err);
            }
        }
    }

    info!(rewritten, "dependency references injected");

    if !failures.is_empty() {
        let lines: Vec<String> = failures.iter().map(|e| format!("  {e:#}")).collect();
        bail!("{} injection problem(s):\n{}", failures.len(), lines.join("\n"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Html,
    Scss,
}

static HTML_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)([ \t]*)<!--\s*bower:(\w+)\s*-->.*?<!--\s*endbower\s*-->").expect("static regex")
});
static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*bower:\w+\s*-->").expect("static regex"));
static SCSS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)([ \t]*)//\s*bower:(\w+)[^\n]*\n.*?//\s*endbower").expect("static regex")
});
static SCSS_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//\s*bower:\w+").expect("static regex"));
static HTML_IGNORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\.\./)*\.\.").expect("static regex"));
static SCSS_IGNORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\.\./)+").expect("static regex"));

fn inject_file(root: &Path, path: &Path, files: &[PathBuf]) -> Result<bool> {
    let syntax = match path.extension().and_then(|e| e.to_str()) {
        Some("scss") => Syntax::Scss,
        _ => Syntax::Html,
    };
    let source = fs::read_to_string(path)?;
    let depth = path
        .strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .map(|p| p.components().count())
        .unwrap_or(0);

    let updated = inject(&source, syntax, depth, files)?;
    if updated == source {
        return Ok(false);
    }
    write_if_changed(path, updated.as_bytes())
}

/// Replace every injection block in `source`. `depth` is how many
/// directories below the project root the source file lives.
fn inject(source: &str, syntax: Syntax, depth: usize, files: &[PathBuf]) -> Result<String> {
    let (block, open) = match syntax {
        Syntax::Html => (&*HTML_BLOCK, &*HTML_OPEN),
        Syntax::Scss => (&*SCSS_BLOCK, &*SCSS_OPEN),
    };

    let blocks = block.captures_iter(source).count();
    let opens = open.find_iter(source).count();
    if opens != blocks {
        bail!("unterminated bower block ({opens} opened, {blocks} closed)");
    }

    let result = block.replace_all(source, |caps: &regex::Captures| {
        let indent = &caps[1];
        let kind = &caps[2];
        let mut lines = Vec::new();
        match syntax {
            Syntax::Html => lines.push(format!("{indent}<!-- bower:{kind} -->")),
            Syntax::Scss => lines.push(format!("{indent}// bower:{kind}")),
        }

        for file in files.iter().filter(|f| f.extension().is_some_and(|e| e == kind)) {
            let href = reference(file, depth, syntax);
            lines.push(match (syntax, kind) {
                (Syntax::Html, "css") => format!(r#"{indent}<link rel="stylesheet" href="{href}" />"#),
                (Syntax::Html, _) => format!(r#"{indent}<script src="{href}"></script>"#),
                (Syntax::Scss, _) => format!(r#"{indent}@import "{href}";"#),
            });
        }

        match syntax {
            Syntax::Html => lines.push(format!("{indent}<!-- endbower -->")),
            Syntax::Scss => lines.push(format!("{indent}// endbower")),
        }
        lines.join("\n")
    });

    Ok(result.into_owned())
}

/// Path from the source file to `file`, with leading `../` segments
/// stripped so it resolves from the server root (HTML) or the load path
/// (SCSS).
fn reference(file: &Path, depth: usize, syntax: Syntax) -> String {
    let rel = format!(
        "{}{}",
        "../".repeat(depth),
        file.to_string_lossy().replace('\\', "/")
    );
    let ignore = match syntax {
        Syntax::Html => &*HTML_IGNORE,
        Syntax::Scss => &*SCSS_IGNORE,
    };
    ignore.replace(&rel, "").into_owned()
}
