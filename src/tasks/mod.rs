// src/tasks/mod.rs

//! The built-in front-end task set.
//!
//! Layout conventions (all relative to the project root):
//! - `app/`: sources
//! - `.tmp/`: intermediate output served during development
//! - `dist/`: the production build
//! - `test/`: browser test harness

use crate::dag::{RegistryBuilder, TaskContext, TaskRegistry};
use crate::errors::Result;

pub mod assets;
pub mod files;
pub mod html;
pub mod scripts;
pub mod serve;
pub mod styles;
pub mod wiredep;

pub const APP: &str = "app";
pub const TMP: &str = ".tmp";
pub const DIST: &str = "dist";
pub const TEST: &str = "test";
pub const COMPONENTS: &str = "bower_components";
pub const MANIFEST: &str = "bower.json";

pub const SASS_SOURCES: &str = "app/assets/sass/*.scss";
pub const TMP_CSS: &str = ".tmp/assets/css";
pub const JS_SOURCES: &str = "app/assets/js/**/*.js";
pub const TMP_JS: &str = ".tmp/assets/js";
pub const HTML_SOURCES: &str = "app/*.html";
pub const IMAGE_SOURCES: &str = "app/assets/images/**/*";
pub const FONT_SOURCES: &str = "app/assets/fonts/**/*";
pub const FONT_EXTENSIONS: &[&str] = &["eot", "svg", "ttf", "woff", "woff2"];

/// Register every built-in task on `builder`.
pub fn register_frontend_tasks(builder: &mut RegistryBuilder) -> Result<()> {
    builder
        .register("sass", &[], styles::sass)?
        .register("js", &[], scripts::js)?
        .register("lint", &[], scripts::lint)?
        .register("lint:test", &[], scripts::lint_test)?
        .register("html", &["sass", "js"], html::html)?
        .register("images", &[], assets::images)?
        .register("fonts", &[], assets::fonts)?
        .register("extras", &[], assets::extras)?
        .register("clean", &[], assets::clean)?
        .register("wiredep", &[], wiredep::wiredep)?
        .register("build", &["lint", "html", "images", "fonts", "extras"], assets::build)?
        .register("default", &["clean", "build"], nothing)?
        .register("serve", &["sass", "js", "fonts"], serve::serve)?
        .register("serve:dist", &[], serve::serve_dist)?
        .register("serve:test", &["js"], serve::serve_test)?;
    Ok(())
}

/// `default` only exists for its prerequisites.
async fn nothing(_: TaskContext) -> anyhow::Result<()> {
    Ok(())
}

/// A validated registry holding only the built-in tasks.
pub fn frontend_registry() -> Result<TaskRegistry> {
    let mut builder = RegistryBuilder::new();
    register_frontend_tasks(&mut builder)?;
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tasks_register_in_table_order() {
        let registry = frontend_registry().unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "sass", "js", "lint", "lint:test", "html", "images", "fonts", "extras", "clean",
                "wiredep", "build", "default", "serve", "serve:dist", "serve:test",
            ]
        );
        assert_eq!(
            registry.lookup("default").unwrap().prerequisites(),
            &["clean".to_string(), "build".to_string()]
        );
    }
}
