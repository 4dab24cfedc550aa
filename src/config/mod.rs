// src/config/mod.rs

//! Configuration loading and validation for siteflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate basic invariants like port and debounce ranges (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, DEFAULT_CONFIG_FILE};
pub use model::{CommandsSection, ConfigFile, ServerSection, WatchSection};
pub use validate::validate_config;
