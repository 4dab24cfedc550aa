// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Compiling the glob patterns of each watch binding.
//! - Working out which directories need an OS-level watch.
//! - Wiring up a debounced filesystem watcher (`notify-debouncer-full`)
//!   and turning each debounced batch into [`WatchEvent::Changed`]s.
//!
//! It does **not** know about tasks or reloads; the engine decides what a
//! binding change means.
//!
//! [`WatchEvent::Changed`]: crate::engine::WatchEvent::Changed

pub mod patterns;
pub mod watcher;

pub use patterns::{glob_base, watch_roots, BindingMatcher, WatchBinding};
pub use watcher::{spawn_watcher, WatcherHandle};
