//! gitsej: bare-store repository layouts
//!
//! The [`layout`] module holds the engine (create, migrate, init, upgrade);
//! [`git`] wraps the `git` binary behind [`git::GitExecutor`] so the engine
//! can be driven by a scripted executor in tests. [`commands`] is the thin
//! presentation layer used by the `gitsej` binary.

pub mod commands;
pub mod completions;
pub mod error;
pub mod git;
pub mod layout;

pub use error::{LayoutError, Result};
