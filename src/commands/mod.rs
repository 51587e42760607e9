//! Command handlers for the `gitsej` binary
//!
//! Each handler calls into [`crate::layout`] and prints a short summary.
//! Nothing here makes decisions the engine does not; the only extra step is
//! the confirmation prompt before a forced migration.

pub mod create;
pub mod init;
pub mod migrate;
pub mod upgrade;
