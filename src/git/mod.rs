//! Git operations for the bare-store layout
//!
//! This module provides:
//! - The injected executor every git call goes through
//! - Worktree discovery from porcelain listings
//! - Dirty-state and default-branch queries

pub mod branch;
pub mod runner;
pub mod worktree;

pub use branch::{detect_default_branch, is_worktree_dirty, FALLBACK_BRANCH};
pub use runner::{
    check_git_available, render_command, CancelToken, GitCli, GitExecutor, GitOutput,
};
pub use worktree::{list_worktrees, parse_worktree_list, WorktreeInfo};
