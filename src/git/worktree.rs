//! Worktree discovery
//!
//! Parses `git worktree list --porcelain` into [`WorktreeInfo`] records.
//! Records are recomputed for every operation and never cached.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::runner::GitExecutor;

/// One entry of the worktree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeInfo {
    /// Path exactly as git reported it
    pub path: PathBuf,
    /// Set only for the store's own bookkeeping entry
    pub bare: bool,
}

/// Parse porcelain worktree listing output.
///
/// Blocks are separated by blank lines and start with `worktree <path>`.
/// A new `worktree` line also closes an open block, and a block left open at
/// the end of input is still emitted, so a missing trailing blank line is
/// harmless. Attribute lines other than `bare` are ignored.
pub fn parse_worktree_list(output: &str) -> Vec<WorktreeInfo> {
    let mut worktrees = Vec::new();
    let mut current: Option<WorktreeInfo> = None;

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            if let Some(done) = current.take() {
                worktrees.push(done);
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(done) = current.take() {
                worktrees.push(done);
            }
            current = Some(WorktreeInfo {
                path: PathBuf::from(path.trim()),
                bare: false,
            });
            continue;
        }

        if line == "bare" {
            if let Some(wt) = current.as_mut() {
                wt.bare = true;
            }
        }
    }

    if let Some(done) = current {
        worktrees.push(done);
    }
    worktrees
}

/// List all worktrees known to the repository at `repo_dir`
pub fn list_worktrees(git: &dyn GitExecutor, repo_dir: &Path) -> Result<Vec<WorktreeInfo>> {
    let repo = repo_dir.to_string_lossy();
    let stdout = git.run(&["-C", &repo, "worktree", "list", "--porcelain"], None)?;
    Ok(parse_worktree_list(&stdout))
}
