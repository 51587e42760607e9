//! Branch and status queries

use std::path::Path;

use tracing::debug;

use crate::error::Result;

use super::runner::GitExecutor;

/// Branch name used when nothing better can be determined
pub const FALLBACK_BRANCH: &str = "main";

/// Check whether the checkout at `path` has any changes.
///
/// Staged, unstaged and untracked entries all count; the only question
/// asked is whether `git status --porcelain` prints anything.
pub fn is_worktree_dirty(git: &dyn GitExecutor, path: &Path) -> Result<bool> {
    let dir = path.to_string_lossy();
    let stdout = git.run(&["-C", &dir, "status", "--porcelain"], None)?;
    Ok(!stdout.trim().is_empty())
}

/// Get the default branch of the repository at `repo_dir`.
///
/// Resolution order, first hit wins:
/// 1. `origin/HEAD` (with the `origin/` prefix stripped)
/// 2. the currently checked out branch, unless HEAD is detached
/// 3. a local `main` branch
/// 4. a local `master` branch
/// 5. `main`
///
/// Query failures fall through to the next step, so this never fails.
pub fn detect_default_branch(git: &dyn GitExecutor, repo_dir: &Path) -> String {
    let repo = repo_dir.to_string_lossy();

    if let Ok(origin_head) = git.run(
        &[
            "-C",
            &repo,
            "symbolic-ref",
            "--quiet",
            "--short",
            "refs/remotes/origin/HEAD",
        ],
        None,
    ) {
        if let Some(branch) = origin_head.trim().strip_prefix("origin/") {
            if !branch.is_empty() {
                debug!(branch, "default branch from origin/HEAD");
                return branch.to_string();
            }
        }
    }

    if let Ok(current) = git.run(&["-C", &repo, "rev-parse", "--abbrev-ref", "HEAD"], None) {
        let current = current.trim();
        if !current.is_empty() && current != "HEAD" {
            debug!(branch = current, "default branch from current HEAD");
            return current.to_string();
        }
    }

    for candidate in ["main", "master"] {
        let ref_path = format!("refs/heads/{candidate}");
        if git.succeeds(
            &["-C", &repo, "show-ref", "--verify", "--quiet", &ref_path],
            None,
        ) {
            debug!(branch = candidate, "default branch from local branch");
            return candidate.to_string();
        }
    }

    debug!(branch = FALLBACK_BRANCH, "default branch fallback");
    FALLBACK_BRANCH.to_string()
}
