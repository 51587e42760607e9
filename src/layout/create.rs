//! Fresh layout from a remote: clone into `.bare`, then GitLink, config and
//! an optional `main` worktree.
//!
//! Creating the target directory opens the transaction. Any failure after
//! that removes the whole directory again, so a failed create leaves nothing
//! behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{LayoutError, Result};
use crate::git::GitExecutor;

use super::{
    absolute_path, branch_or_fallback, entry_exists, infer_directory_name, write_fresh_config,
    write_git_link, BARE_DIR, MAIN_WORKTREE_DIR,
};

/// Refspec restoring remote-tracking refs, which `clone --bare` does not set up
const ORIGIN_FETCH_REFSPEC: &str = "+refs/heads/*:refs/remotes/origin/*";

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub repo_url: String,
    /// Target directory; inferred from the URL when `None`
    pub directory: Option<PathBuf>,
    /// Also check out `<target>/main` tracking `origin/<branch>`
    pub main_worktree: bool,
    /// Blank means `main`
    pub main_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResult {
    pub directory: PathBuf,
    pub main_branch: String,
    pub main_worktree: Option<PathBuf>,
}

/// RAII guard that removes the target directory on drop unless disarmed.
struct CreateGuard {
    target: PathBuf,
    disarmed: bool,
}

impl CreateGuard {
    fn new(target: PathBuf) -> Self {
        Self {
            target,
            disarmed: false,
        }
    }

    fn disarm(&mut self) {
        self.disarmed = true;
    }
}

impl Drop for CreateGuard {
    fn drop(&mut self) {
        if self.disarmed {
            return;
        }
        warn!(target_dir = %self.target.display(), "create failed, removing partial layout");
        if let Err(e) = fs::remove_dir_all(&self.target) {
            warn!(target_dir = %self.target.display(), error = %e, "failed to remove partial layout");
        }
    }
}

/// Build a new layout from `opts.repo_url`.
pub fn create(git: &dyn GitExecutor, opts: CreateOptions) -> Result<CreateResult> {
    let repo_url = opts.repo_url.trim();
    if repo_url.is_empty() {
        return Err(LayoutError::MissingUrl);
    }

    let target = match opts.directory.as_deref() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from(infer_directory_name(repo_url)?),
    };
    let main_branch = branch_or_fallback(opts.main_branch.as_deref());

    if entry_exists(&target)? {
        return Err(LayoutError::TargetExists(target));
    }
    // git resolves worktree paths against its `-C` directory
    let target = absolute_path(&target)?;
    fs::create_dir_all(&target)
        .map_err(|source| LayoutError::io("create directory", &target, source))?;
    let mut guard = CreateGuard::new(target.clone());

    let bare = target.join(BARE_DIR);
    let bare_str = bare.to_string_lossy();
    info!(url = repo_url, store = %bare.display(), "cloning bare store");
    git.run(&["clone", "--bare", repo_url, &bare_str], None)?;

    git.run(
        &[
            "--git-dir",
            &bare_str,
            "config",
            "remote.origin.fetch",
            ORIGIN_FETCH_REFSPEC,
        ],
        None,
    )?;
    git.run(&["--git-dir", &bare_str, "fetch", "origin"], None)?;

    write_git_link(&target)?;
    write_fresh_config(&target, &main_branch)?;

    let main_worktree = if opts.main_worktree {
        Some(create_main_worktree(git, &target, &main_branch)?)
    } else {
        None
    };

    guard.disarm();
    info!(root = %target.display(), branch = %main_branch, "created layout");
    Ok(CreateResult {
        directory: target,
        main_branch,
        main_worktree,
    })
}

fn create_main_worktree(git: &dyn GitExecutor, root: &Path, main_branch: &str) -> Result<PathBuf> {
    let worktree = root.join(MAIN_WORKTREE_DIR);
    let root_str = root.to_string_lossy();
    let worktree_str = worktree.to_string_lossy();
    let origin_ref = format!("origin/{main_branch}");

    git.run(
        &[
            "-C",
            &root_str,
            "worktree",
            "add",
            "-B",
            main_branch,
            &worktree_str,
            &origin_ref,
        ],
        None,
    )?;

    set_upstream(git, &worktree, main_branch);
    Ok(worktree)
}

/// Point `branch` at `origin/<branch>`; a missing remote branch is not an error
pub(crate) fn set_upstream(git: &dyn GitExecutor, worktree: &Path, branch: &str) {
    let worktree_str = worktree.to_string_lossy();
    let origin_ref = format!("origin/{branch}");
    if let Err(e) = git.run(
        &[
            "-C",
            &worktree_str,
            "branch",
            "--set-upstream-to",
            &origin_ref,
            branch,
        ],
        None,
    ) {
        warn!(worktree = %worktree.display(), error = %e, "could not set upstream tracking");
    }
}
