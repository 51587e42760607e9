//! Path allocation for relocated worktrees and directory-name inference

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{LayoutError, Result};

use super::entry_exists;

/// Numeric suffixes tried after the bare name before giving up
pub const MAX_SUFFIX_ATTEMPTS: u32 = 9999;

/// Name used when a worktree's own base name is unusable
const PLACEHOLDER_NAME: &str = "worktree";

/// Pick a destination `<root>/<base>` (or `<root>/<base>-N`) that is neither
/// in `used` nor present on disk.
///
/// `used` holds destinations already claimed in the current run; the caller
/// inserts the returned path once the move succeeds.
pub fn next_worktree_destination(
    root: &Path,
    base: &str,
    used: &BTreeSet<PathBuf>,
) -> Result<PathBuf> {
    let trimmed = base.trim();
    let name = match trimmed {
        "" | "." | "/" => PLACEHOLDER_NAME,
        other => other,
    };

    let candidate = root.join(name);
    if is_free(&candidate, used)? {
        return Ok(candidate);
    }

    for i in 1..=MAX_SUFFIX_ATTEMPTS {
        let candidate = root.join(format!("{name}-{i}"));
        if is_free(&candidate, used)? {
            return Ok(candidate);
        }
    }

    Err(LayoutError::NoDestination {
        base: base.to_string(),
        root: root.to_path_buf(),
    })
}

fn is_free(candidate: &Path, used: &BTreeSet<PathBuf>) -> Result<bool> {
    if used.contains(candidate) {
        return Ok(false);
    }
    Ok(!entry_exists(candidate)?)
}

/// Derive a checkout directory name from a clone URL.
///
/// `https://host/org/repo.git`, `https://host/org/repo/`,
/// `git@host:org/repo.git` and `/srv/git/repo` all yield `repo`.
pub fn infer_directory_name(repo_url: &str) -> Result<String> {
    let trimmed = repo_url.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(LayoutError::MissingUrl);
    }

    let repo_path = if let Some((_, rest)) = trimmed.split_once("://") {
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        // Drop the authority; the path starts at the first '/'
        rest.find('/').map(|idx| &rest[idx..]).unwrap_or_default()
    } else if trimmed.contains('@') && trimmed.contains(':') {
        trimmed
            .split_once(':')
            .map(|(_, path)| path)
            .unwrap_or_default()
    } else {
        trimmed
    };

    let repo_path = repo_path.trim_matches('/');
    let repo_path = repo_path.strip_suffix(".git").unwrap_or(repo_path);
    let name = repo_path.rsplit('/').next().unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        return Err(LayoutError::InferDirectory(repo_url.to_string()));
    }
    Ok(name.to_string())
}
