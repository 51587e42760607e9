//! Git-related test helpers

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git in `dir`, failing on a non-zero exit
pub fn git(dir: &Path, args: &[&str]) -> Result<()> {
    git_output(dir, args).map(|_| ())
}

/// Run git in `dir` and return trimmed stdout
pub fn git_output(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;
    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Initialize a standard repository at `dir` on branch `main` with one commit
pub fn init_repo(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).context("Failed to create repository directory")?;
    git(dir, &["init", "--quiet"])?;
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
    git(dir, &["config", "user.email", "test@test.com"])?;
    git(dir, &["config", "user.name", "Test User"])?;
    git(dir, &["config", "commit.gpgsign", "false"])?;
    commit_file(dir, "README.md", "# Test Repository\n", "Initial commit")
}

/// Creates a temporary directory holding a standard repository at `<tmp>/repo`
///
/// Returns the TempDir, which must be kept in scope for the lifetime of the
/// test, and the canonical repository path.
pub fn create_temp_git_repo() -> Result<(TempDir, PathBuf)> {
    let temp = TempDir::new().context("Failed to create temp directory")?;
    let base = std::fs::canonicalize(temp.path()).context("Failed to resolve temp directory")?;
    let repo = base.join("repo");
    init_repo(&repo)?;
    Ok((temp, repo))
}

/// Write `name` in `dir` and commit it
pub fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> Result<()> {
    std::fs::write(dir.join(name), content).with_context(|| format!("Failed to write {name}"))?;
    git(dir, &["add", name])?;
    git(dir, &["commit", "--quiet", "-m", message])
}

/// Add a linked worktree at `path` on a new branch
pub fn add_worktree(repo: &Path, path: &Path, branch: &str) -> Result<()> {
    let path_str = path.to_string_lossy();
    git(repo, &["worktree", "add", "--quiet", "-b", branch, &path_str])
}

pub fn current_branch(dir: &Path) -> Result<String> {
    git_output(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
}

/// Paths of the non-bare worktrees git knows about, canonicalized and sorted
pub fn worktree_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let listing = git_output(dir, &["worktree", "list", "--porcelain"])?;
    let mut paths = Vec::new();
    let mut current: Option<PathBuf> = None;
    for line in listing.lines().chain(std::iter::once("")) {
        if let Some(path) = line.strip_prefix("worktree ") {
            current = Some(PathBuf::from(path));
        } else if line == "bare" {
            current = None;
        } else if line.is_empty() {
            if let Some(path) = current.take() {
                paths.push(std::fs::canonicalize(&path).unwrap_or(path));
            }
        }
    }
    paths.sort();
    Ok(paths)
}
