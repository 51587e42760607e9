//! The bare-store layout and the operations that produce it
//!
//! A managed root looks like:
//!
//! ```text
//! <root>/
//!   .bare/      object and ref database, never a checkout
//!   .git        "gitdir: ./.bare\n", so tooling run anywhere under <root> finds the store
//!   .gitsej     key=value configuration
//!   main/       linked worktree for the main branch
//!   <other>/    further linked worktrees
//! ```
//!
//! ## Module structure
//!
//! - `paths`: destination allocation and directory-name inference
//! - `config`: `.gitsej` content and the append-only key merge
//! - `init`: `init` and `upgrade` for already bare-structured roots
//! - `create`: fresh layout from a remote, all-or-nothing
//! - `migrate`: in-place conversion of a standard checkout

mod config;
mod create;
mod init;
mod migrate;
mod paths;

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{LayoutError, Result};
use crate::git::FALLBACK_BRANCH;

pub use config::{
    config_content, merge_missing_keys, missing_default_lines, parse_config_keys, ConfigMerge,
    CANONICAL_KEYS, UPGRADE_MARKER,
};
pub use create::{create, CreateOptions, CreateResult};
pub use init::{init, upgrade, InitOptions, InitResult, UpgradeOptions, UpgradeResult};
pub use migrate::{migrate, MigrateOptions, MigrateResult, MigrationStep, WorktreeMove};
pub use paths::{infer_directory_name, next_worktree_destination, MAX_SUFFIX_ATTEMPTS};

/// Directory holding the shared store
pub const BARE_DIR: &str = ".bare";

/// Pointer file redirecting tooling to [`BARE_DIR`]
pub const GIT_LINK: &str = ".git";

/// Per-repository configuration file
pub const CONFIG_FILE: &str = ".gitsej";

/// Directory name of the main linked worktree
pub const MAIN_WORKTREE_DIR: &str = "main";

/// Exact GitLink content; some consumers compare it byte for byte
pub const GIT_LINK_CONTENT: &str = "gitdir: ./.bare\n";

/// Make `path` absolute against the process working directory and remove
/// `.` and `..` components lexically.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir()
            .map_err(|source| LayoutError::io("resolve path", path, source))?;
        cwd.join(path)
    };
    Ok(normalize(&joined))
}

/// Absolute path with symlinks resolved.
///
/// Falls back to the lexically normalized absolute path when the path does
/// not exist or cannot be resolved, so two spellings of a missing path still
/// compare equal.
pub fn canonical_path(path: &Path) -> PathBuf {
    let Ok(abs) = absolute_path(path) else {
        return normalize(path);
    };
    fs::canonicalize(&abs).unwrap_or(abs)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Whether anything (file, directory or dangling symlink) exists at `path`
pub(crate) fn entry_exists(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(LayoutError::io("check", path, source)),
    }
}

pub(crate) fn require_directory(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(LayoutError::NotADirectory(path.to_path_buf())),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(LayoutError::MissingDirectory(path.to_path_buf()))
        }
        Err(source) => Err(LayoutError::io("check directory", path, source)),
    }
}

/// `root` must exist and hold a `.bare` directory
pub(crate) fn require_bare_store(root: &Path) -> Result<()> {
    require_directory(root)?;
    let bare = root.join(BARE_DIR);
    match fs::metadata(&bare) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(LayoutError::BareStoreNotDirectory(root.to_path_buf())),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(LayoutError::MissingBareStore(root.to_path_buf()))
        }
        Err(source) => Err(LayoutError::io("check", bare, source)),
    }
}

pub(crate) fn write_git_link(root: &Path) -> Result<()> {
    let path = root.join(GIT_LINK);
    fs::write(&path, GIT_LINK_CONTENT).map_err(|source| LayoutError::io("write", path, source))
}

pub(crate) fn write_fresh_config(root: &Path, main_branch: &str) -> Result<()> {
    let path = root.join(CONFIG_FILE);
    fs::write(&path, config_content(main_branch))
        .map_err(|source| LayoutError::io("write", path, source))
}

/// Caller-supplied branch if it has content, otherwise [`FALLBACK_BRANCH`]
pub(crate) fn branch_or_fallback(branch: Option<&str>) -> String {
    branch
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(FALLBACK_BRANCH)
        .to_string()
}

/// Empty paths mean the current directory
pub(crate) fn directory_or_cwd(dir: &Path) -> PathBuf {
    if dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        dir.to_path_buf()
    }
}
