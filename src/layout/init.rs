//! `init` and `upgrade` for roots that already hold a `.bare` store

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{LayoutError, Result};

use super::config::merge_missing_keys;
use super::{
    absolute_path, branch_or_fallback, directory_or_cwd, entry_exists, require_bare_store,
    write_fresh_config, write_git_link, CONFIG_FILE, GIT_LINK,
};

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub directory: PathBuf,
    /// Seeds `main_branch` in a newly written config; blank means `main`
    pub main_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitResult {
    pub directory: PathBuf,
    pub created_git_link: bool,
    pub created_config: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpgradeOptions {
    pub directory: PathBuf,
    /// Value for `main_branch` if that key has to be added; blank means `main`
    pub main_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeResult {
    pub directory: PathBuf,
    pub created_git_link: bool,
    pub created_config: bool,
    /// Keys appended to an existing config, in canonical order
    pub added_keys: Vec<String>,
}

/// Ensure the GitLink and `.gitsej` exist, creating whichever is missing.
///
/// Existing files are left exactly as they are.
pub fn init(opts: InitOptions) -> Result<InitResult> {
    let root = absolute_path(&directory_or_cwd(&opts.directory))?;
    let main_branch = branch_or_fallback(opts.main_branch.as_deref());
    require_bare_store(&root)?;

    let created_git_link = ensure_git_link(&root)?;
    let created_config = if entry_exists(&root.join(CONFIG_FILE))? {
        false
    } else {
        write_fresh_config(&root, &main_branch)?;
        info!(root = %root.display(), "created {CONFIG_FILE}");
        true
    };

    Ok(InitResult {
        directory: root,
        created_git_link,
        created_config,
    })
}

/// Bring an existing layout up to date.
///
/// Creates a missing GitLink or config like [`init`]; otherwise appends any
/// canonical keys the config lacks without touching what is already there.
pub fn upgrade(opts: UpgradeOptions) -> Result<UpgradeResult> {
    let root = absolute_path(&directory_or_cwd(&opts.directory))?;
    let main_branch = branch_or_fallback(opts.main_branch.as_deref());
    require_bare_store(&root)?;

    let mut result = UpgradeResult {
        directory: root.clone(),
        created_git_link: ensure_git_link(&root)?,
        created_config: false,
        added_keys: Vec::new(),
    };

    let config_path = root.join(CONFIG_FILE);
    if !entry_exists(&config_path)? {
        write_fresh_config(&root, &main_branch)?;
        info!(root = %root.display(), "created {CONFIG_FILE}");
        result.created_config = true;
        return Ok(result);
    }

    let content = fs::read_to_string(&config_path)
        .map_err(|source| LayoutError::io("read", &config_path, source))?;
    let merge = merge_missing_keys(&content, &main_branch);
    if merge.added_keys.is_empty() {
        debug!(path = %config_path.display(), "config already up to date");
        return Ok(result);
    }

    fs::write(&config_path, &merge.content)
        .map_err(|source| LayoutError::io("write", &config_path, source))?;
    info!(
        path = %config_path.display(),
        keys = %merge.added_keys.join(","),
        "appended missing config keys"
    );
    result.added_keys = merge.added_keys;
    Ok(result)
}

fn ensure_git_link(root: &std::path::Path) -> Result<bool> {
    if entry_exists(&root.join(GIT_LINK))? {
        return Ok(false);
    }
    write_git_link(root)?;
    info!(root = %root.display(), "created {GIT_LINK}");
    Ok(true)
}
