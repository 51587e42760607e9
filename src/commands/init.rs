//! Initialize `.git` and `.gitsej` next to an existing `.bare` store
//! Usage: gitsej init [directory]

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::layout::{self, InitOptions, InitResult, CONFIG_FILE, GIT_LINK};

pub fn execute(directory: PathBuf, main_branch: Option<String>) -> Result<()> {
    let result = layout::init(InitOptions {
        directory,
        main_branch,
    })?;
    println!("{} {}", "✓".green().bold(), summary(&result));
    Ok(())
}

/// One-line description of what init did
pub fn summary(result: &InitResult) -> String {
    let mut created = Vec::new();
    if result.created_git_link {
        created.push(GIT_LINK);
    }
    if result.created_config {
        created.push(CONFIG_FILE);
    }

    if created.is_empty() {
        format!(
            "initialized gitsej repo: {} (no changes)",
            result.directory.display()
        )
    } else {
        format!(
            "initialized gitsej repo: {} (created {})",
            result.directory.display(),
            created.join(", ")
        )
    }
}
