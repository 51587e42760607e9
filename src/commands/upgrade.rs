//! Append missing `.gitsej` keys without touching existing ones
//! Usage: gitsej upgrade [directory]

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::layout::{self, UpgradeOptions, CONFIG_FILE, GIT_LINK};

pub fn execute(directory: PathBuf, main_branch: Option<String>) -> Result<()> {
    let result = layout::upgrade(UpgradeOptions {
        directory,
        main_branch,
    })?;

    println!(
        "{} upgraded gitsej repo: {}",
        "✓".green().bold(),
        result.directory.display()
    );
    if result.created_git_link {
        println!("  created {GIT_LINK}");
    }
    if result.created_config {
        println!("  created {CONFIG_FILE}");
    }
    if result.added_keys.is_empty() && !result.created_config {
        println!("  {}", format!("{CONFIG_FILE} already up to date").dimmed());
    }
    for key in &result.added_keys {
        println!("  added key: {}", key.cyan());
    }
    Ok(())
}
