//! Create a fresh layout from a remote
//! Usage: gitsej [--main-worktree] [--main-branch <branch>] <repo-url> [directory]

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::git::GitExecutor;
use crate::layout::{self, CreateOptions};

pub fn execute(
    git: &dyn GitExecutor,
    repo_url: String,
    directory: Option<PathBuf>,
    main_worktree: bool,
    main_branch: Option<String>,
) -> Result<()> {
    let result = layout::create(
        git,
        CreateOptions {
            repo_url: repo_url.clone(),
            directory,
            main_worktree,
            main_branch,
        },
    )
    .with_context(|| format!("Failed to create layout from {repo_url}"))?;

    println!(
        "{} created gitsej repo: {}",
        "✓".green().bold(),
        result.directory.display()
    );
    if let Some(main) = result.main_worktree {
        println!(
            "  main worktree: {} {}",
            main.display(),
            format!("({})", result.main_branch).dimmed()
        );
    }
    Ok(())
}
