//! Convert a standard checkout into the bare-store layout
//! Usage: gitsej migrate [-y|--yes] [directory]

use anyhow::{bail, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::LayoutError;
use crate::git::GitExecutor;
use crate::layout::{self, MigrateOptions, MigrateResult};

pub fn execute(
    git: &dyn GitExecutor,
    directory: PathBuf,
    main_branch: Option<String>,
    yes: bool,
) -> Result<()> {
    let opts = MigrateOptions {
        directory,
        main_branch,
        force: yes,
    };

    let result = match layout::migrate(git, opts.clone()) {
        Ok(result) => result,
        Err(LayoutError::DirtyWorktree { path }) => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut out = io::stdout();
            if !confirm_cleanup(&mut input, &mut out, &path)? {
                bail!("migration canceled");
            }
            layout::migrate(
                git,
                MigrateOptions {
                    force: true,
                    ..opts
                },
            )?
        }
        Err(e) => return Err(e.into()),
    };

    print_summary(&result);
    Ok(())
}

/// Ask whether a dirty checkout may be discarded. Only `y`/`yes` accepts.
pub fn confirm_cleanup(input: &mut dyn BufRead, out: &mut dyn Write, path: &Path) -> Result<bool> {
    write!(
        out,
        "{} main worktree is dirty and will be cleaned during migration: {}\ncontinue? [y/N]: ",
        "⚠".yellow().bold(),
        path.display()
    )?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn print_summary(result: &MigrateResult) {
    println!(
        "{} migrated gitsej repo: {}",
        "✓".green().bold(),
        result.directory.display()
    );
    println!(
        "  main worktree: {} {}",
        result.main_worktree.display(),
        format!("({})", result.main_branch).dimmed()
    );
    if result.created_config {
        println!("  created {}", layout::CONFIG_FILE);
    }
    for moved in &result.relocations {
        println!(
            "  moved worktree: {} -> {}",
            moved.from.display().to_string().dimmed(),
            moved.to.display()
        );
    }
}
