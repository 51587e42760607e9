//! Completion scripts for `gitsej completions <shell>`
//!
//! The script is printed to stdout; install it where the shell looks for
//! completions, e.g. `gitsej completions bash > ~/.local/share/bash-completion/completions/gitsej`.

use anyhow::{anyhow, Result};
use clap::Command;
use clap_complete::generate;
use std::io::Write;
use std::str::FromStr;

/// Shells gitsej can emit completions for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl FromStr for Shell {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            _ => Err(anyhow!(
                "Unsupported shell: {s}. Supported shells: bash, zsh, fish"
            )),
        }
    }
}

impl From<Shell> for clap_complete::Shell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
        }
    }
}

/// Write the completion script for the `gitsej` command tree to `out`.
///
/// Covers the create form (`gitsej <repo-url>`) as well as every subcommand.
pub fn generate_completions(cmd: &mut Command, shell: Shell, out: &mut dyn Write) {
    let bin_name = cmd.get_name().to_string();
    generate(clap_complete::Shell::from(shell), cmd, bin_name, out);
}
