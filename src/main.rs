use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use gitsej::commands::{create, init, migrate, upgrade};
use gitsej::completions::{generate_completions, Shell};
use gitsej::git::{check_git_available, CancelToken, GitCli};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitsej")]
#[command(about = "Bare-store repository layouts with one worktree per branch", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Repository to clone into a new layout
    repo_url: Option<String>,

    /// Target directory (defaults to the repository name)
    directory: Option<PathBuf>,

    /// Also check out a `main` worktree tracking origin/<branch>
    #[arg(long, env = "GITSEJ_MAIN_WORKTREE")]
    main_worktree: bool,

    /// Main branch to check out (defaults to "main")
    #[arg(long, env = "GITSEJ_MAIN_BRANCH")]
    main_branch: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add .git and .gitsej next to an existing .bare store
    Init {
        /// Repository root (defaults to the current directory)
        directory: Option<PathBuf>,

        /// Branch written to a new .gitsej (defaults to "main")
        #[arg(long, env = "GITSEJ_MAIN_BRANCH")]
        main_branch: Option<String>,
    },

    /// Convert a standard checkout into the bare-store layout
    Migrate {
        /// Discard uncommitted changes without asking
        #[arg(short, long)]
        yes: bool,

        /// Checkout to convert (defaults to the current directory)
        directory: Option<PathBuf>,

        /// Branch for the main worktree; detected from the checkout when omitted.
        /// GITSEJ_MAIN_BRANCH does not apply to migrate.
        #[arg(long)]
        main_branch: Option<String>,
    },

    /// Append missing keys to .gitsej, creating .git/.gitsej if absent
    Upgrade {
        /// Repository root (defaults to the current directory)
        directory: Option<PathBuf>,

        /// Value for main_branch if that key is missing (defaults to "main")
        #[arg(long, env = "GITSEJ_MAIN_BRANCH")]
        main_branch: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish)
        shell: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("GITSEJ_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Git runner whose child process is killed on Ctrl+C.
///
/// The first interrupt cancels the running git command so the engine can
/// unwind; a second one exits immediately.
fn git_cli() -> Result<GitCli> {
    let program = check_git_available()?;
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            std::process::exit(130);
        }
        handler_token.cancel();
    }) {
        warn!(error = %e, "failed to set Ctrl+C handler");
    }
    Ok(GitCli::new().with_program(program).with_cancel_token(cancel))
}

fn non_blank(branch: Option<String>) -> Option<String> {
    branch.filter(|b| !b.trim().is_empty())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Init {
            directory,
            main_branch,
        }) => init::execute(directory.unwrap_or_default(), non_blank(main_branch)),
        Some(Commands::Upgrade {
            directory,
            main_branch,
        }) => upgrade::execute(directory.unwrap_or_default(), non_blank(main_branch)),
        Some(Commands::Migrate {
            yes,
            directory,
            main_branch,
        }) => migrate::execute(
            &git_cli()?,
            directory.unwrap_or_default(),
            non_blank(main_branch),
            yes,
        ),
        Some(Commands::Completions { shell }) => {
            let shell = Shell::from_str(&shell)?;
            let mut cmd = Cli::command();
            let mut stdout = std::io::stdout();
            generate_completions(&mut cmd, shell, &mut stdout);
            Ok(())
        }
        None => {
            let Some(repo_url) = cli.repo_url else {
                Cli::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "a repository URL or a subcommand is required",
                    )
                    .exit();
            };
            create::execute(
                &git_cli()?,
                repo_url,
                cli.directory,
                cli.main_worktree,
                non_blank(cli.main_branch),
            )
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
