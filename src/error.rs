//! Error taxonomy for the layout engine
//!
//! Everything the engine can fail with is a [`LayoutError`]. Only
//! [`LayoutError::DirtyWorktree`] is meant to be inspected and retried by a
//! caller; every other variant aborts the operation.

use std::io;
use std::path::{Path, PathBuf};

use crate::layout::MigrationStep;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("repo URL is required")]
    MissingUrl,

    #[error("cannot infer directory name from {0:?}")]
    InferDirectory(String),

    #[error("directory already exists: {}", .0.display())]
    TargetExists(PathBuf),

    #[error("directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("missing .git in {}", .0.display())]
    MissingGitDir(PathBuf),

    #[error(".git is not a directory in {}; expected standard clone", .0.display())]
    GitDirNotDirectory(PathBuf),

    #[error(".bare already exists in {}; use `gitsej init` instead", .0.display())]
    AlreadyMigrated(PathBuf),

    #[error("missing .bare directory in {}", .0.display())]
    MissingBareStore(PathBuf),

    #[error(".bare is not a directory in {}", .0.display())]
    BareStoreNotDirectory(PathBuf),

    #[error("main worktree has uncommitted changes and will be cleaned: {}", .path.display())]
    DirtyWorktree { path: PathBuf },

    #[error("unable to find destination for worktree {base:?} under {}", .root.display())]
    NoDestination { base: String, root: PathBuf },

    #[error("{command} failed{}{}", exit_suffix(.status), output_suffix(.output))]
    Git {
        command: String,
        status: Option<i32>,
        output: String,
    },

    #[error("{command} was cancelled")]
    Cancelled { command: String },

    #[error("failed to {action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "migration of {} failed during {step} ({})",
        .root.display(),
        completed_summary(.completed)
    )]
    Migration {
        root: PathBuf,
        step: MigrationStep,
        completed: Option<MigrationStep>,
        #[source]
        source: Box<LayoutError>,
    },
}

pub type Result<T> = std::result::Result<T, LayoutError>;

impl LayoutError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Path of the dirty checkout when this is the recoverable dirty-state signal.
    pub fn dirty_path(&self) -> Option<&Path> {
        match self {
            Self::DirtyWorktree { path } => Some(path),
            _ => None,
        }
    }

    pub fn is_dirty_worktree(&self) -> bool {
        self.dirty_path().is_some()
    }
}

fn exit_suffix(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!(" (exit status {code})"),
        None => " (terminated by signal)".to_string(),
    }
}

fn output_suffix(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

fn completed_summary(completed: &Option<MigrationStep>) -> String {
    match completed {
        Some(step) => format!("last completed step: {step}; {}", step.leaves_behind()),
        None => "no step completed; repository untouched".to_string(),
    }
}
