//! Git command runner abstraction
//!
//! Every interaction with git goes through [`GitExecutor`]: an argument list
//! plus an optional working directory in, captured output and exit status
//! out. [`GitCli`] is the subprocess implementation; tests substitute a
//! scripted executor.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, trace};
use wait_timeout::ChildExt;

use crate::error::{LayoutError, Result};

/// How often a running git process is checked for cancellation
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Timeout for collecting output from child process pipes once the child has exited
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured result of one git invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout followed by stderr, used for error messages
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        if !combined.is_empty() && !combined.ends_with('\n') && !self.stderr.is_empty() {
            combined.push('\n');
        }
        combined.push_str(&self.stderr);
        combined
    }
}

/// The single integration point with the version-control tool.
pub trait GitExecutor {
    /// Run git with `args`, optionally inside `working_dir`.
    ///
    /// A non-zero exit is not an error at this level; only failing to run
    /// the tool at all (or cancellation) is.
    fn execute(&self, args: &[&str], working_dir: Option<&Path>) -> Result<GitOutput>;

    /// Run git, require success, and return stdout.
    fn run(&self, args: &[&str], working_dir: Option<&Path>) -> Result<String> {
        let output = self.execute(args, working_dir)?;
        if !output.success() {
            return Err(LayoutError::Git {
                command: render_command(args),
                status: output.status,
                output: output.combined(),
            });
        }
        Ok(output.stdout)
    }

    /// Run git and report whether it exited successfully.
    ///
    /// Swallows every failure, including failing to spawn.
    fn succeeds(&self, args: &[&str], working_dir: Option<&Path>) -> bool {
        self.execute(args, working_dir)
            .map(|output| output.success())
            .unwrap_or(false)
    }
}

/// Render an argument list as a copy-pasteable shell command
pub fn render_command(args: &[&str]) -> String {
    let mut rendered = String::from("git");
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&shell_escape::escape((*arg).into()));
    }
    rendered
}

/// Shared cancellation flag.
///
/// Cloning shares the flag; cancelling any clone kills the git process
/// currently running under any [`GitCli`] holding it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs the real `git` binary as a subprocess
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    cancel: CancelToken,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
            cancel: CancelToken::new(),
        }
    }

    /// Use an explicit git binary instead of resolving `git` from PATH at spawn time
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn spawn(&self, args: &[&str], working_dir: Option<&Path>) -> Result<Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        cmd.spawn()
            .map_err(|source| LayoutError::io("execute", self.program.clone(), source))
    }
}

impl GitExecutor for GitCli {
    fn execute(&self, args: &[&str], working_dir: Option<&Path>) -> Result<GitOutput> {
        if self.cancel.is_cancelled() {
            return Err(LayoutError::Cancelled {
                command: render_command(args),
            });
        }

        trace!(command = %render_command(args), dir = ?working_dir, "running git");
        let mut child = self.spawn(args, working_dir)?;

        // Drain both pipes while waiting, a full pipe buffer would block the child.
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let status = loop {
            let waited = child
                .wait_timeout(CANCEL_POLL_INTERVAL)
                .map_err(|source| LayoutError::io("wait for", self.program.clone(), source))?;
            if let Some(status) = waited {
                break status;
            }
            if self.cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                debug!(command = %render_command(args), "git cancelled");
                return Err(LayoutError::Cancelled {
                    command: render_command(args),
                });
            }
        };

        let stdout = stdout_rx
            .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
            .unwrap_or_default();
        let stderr = stderr_rx
            .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
            .unwrap_or_default();

        Ok(GitOutput {
            stdout,
            stderr,
            status: status.code(),
        })
    }
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(mut stream) => {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stream.read_to_end(&mut buf);
                let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

/// Check that a git binary is reachable on PATH
pub fn check_git_available() -> anyhow::Result<PathBuf> {
    which::which("git").context("Git is not installed or not in PATH")
}
