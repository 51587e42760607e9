//! In-place conversion of a standard checkout into the bare-store layout
//!
//! The conversion is a fixed sequence of [`MigrationStep`]s. A failing step
//! aborts the run immediately and nothing is rolled back; the error names the
//! failing step and the last one that completed, and
//! [`MigrationStep::leaves_behind`] describes what is on disk at that point so
//! an operator can finish or undo the conversion by hand.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{LayoutError, Result};
use crate::git::{detect_default_branch, is_worktree_dirty, list_worktrees, GitExecutor, WorktreeInfo};

use super::create::set_upstream;
use super::{
    absolute_path, canonical_path, directory_or_cwd, entry_exists, next_worktree_destination,
    write_fresh_config, write_git_link, BARE_DIR, CONFIG_FILE, GIT_LINK, MAIN_WORKTREE_DIR,
};

/// Root entries that survive [`MigrationStep::CleanRoot`]
const KEEP_ENTRIES: [&str; 3] = [BARE_DIR, GIT_LINK, CONFIG_FILE];

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    pub directory: PathBuf,
    /// Branch for the `main` worktree; detected when `None` or blank
    pub main_branch: Option<String>,
    /// Proceed even though the checkout has uncommitted changes
    pub force: bool,
}

/// One relocated worktree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateResult {
    pub directory: PathBuf,
    pub main_branch: String,
    pub created_config: bool,
    /// Final destinations of relocated worktrees, sorted
    pub moved_worktrees: Vec<PathBuf>,
    /// Relocations in the order they were performed
    pub relocations: Vec<WorktreeMove>,
    pub main_worktree: PathBuf,
    /// Names removed from the root, sorted
    pub removed_entries: Vec<String>,
}

/// Ordered steps of a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MigrationStep {
    Validate,
    Discover,
    DetectDirty,
    DetermineBranch,
    ConvertStore,
    SyncConfig,
    RepairWorktrees,
    CleanRoot,
    CreateMainWorktree,
    RelocateWorktrees,
}

impl MigrationStep {
    pub fn name(self) -> &'static str {
        match self {
            MigrationStep::Validate => "validate",
            MigrationStep::Discover => "discover",
            MigrationStep::DetectDirty => "detect-dirty",
            MigrationStep::DetermineBranch => "determine-branch",
            MigrationStep::ConvertStore => "convert-store",
            MigrationStep::SyncConfig => "sync-config",
            MigrationStep::RepairWorktrees => "repair-worktrees",
            MigrationStep::CleanRoot => "clean-root",
            MigrationStep::CreateMainWorktree => "create-main-worktree",
            MigrationStep::RelocateWorktrees => "relocate-worktrees",
        }
    }

    /// On-disk state once this step has completed
    pub fn leaves_behind(self) -> &'static str {
        match self {
            MigrationStep::Validate
            | MigrationStep::Discover
            | MigrationStep::DetectDirty
            | MigrationStep::DetermineBranch => "repository untouched",
            MigrationStep::ConvertStore => {
                ".git renamed to .bare and marked bare, .git is now a gitdir file; \
                 working files still in the root, sibling worktrees not yet repaired"
            }
            MigrationStep::SyncConfig => {
                "store converted and .gitsej present; sibling worktrees not yet repaired"
            }
            MigrationStep::RepairWorktrees => {
                "store converted, sibling worktrees point at .bare; old working files still in the root"
            }
            MigrationStep::CleanRoot => {
                "root holds only .bare, .git and .gitsej; no main worktree yet"
            }
            MigrationStep::CreateMainWorktree => {
                "main worktree checked out; sibling worktrees still at their old paths"
            }
            MigrationStep::RelocateWorktrees => "migration complete",
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks the last completed step and wraps failures with it
struct StepTracker {
    root: PathBuf,
    completed: Option<MigrationStep>,
}

impl StepTracker {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            completed: None,
        }
    }

    fn run<T>(&mut self, step: MigrationStep, f: impl FnOnce() -> Result<T>) -> Result<T> {
        debug!(step = %step, "migration step started");
        match f() {
            Ok(value) => {
                self.completed = Some(step);
                info!(step = %step, root = %self.root.display(), "migration step completed");
                Ok(value)
            }
            Err(source) => {
                warn!(
                    step = %step,
                    completed = ?self.completed.map(MigrationStep::name),
                    error = %source,
                    "migration step failed"
                );
                Err(LayoutError::Migration {
                    root: self.root.clone(),
                    step,
                    completed: self.completed,
                    source: Box::new(source),
                })
            }
        }
    }
}

/// Convert the standard checkout at `opts.directory` into the layout.
///
/// Returns [`LayoutError::DirtyWorktree`] without touching anything when the
/// checkout has changes and `opts.force` is not set. With `force`, those
/// changes are discarded along with the rest of the old working tree.
pub fn migrate(git: &dyn GitExecutor, opts: MigrateOptions) -> Result<MigrateResult> {
    let root = absolute_path(&directory_or_cwd(&opts.directory))?;
    validate(&root)?;
    let canonical_root = canonical_path(&root);
    let bare = root.join(BARE_DIR);
    let git_path = root.join(GIT_LINK);

    let mut steps = StepTracker::new(root.clone());
    steps.completed = Some(MigrationStep::Validate);

    let worktrees = steps.run(MigrationStep::Discover, || list_worktrees(git, &root))?;

    let dirty = steps.run(MigrationStep::DetectDirty, || is_worktree_dirty(git, &root))?;
    if dirty && !opts.force {
        info!(root = %root.display(), "checkout is dirty, confirmation required");
        return Err(LayoutError::DirtyWorktree { path: root });
    }

    let main_branch = steps.run(MigrationStep::DetermineBranch, || {
        Ok(match opts.main_branch.as_deref().map(str::trim) {
            Some(branch) if !branch.is_empty() => branch.to_string(),
            _ => detect_default_branch(git, &root),
        })
    })?;

    steps.run(MigrationStep::ConvertStore, || {
        convert_store(git, &git_path, &bare)
    })?;

    let created_config = steps.run(MigrationStep::SyncConfig, || {
        if entry_exists(&root.join(CONFIG_FILE))? {
            return Ok(false);
        }
        write_fresh_config(&root, &main_branch)?;
        Ok(true)
    })?;

    // Worktrees other than the checkout being converted
    let foreign: Vec<&WorktreeInfo> = worktrees
        .iter()
        .filter(|wt| !wt.bare && canonical_path(&wt.path) != canonical_root)
        .collect();

    steps.run(MigrationStep::RepairWorktrees, || {
        repair_worktrees(git, &bare, &foreign);
        Ok(())
    })?;

    let removed_entries = steps.run(MigrationStep::CleanRoot, || clean_root(&root))?;

    let main_worktree = root.join(MAIN_WORKTREE_DIR);
    steps.run(MigrationStep::CreateMainWorktree, || {
        let bare_str = bare.to_string_lossy();
        let main_str = main_worktree.to_string_lossy();
        git.run(
            &[
                "--git-dir",
                &bare_str,
                "worktree",
                "add",
                "--force",
                &main_str,
                &main_branch,
            ],
            None,
        )?;
        set_upstream(git, &main_worktree, &main_branch);
        Ok(())
    })?;

    let relocations = steps.run(MigrationStep::RelocateWorktrees, || {
        relocate_worktrees(git, &root, &canonical_root, &bare, &main_worktree, &foreign)
    })?;

    let mut moved_worktrees: Vec<PathBuf> = relocations.iter().map(|m| m.to.clone()).collect();
    moved_worktrees.sort();

    info!(
        root = %root.display(),
        branch = %main_branch,
        moved = relocations.len(),
        "migration complete"
    );
    Ok(MigrateResult {
        directory: root,
        main_branch,
        created_config,
        moved_worktrees,
        relocations,
        main_worktree,
        removed_entries,
    })
}

fn validate(root: &Path) -> Result<()> {
    super::require_directory(root)?;

    let git_path = root.join(GIT_LINK);
    match fs::metadata(&git_path) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(LayoutError::GitDirNotDirectory(root.to_path_buf())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(LayoutError::MissingGitDir(root.to_path_buf()))
        }
        Err(source) => return Err(LayoutError::io("check", git_path, source)),
    }

    if entry_exists(&root.join(BARE_DIR))? {
        return Err(LayoutError::AlreadyMigrated(root.to_path_buf()));
    }
    Ok(())
}

fn convert_store(git: &dyn GitExecutor, git_path: &Path, bare: &Path) -> Result<()> {
    fs::rename(git_path, bare).map_err(|source| LayoutError::io("move .git to", bare, source))?;
    let root = git_path.parent().unwrap_or(Path::new("."));
    write_git_link(root)?;

    let bare_str = bare.to_string_lossy();
    git.run(&["--git-dir", &bare_str, "config", "core.bare", "true"], None)?;
    // A standard clone normally has no core.worktree; unsetting a missing key fails
    if let Err(e) = git.run(
        &["--git-dir", &bare_str, "config", "--unset", "core.worktree"],
        None,
    ) {
        debug!(error = %e, "core.worktree not unset");
    }
    Ok(())
}

fn repair_worktrees(git: &dyn GitExecutor, bare: &Path, worktrees: &[&WorktreeInfo]) {
    let bare_str = bare.to_string_lossy();
    for wt in worktrees {
        if !wt.path.exists() {
            debug!(worktree = %wt.path.display(), "skipping repair of missing worktree");
            continue;
        }
        let path_str = wt.path.to_string_lossy();
        if let Err(e) = git.run(&["--git-dir", &bare_str, "worktree", "repair", &path_str], None) {
            warn!(worktree = %wt.path.display(), error = %e, "worktree repair failed");
        }
    }
}

/// Remove every root entry except the store, GitLink and config.
fn clean_root(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root).map_err(|source| LayoutError::io("read directory", root, source))?;

    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LayoutError::io("read directory", root, source))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if KEEP_ENTRIES.contains(&name.as_str()) {
            continue;
        }

        let path = entry.path();
        let is_dir = entry
            .file_type()
            .map_err(|source| LayoutError::io("check", &path, source))?
            .is_dir();
        let outcome = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        outcome.map_err(|source| LayoutError::io("remove", &path, source))?;
        debug!(entry = %name, "removed root entry");
        removed.push(name);
    }

    removed.sort();
    Ok(removed)
}

fn relocate_worktrees(
    git: &dyn GitExecutor,
    root: &Path,
    canonical_root: &Path,
    bare: &Path,
    main_worktree: &Path,
    worktrees: &[&WorktreeInfo],
) -> Result<Vec<WorktreeMove>> {
    let bare_str = bare.to_string_lossy();
    let mut used: BTreeSet<PathBuf> = BTreeSet::new();
    used.insert(main_worktree.to_path_buf());

    let mut moves = Vec::new();
    for wt in worktrees {
        if canonical_path(&wt.path).starts_with(canonical_root) {
            debug!(worktree = %wt.path.display(), "already under root, not moving");
            continue;
        }
        if !wt.path.exists() {
            debug!(worktree = %wt.path.display(), "skipping missing worktree");
            continue;
        }

        let base = wt
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let dest = next_worktree_destination(root, &base, &used)?;

        let from_str = wt.path.to_string_lossy();
        let dest_str = dest.to_string_lossy();
        git.run(
            &["--git-dir", &bare_str, "worktree", "move", &from_str, &dest_str],
            None,
        )?;
        info!(from = %wt.path.display(), to = %dest.display(), "moved worktree");

        used.insert(dest.clone());
        moves.push(WorktreeMove {
            from: wt.path.clone(),
            to: dest,
        });
    }
    Ok(moves)
}
