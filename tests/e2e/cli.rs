//! E2E tests for the `gitsej` binary

use super::helpers::*;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn gitsej(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gitsej").unwrap();
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("GITSEJ_MAIN_BRANCH")
        .env_remove("GITSEJ_MAIN_WORKTREE");
    cmd
}

#[test]
fn test_no_arguments_is_a_usage_error() {
    let (_temp, repo) = create_temp_git_repo().unwrap();
    gitsej(&repo).assert().code(2);
}

#[test]
fn test_migrate_declined_prompt_cancels() {
    let (_temp, repo) = create_temp_git_repo().unwrap();
    fs::write(repo.join("notes.txt"), "wip\n").unwrap();

    gitsej(&repo)
        .args(["migrate", "."])
        .write_stdin("n\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("continue? [y/N]: "))
        .stderr(predicate::str::contains("migration canceled"));

    assert!(repo.join(".git").is_dir());
    assert!(repo.join("notes.txt").exists());
}

#[test]
fn test_migrate_accepted_prompt_converts() {
    let (_temp, repo) = create_temp_git_repo().unwrap();
    fs::write(repo.join("notes.txt"), "wip\n").unwrap();

    gitsej(&repo)
        .arg("migrate")
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrated gitsej repo:"));

    assert!(repo.join(".bare").is_dir());
    assert!(!repo.join("notes.txt").exists());
    assert_eq!(current_branch(&repo.join("main")).unwrap(), "main");
}

#[test]
fn test_migrate_yes_skips_prompt_and_reports_moves() {
    let (_temp, repo) = create_temp_git_repo().unwrap();
    let feature = repo.parent().unwrap().join("feature");
    add_worktree(&repo, &feature, "feature").unwrap();
    fs::write(repo.join("notes.txt"), "wip\n").unwrap();

    gitsej(&repo)
        .args(["migrate", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("continue?").not())
        .stdout(predicate::str::contains("moved worktree:"));

    assert!(repo.join("feature").is_dir());
}

#[test]
fn test_migrate_detects_branch_despite_environment() {
    let (_temp, repo) = create_temp_git_repo().unwrap();
    git(&repo, &["branch", "stable"]).unwrap();

    gitsej(&repo)
        .args(["migrate", "-y"])
        .env("GITSEJ_MAIN_BRANCH", "stable")
        .assert()
        .success();

    assert_eq!(current_branch(&repo.join("main")).unwrap(), "main");
    assert!(fs::read_to_string(repo.join(".gitsej"))
        .unwrap()
        .contains("main_branch=main\n"));
}

#[test]
fn test_migrate_explicit_main_branch_flag() {
    let (_temp, repo) = create_temp_git_repo().unwrap();
    git(&repo, &["branch", "stable"]).unwrap();

    gitsej(&repo)
        .args(["migrate", "-y", "--main-branch", "stable"])
        .assert()
        .success();

    assert_eq!(current_branch(&repo.join("main")).unwrap(), "stable");
}

#[test]
fn test_init_then_upgrade_report_changes() {
    let (temp, source) = create_temp_git_repo().unwrap();
    let root = fs::canonicalize(temp.path()).unwrap().join("layout");
    fs::create_dir(&root).unwrap();
    git(
        &root,
        &["clone", "--bare", "--quiet", &source.to_string_lossy(), ".bare"],
    )
    .unwrap();

    gitsej(&root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("(created .git, .gitsej)"));

    gitsej(&root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("(no changes)"));

    gitsej(&root)
        .arg("upgrade")
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date"));
}

#[test]
fn test_init_takes_branch_from_environment() {
    let (temp, source) = create_temp_git_repo().unwrap();
    let root = fs::canonicalize(temp.path()).unwrap().join("layout");
    fs::create_dir(&root).unwrap();
    git(
        &root,
        &["clone", "--bare", "--quiet", &source.to_string_lossy(), ".bare"],
    )
    .unwrap();

    gitsej(&root)
        .arg("init")
        .env("GITSEJ_MAIN_BRANCH", "trunk")
        .assert()
        .success();

    assert!(fs::read_to_string(root.join(".gitsej"))
        .unwrap()
        .contains("main_branch=trunk\n"));
}

#[test]
fn test_create_from_local_source_with_relative_directory() {
    let (temp, source) = create_temp_git_repo().unwrap();
    let base = fs::canonicalize(temp.path()).unwrap();
    let target = base.join("work");
    let source = source.to_string_lossy().to_string();

    gitsej(&base)
        .args(["--main-worktree", source.as_str(), "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "created gitsej repo: {}",
            target.display()
        )));

    assert_eq!(current_branch(&target.join("main")).unwrap(), "main");
    assert!(!target.join("work").exists());
}

#[test]
fn test_init_outside_layout_fails() {
    let (_temp, repo) = create_temp_git_repo().unwrap();
    gitsej(&repo)
        .arg("init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing .bare directory"));
}

#[test]
fn test_completions_for_bash() {
    let (_temp, repo) = create_temp_git_repo().unwrap();
    gitsej(&repo)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gitsej").and(predicate::str::contains("migrate")));
}
