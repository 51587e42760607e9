//! E2E tests for init and upgrade on a bare-structured root

use super::helpers::*;
use gitsej::layout::{
    init, upgrade, InitOptions, UpgradeOptions, BARE_DIR, CONFIG_FILE, GIT_LINK, UPGRADE_MARKER,
};
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A root holding only a bare clone of a fresh repository
fn bare_root() -> (TempDir, PathBuf) {
    let (temp, source) = create_temp_git_repo().unwrap();
    let root = source.parent().unwrap().join("layout");
    fs::create_dir(&root).unwrap();
    let bare = root.join(BARE_DIR);
    git(
        &root,
        &["clone", "--bare", "--quiet", &source.to_string_lossy(), &bare.to_string_lossy()],
    )
    .unwrap();
    (temp, root)
}

#[test]
fn test_init_makes_root_usable_by_git() {
    let (_temp, root) = bare_root();

    let result = init(InitOptions {
        directory: root.clone(),
        main_branch: None,
    })
    .unwrap();

    assert!(result.created_git_link && result.created_config);
    assert_eq!(
        git_output(&root, &["rev-parse", "--is-bare-repository"]).unwrap(),
        "true"
    );

    let again = init(InitOptions {
        directory: root.clone(),
        main_branch: Some("other".to_string()),
    })
    .unwrap();
    assert!(!again.created_git_link && !again.created_config);
    assert!(fs::read_to_string(root.join(CONFIG_FILE))
        .unwrap()
        .contains("main_branch=main\n"));
}

#[test]
#[serial]
fn test_init_defaults_to_current_directory() {
    let (_temp, root) = bare_root();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(&root).unwrap();

    let result = init(InitOptions::default());
    std::env::set_current_dir(previous).unwrap();

    let result = result.unwrap();
    assert!(result.created_git_link);
    assert!(root.join(GIT_LINK).is_file());
    assert!(root.join(CONFIG_FILE).is_file());
}

#[test]
fn test_upgrade_appends_missing_keys_to_hand_written_config() {
    let (_temp, root) = bare_root();
    fs::write(root.join(GIT_LINK), "gitdir: ./.bare\n").unwrap();
    fs::write(root.join(CONFIG_FILE), "main_branch=develop\ncooldown=60").unwrap();

    let result = upgrade(UpgradeOptions {
        directory: root.clone(),
        main_branch: None,
    })
    .unwrap();

    assert_eq!(result.added_keys, vec!["label", "main_worktree", "auto_update"]);
    let content = fs::read_to_string(root.join(CONFIG_FILE)).unwrap();
    assert!(content.starts_with("main_branch=develop\ncooldown=60\n"));
    assert!(content.contains(UPGRADE_MARKER));
    assert_eq!(content.matches("main_branch=").count(), 1);

    let second = upgrade(UpgradeOptions {
        directory: root.clone(),
        main_branch: None,
    })
    .unwrap();
    assert!(second.added_keys.is_empty());
    assert_eq!(fs::read_to_string(root.join(CONFIG_FILE)).unwrap(), content);
}

#[test]
fn test_upgrade_requires_bare_store() {
    let (_temp, repo) = create_temp_git_repo().unwrap();
    let err = upgrade(UpgradeOptions {
        directory: repo.clone(),
        main_branch: None,
    })
    .unwrap_err();
    assert!(err.to_string().contains("missing .bare directory"));
    assert!(!repo.join(CONFIG_FILE).exists());
}
