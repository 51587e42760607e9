//! `.gitsej` configuration content and the append-only key merge
//!
//! The file is line oriented `key=value` with `#` comments. Tooling never
//! rewrites a key that is already present; upgrades only append the keys
//! that are missing, in canonical order.

use std::collections::HashSet;

/// Recognized keys in the order they are written and appended
pub const CANONICAL_KEYS: [&str; 5] = [
    "label",
    "main_worktree",
    "main_branch",
    "cooldown",
    "auto_update",
];

/// Separator comment placed before keys appended to a non-empty file
pub const UPGRADE_MARKER: &str = "# Added by gitsej upgrade";

const HEADER: &str = "# gitsej repo configuration";
const LABEL_COMMENT: &str = "# Optional label shown in tmux status; defaults to directory name.";
const AUTO_UPDATE_COMMENT: &str = "# 0 = never auto-pull, 1 = auto-pull when clean and behind.";

/// Default line(s) for one canonical key, comments first
fn default_lines(key: &str, main_branch: &str) -> Vec<String> {
    match key {
        "label" => vec!["label=".to_string()],
        "main_worktree" => vec!["main_worktree=main".to_string()],
        "main_branch" => vec![format!("main_branch={main_branch}")],
        "cooldown" => vec!["cooldown=300".to_string()],
        "auto_update" => vec![AUTO_UPDATE_COMMENT.to_string(), "auto_update=0".to_string()],
        _ => Vec::new(),
    }
}

/// Content of a freshly seeded `.gitsej`
pub fn config_content(main_branch: &str) -> String {
    let mut lines = vec![HEADER.to_string(), LABEL_COMMENT.to_string()];
    for key in CANONICAL_KEYS {
        lines.extend(default_lines(key, main_branch));
    }
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Keys present in `content`.
///
/// The key is the trimmed text before the first `=`. Blank lines, comments,
/// lines without `=` and lines with an empty key are skipped.
pub fn parse_config_keys(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, _)| key.trim())
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Default lines for every canonical key absent from `present`, plus the
/// names of those keys, both in canonical order.
pub fn missing_default_lines(
    main_branch: &str,
    present: &HashSet<String>,
) -> (Vec<String>, Vec<String>) {
    let mut lines = Vec::new();
    let mut keys = Vec::new();
    for key in CANONICAL_KEYS {
        if present.contains(key) {
            continue;
        }
        keys.push(key.to_string());
        lines.extend(default_lines(key, main_branch));
    }
    (lines, keys)
}

/// Outcome of [`merge_missing_keys`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMerge {
    pub content: String,
    /// Keys appended, in canonical order; empty means `content` is unchanged
    pub added_keys: Vec<String>,
}

/// Append defaults for missing canonical keys to existing config content.
///
/// Returns the input untouched when nothing is missing. Otherwise the
/// content is newline-terminated, a separator comment is added if the file
/// already had non-blank content, and the missing defaults follow.
pub fn merge_missing_keys(content: &str, main_branch: &str) -> ConfigMerge {
    let present = parse_config_keys(content);
    let (additions, added_keys) = missing_default_lines(main_branch, &present);
    if added_keys.is_empty() {
        return ConfigMerge {
            content: content.to_string(),
            added_keys,
        };
    }

    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    if !updated.trim().is_empty() {
        updated.push('\n');
        updated.push_str(UPGRADE_MARKER);
        updated.push('\n');
    }
    for line in additions {
        updated.push_str(&line);
        updated.push('\n');
    }

    ConfigMerge {
        content: updated,
        added_keys,
    }
}
