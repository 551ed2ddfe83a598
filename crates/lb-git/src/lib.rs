//! Filesystem-based `.git` marker detection and `git config` lookups.
//!
//! The per-repo configuration search (§4.2) walks upward looking for a
//! `.git` marker; this crate provides that walk plus the small amount of
//! `git config` introspection needed to attribute locally-created
//! dependency edges (§6.3's `created_by` field). Deriving a default repo
//! name from the git remote URL is explicitly out of scope (§1) -- the
//! `repo_name` heuristic falls back to the directory basename only.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Walk up the directory tree from `start` looking for a `.git` entry
/// (directory for a normal repo, file for a worktree/submodule).
///
/// Returns the repository root (the parent of `.git`), or `None` if the
/// filesystem root is reached without finding one.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().ok()?;

    let mut current = start.as_path();
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => return None,
        }
    }
}

pub fn is_git_repo(path: &Path) -> bool {
    find_git_root(path).is_some()
}

/// Retrieves `user.name` from git configuration, used as the default
/// `created_by` attribution for locally-originated writes. Returns `None`
/// if git is not installed or the key is unset.
pub fn get_git_user_name() -> Option<String> {
    let output = Command::new("git").args(["config", "user.name"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if name.is_empty() { None } else { Some(name) }
}

/// The repo-name heuristic (§4.2): directory basename. Git-remote-URL
/// inspection is explicitly out of scope (§1) and is not implemented here;
/// the `repo_name` configuration key exists precisely to override this
/// heuristic when it's wrong.
pub fn repo_name_heuristic(repo_root: &Path) -> Option<String> {
    repo_root
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_git_root_in_this_repo_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_git_root(&nested).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn find_git_root_none_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_git_root(dir.path()).is_none());
    }

    #[test]
    fn repo_name_heuristic_uses_basename() {
        let path = Path::new("/home/user/my-project");
        assert_eq!(repo_name_heuristic(path), Some("my-project".to_string()));
    }

    #[test]
    fn get_git_user_name_does_not_panic() {
        let _ = get_git_user_name();
    }
}
