//! `.lb/` directory discovery (§4.2, §6.2).
//!
//! The per-repo configuration search walks upward looking for a `.git`
//! marker; if none is found, the process working directory is used as the
//! repo root.

use std::path::{Path, PathBuf};

/// Resolves the repository root: the nearest ancestor (including `start`
/// itself) containing a `.git` marker, or `start` itself if none is found.
pub fn find_repo_root(start: &Path) -> PathBuf {
    lb_git::find_git_root(start).unwrap_or_else(|| start.to_path_buf())
}

/// The persisted-state directory for a repo root (§6.2): `<repo>/.lb/`.
pub fn lb_dir(repo_root: &Path) -> PathBuf {
    repo_root.join(".lb")
}

/// Creates `<repo>/.lb/` if it doesn't already exist.
pub fn ensure_lb_dir(repo_root: &Path) -> std::io::Result<PathBuf> {
    let dir = lb_dir(repo_root);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// The global configuration directory: `~/.config/lb/`.
pub fn global_config_dir() -> Option<PathBuf> {
    dirs_home().map(|home| home.join(".config").join("lb"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_repo_root_falls_back_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let root = find_repo_root(dir.path());
        assert_eq!(root, dir.path());
    }

    #[test]
    fn find_repo_root_uses_git_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("sub");
        std::fs::create_dir(&nested).unwrap();

        let root = find_repo_root(&nested);
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn lb_dir_is_dotlb_under_root() {
        let root = Path::new("/repo");
        assert_eq!(lb_dir(root), Path::new("/repo/.lb"));
    }
}
