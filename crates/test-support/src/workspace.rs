use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// An isolated directory tree for a single test, cleaned up on drop.
pub struct TempWorkspace {
    pub root: PathBuf,
    _temp: TempDir,
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TempWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp directory");
        // Canonicalized so assertions on resolved paths compare equal even
        // when the temp root itself sits behind a symlink (macOS /tmp).
        let root = temp
            .path()
            .canonicalize()
            .expect("failed to canonicalize temp directory");
        Self { root, _temp: temp }
    }

    /// A path inside the workspace; `rel` may name a file that does not
    /// exist yet.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Create a file (and its parent directories) with the given contents.
    pub fn write_file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories");
        }
        fs::write(&path, contents).expect("failed to write fixture file");
        path
    }
}

/// Permission bits (lower 12) of a path, without following a final symlink.
#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::MetadataExt;
    fs::symlink_metadata(path)
        .expect("failed to stat path")
        .mode()
        & 0o7777
}

/// Set permission bits on an existing path.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .expect("failed to set permissions");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_cleanup_on_drop() {
        let root;
        {
            let ws = TempWorkspace::new();
            root = ws.root.clone();
            assert!(root.exists());
        }
        assert!(!root.exists());
    }

    #[test]
    fn write_file_creates_parents() {
        let ws = TempWorkspace::new();
        let path = ws.write_file("a/b/c.txt", "hello");
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn mode_round_trip() {
        let ws = TempWorkspace::new();
        let path = ws.write_file("f", "x");
        set_mode(&path, 0o640);
        assert_eq!(mode_of(&path), 0o640);
    }
}
