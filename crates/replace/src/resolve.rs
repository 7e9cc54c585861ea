use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ReplaceError, Result};

/// Suffix appended to the resolved target path to name the staged sibling.
pub(crate) const TMP_SUFFIX: &str = ".tmp";

#[cfg(unix)]
const PATH_LIMIT: usize = libc::PATH_MAX as usize;
#[cfg(not(unix))]
const PATH_LIMIT: usize = 260;

/// Resolve `path` to the canonical location the replacement will land on.
///
/// If the whole path canonicalizes (the file exists, possibly behind a chain
/// of symlinks), the replacement targets the canonical file, so a symlinked
/// target is followed and its destination replaced. If only the leaf is
/// missing, the deepest existing directory is canonicalized and the
/// unresolved file name appended; a missing ancestor directory fails the
/// whole operation.
///
/// Known limitation: a dangling symlink at the leaf cannot be followed (its
/// target does not resolve), so the replacement lands on the link name
/// itself, replacing the symlink rather than its target.
pub(crate) fn resolve_target(path: &Path) -> Result<PathBuf> {
    let resolved = match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let file_name = path.file_name().ok_or_else(|| ReplaceError::PathResolution {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            })?;
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let canonical_dir =
                dir.canonicalize()
                    .map_err(|source| ReplaceError::PathResolution {
                        path: path.to_path_buf(),
                        source,
                    })?;
            canonical_dir.join(file_name)
        }
        Err(source) => {
            return Err(ReplaceError::PathResolution {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    // Checked before any filesystem mutation: the staged sibling's name must
    // also fit within the platform limit.
    if resolved.as_os_str().len() + TMP_SUFFIX.len() > PATH_LIMIT {
        return Err(ReplaceError::NameTooLong { path: resolved });
    }

    Ok(resolved)
}

/// Derive the staged sibling's path. Recomputed from the resolved path
/// whenever needed; never stored.
pub(crate) fn temp_path(resolved: &Path) -> PathBuf {
    let mut name = resolved.as_os_str().to_os_string();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn existing_file_resolves_to_canonical_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cfg");
        fs::write(&file, "x").unwrap();

        let resolved = resolve_target(&file).unwrap();
        assert_eq!(resolved, file.canonicalize().unwrap());
        assert!(resolved.is_absolute());
    }

    #[test]
    fn missing_leaf_joins_canonical_parent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("does-not-exist-yet");

        let resolved = resolve_target(&file).unwrap();
        assert_eq!(
            resolved,
            dir.path().canonicalize().unwrap().join("does-not-exist-yet")
        );
    }

    #[test]
    fn missing_leaf_without_separator_uses_current_dir() {
        let name = "safereplace-resolve-test-nonexistent";
        let resolved = resolve_target(Path::new(name)).unwrap();
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(resolved, cwd.join(name));
    }

    #[test]
    fn missing_ancestor_directory_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("no").join("such").join("dir").join("cfg");

        let err = resolve_target(&file).unwrap_err();
        assert!(matches!(err, ReplaceError::PathResolution { .. }));
    }

    #[test]
    fn symlinked_file_resolves_to_link_target() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::write(&real, "x").unwrap();
        let link = dir.path().join("link");
        #[cfg(unix)]
        std::os::unix::fs::symlink(&real, &link).unwrap();
        #[cfg(windows)]
        std::os::windows::fs::symlink_file(&real, &link).unwrap();

        let resolved = resolve_target(&link).unwrap();
        assert_eq!(resolved, real.canonicalize().unwrap());
    }

    #[test]
    fn path_beyond_platform_limit_is_a_resolution_failure() {
        // The whole path already exceeds PATH_MAX, so canonicalization itself
        // fails (ENAMETOOLONG) and is propagated, not translated.
        let dir = TempDir::new().unwrap();
        let leaf = "a".repeat(PATH_LIMIT);
        let err = resolve_target(&dir.path().join(leaf)).unwrap_err();
        assert!(matches!(err, ReplaceError::PathResolution { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn canonical_path_near_limit_fails_name_too_long() {
        // Build a target whose canonical form fits within PATH_MAX but no
        // longer does once the .tmp suffix is appended.
        let dir = TempDir::new().unwrap();
        // 100-char components keep the final leaf under NAME_MAX, so the
        // leaf lookup fails with ENOENT rather than ENAMETOOLONG.
        let mut deep = dir.path().canonicalize().unwrap();
        while deep.as_os_str().len() < 3900 {
            deep = deep.join("d".repeat(100));
        }
        fs::create_dir_all(&deep).unwrap();

        let leaf_len = PATH_LIMIT - 2 - deep.as_os_str().len() - 1;
        let target = deep.join("f".repeat(leaf_len));

        let err = resolve_target(&target).unwrap_err();
        assert!(matches!(err, ReplaceError::NameTooLong { .. }));
        assert_eq!(fs::read_dir(&deep).unwrap().count(), 0);
    }

    #[test]
    fn temp_path_appends_suffix() {
        let tmp = temp_path(Path::new("/etc/hosts"));
        assert_eq!(tmp, PathBuf::from("/etc/hosts.tmp"));
    }
}
