use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{ReplaceError, Result};
use crate::resolve::{resolve_target, temp_path};

/// Caller-visible access for the staged handle.
///
/// Creation and truncation are managed by the replacement protocol itself
/// and cannot be requested here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    WriteOnly,
    ReadWrite,
}

/// An in-flight replacement: the open staged file plus the resolved
/// canonical path it will be renamed over.
///
/// Write the new contents through [`io::Write`] (or [`file_mut`]), then
/// consume the value with [`commit`] or [`commit_durable`]. Dropping without
/// committing leaves the target untouched; the abandoned temporary file is
/// removed by the next [`begin_replace`] on the same target.
///
/// [`file_mut`]: StagedReplace::file_mut
/// [`commit`]: StagedReplace::commit
/// [`commit_durable`]: StagedReplace::commit_durable
#[derive(Debug)]
pub struct StagedReplace {
    pub(crate) file: File,
    pub(crate) resolved: PathBuf,
}

impl StagedReplace {
    /// The canonical path the staged contents will replace on commit.
    pub fn target(&self) -> &Path {
        &self.resolved
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

impl Write for StagedReplace {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Read for StagedReplace {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Begin replacing `path`.
///
/// Resolves the target (following symlinks in the existing portion of the
/// path), removes any stale temporary file left behind by a crashed run, and
/// opens an exclusively-created staged sibling (`<target>.tmp`).
///
/// When the target already exists, its owner and permission bits are carried
/// over to the staged file before this function returns: the file is created
/// owner-only, ownership is transferred best-effort (UID and GID in separate
/// calls, since privilege may cover one but not the other), and the final
/// mode keeps the setuid/setgid bits only for the chown calls that actually
/// succeeded. When no target exists, the staged file is created directly
/// with `create_mode`, subject to the process umask.
pub fn begin_replace(
    path: impl AsRef<Path>,
    access: AccessMode,
    create_mode: u32,
) -> Result<StagedReplace> {
    let resolved = resolve_target(path.as_ref())?;
    let tmp = temp_path(&resolved);

    // Probe the existing target with the caller's access mode but without
    // create or truncate; this also verifies the caller actually has the
    // access it asked for. "No such file" means a fresh create.
    let probe = match open_probe(&resolved, access) {
        Ok(file) => Some(file),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(ReplaceError::Open {
                path: resolved,
                source,
            });
        }
    };

    // A leftover .tmp from a crashed run would make the exclusive create
    // below fail; remove it up front. Any failure other than "already gone"
    // aborts, as the create would collide anyway.
    if let Err(err) = fs::remove_file(&tmp) {
        if err.kind() != io::ErrorKind::NotFound {
            return Err(ReplaceError::StaleTempRemoval {
                path: tmp,
                source: err,
            });
        }
    }

    let file = match probe {
        Some(original) => {
            let metadata = original
                .metadata()
                .map_err(|source| ReplaceError::Open {
                    path: resolved.clone(),
                    source,
                })?;
            drop(original);
            // Owner-only until ownership is settled, so there is no window
            // where another user can open the staged file.
            let file = create_staged(&tmp, access, 0o600)?;
            inherit_owner_and_mode(&file, &metadata);
            file
        }
        None => create_staged(&tmp, access, create_mode)?,
    };

    Ok(StagedReplace { file, resolved })
}

fn open_probe(resolved: &Path, access: AccessMode) -> io::Result<File> {
    let mut options = OpenOptions::new();
    match access {
        AccessMode::WriteOnly => options.write(true),
        AccessMode::ReadWrite => options.read(true).write(true),
    };
    options.open(resolved)
}

/// Create the staged file exclusively. `create_new` refuses to follow a
/// symlink planted at the temporary name, so a symlink race cannot redirect
/// the write.
fn create_staged(tmp: &Path, access: AccessMode, mode: u32) -> Result<File> {
    let mut options = OpenOptions::new();
    if access == AccessMode::ReadWrite {
        options.read(true);
    }
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    options.open(tmp).map_err(|source| ReplaceError::Open {
        path: tmp.to_path_buf(),
        source,
    })
}

/// Permission bits to apply to the staged file, given the original mode and
/// whether each best-effort chown call succeeded. An elevated bit is carried
/// over only when the matching owner attribute was actually applied, so
/// setuid/setgid never land on a file owned by the wrong principal.
pub(crate) fn preserved_mode(original: u32, uid_applied: bool, gid_applied: bool) -> u32 {
    let mut mode = original & 0o777;
    if uid_applied {
        mode |= original & 0o4000;
    }
    if gid_applied {
        mode |= original & 0o2000;
    }
    mode
}

#[cfg(unix)]
fn inherit_owner_and_mode(file: &File, original: &fs::Metadata) {
    use std::os::unix::fs::{MetadataExt, PermissionsExt, fchown};

    // UID and GID in separate calls; either may fail without privilege and
    // both outcomes feed the mode mask below.
    let uid_applied = fchown(file, Some(original.uid()), None).is_ok();
    let gid_applied = fchown(file, None, Some(original.gid())).is_ok();

    let mode = preserved_mode(original.mode(), uid_applied, gid_applied);
    let _ = file.set_permissions(fs::Permissions::from_mode(mode));
}

#[cfg(not(unix))]
fn inherit_owner_and_mode(_file: &File, _original: &fs::Metadata) {}
