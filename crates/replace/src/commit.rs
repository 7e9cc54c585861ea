use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use crate::error::{ReplaceError, Result};
use crate::resolve::temp_path;
use crate::stage::StagedReplace;

impl StagedReplace {
    /// Flush, close, and atomically rename the staged file over the target.
    ///
    /// The rename is the atomicity pivot: a reader of the target path sees
    /// the old contents in full before it and the new contents in full after
    /// it, never a partial file. The staged handle is consumed and released
    /// on every path, success or failure.
    pub fn commit(self) -> Result<()> {
        let StagedReplace { file, resolved } = self;
        let tmp = temp_path(&resolved);

        // Data barrier on the staged file itself. Its failure is surfaced,
        // but only after the handle has been closed so it cannot leak.
        let synced = file.sync_all();
        let closed = close_reporting(file);
        synced.map_err(|source| ReplaceError::Commit {
            path: resolved.clone(),
            source,
        })?;
        closed.map_err(|source| ReplaceError::Commit {
            path: resolved.clone(),
            source,
        })?;

        fs::rename(&tmp, &resolved).map_err(|source| ReplaceError::Commit {
            path: resolved,
            source,
        })
    }

    /// [`commit`](StagedReplace::commit), then fsync the target's parent
    /// directory so the rename itself survives a crash.
    ///
    /// Without the directory barrier, a crash immediately after the rename
    /// can leave the filesystem pointing at the old file, depending on
    /// journaling behavior. A directory-sync failure is reported as
    /// [`ReplaceError::DurabilitySync`] even though the rename already
    /// succeeded: the new contents are in place, only their entry-durability
    /// is unconfirmed.
    pub fn commit_durable(self) -> Result<()> {
        let dir = match self.resolved.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.commit()?;

        let handle = File::open(&dir).map_err(|source| ReplaceError::DurabilitySync {
            path: dir.clone(),
            source,
        })?;
        handle
            .sync_all()
            .map_err(|source| ReplaceError::DurabilitySync { path: dir, source })
    }
}

/// Close the descriptor and report the close error, which `File`'s `Drop`
/// would otherwise swallow.
#[cfg(unix)]
fn close_reporting(file: File) -> io::Result<()> {
    use std::os::fd::IntoRawFd;

    let fd = file.into_raw_fd();
    if unsafe { libc::close(fd) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn close_reporting(file: File) -> io::Result<()> {
    drop(file);
    Ok(())
}
