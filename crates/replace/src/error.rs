use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReplaceError {
    #[error("failed to resolve path {path}: {source}")]
    PathResolution {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("resolved path {path} exceeds the platform path length limit")]
    NameTooLong { path: PathBuf },

    #[error("failed to remove stale temporary file {path}: {source}")]
    StaleTempRemoval {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to commit replacement of {path}: {source}")]
    Commit {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("directory durability sync failed for {path}: {source}")]
    DurabilitySync {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReplaceError>;
