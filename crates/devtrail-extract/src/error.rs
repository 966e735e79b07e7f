//! Error types for devtrail-extract

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Git operation failed in {path}: {source}")]
    Repository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// A single commit could not be turned into a record.
    #[error("Failed to parse commit {commit}: {reason}")]
    Parse { commit: String, reason: String },
}
