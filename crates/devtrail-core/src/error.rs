//! Error types for devtrail-core

use std::path::PathBuf;

/// A commit identifier could not be derived or verified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("commit hash {hash:?} is shorter than {required} characters")]
    HashTooShort { hash: String, required: usize },

    #[error("commit hash {0:?} contains non-hex characters")]
    HashNotHex(String),

    #[error("memory_id {found:?} does not match hash (expected {expected:?})")]
    MemoryIdMismatch { expected: String, found: String },
}

/// Errors specific to devtrail-core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Interchange file not found: {0}")]
    InterchangeNotFound(PathBuf),

    #[error("Invalid interchange file {path}: {source}")]
    InterchangeFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
