//! Error types for devtrail-store

use crate::backend::Backend;
use crate::embedding::EmbeddingError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached; its import does not run.
    #[error("{backend}: connection failed: {message}")]
    Connection { backend: Backend, message: String },

    /// Schema setup failed; aborts that backend's import.
    #[error("{backend}: schema setup failed: {message}")]
    Schema { backend: Backend, message: String },

    #[error("{backend}: write failed: {message}")]
    Write { backend: Backend, message: String },

    /// Reading aggregates failed.
    #[error("{backend}: query failed: {message}")]
    Query { backend: Backend, message: String },

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl StoreError {
    pub fn connection(backend: Backend, err: impl std::fmt::Display) -> Self {
        StoreError::Connection {
            backend,
            message: err.to_string(),
        }
    }

    pub fn schema(backend: Backend, err: impl std::fmt::Display) -> Self {
        StoreError::Schema {
            backend,
            message: err.to_string(),
        }
    }

    pub fn write(backend: Backend, err: impl std::fmt::Display) -> Self {
        StoreError::Write {
            backend,
            message: err.to_string(),
        }
    }

    pub fn query(backend: Backend, err: impl std::fmt::Display) -> Self {
        StoreError::Query {
            backend,
            message: err.to_string(),
        }
    }

    /// Errors that stop a backend's import before any record is written
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Connection { .. } | StoreError::Schema { .. })
    }
}
