//! Devtrail Store - multi-backend commit replication
//!
//! This crate is responsible for:
//! - The `CommitStore` contract every backend implements
//! - PostgreSQL (pgvector), Neo4j, Elasticsearch and in-memory adapters
//! - The clear-and-reload import driver
//! - Cross-store consistency validation
//! - Commit pattern analysis

pub mod analysis;
mod backend;
pub mod consistency;
mod deadline;
pub mod embedding;
mod error;
mod import;
mod store;
pub mod stores;

pub use analysis::{analyze, PatternReport};
pub use backend::Backend;
pub use consistency::{validate, BackendStatus, ConsistencyReport, Insights};
pub use embedding::{Embedder, EmbeddingError, OllamaEmbedder};
pub use error::StoreError;
pub use import::{import, ImportBatch, ImportReport};
pub use store::{CommitStore, RepositoryActivity, StoreSummary, UpsertOutcome};
