//! Backend implementations of [`CommitStore`](crate::CommitStore)

pub mod elasticsearch;
pub mod memory;
pub mod neo4j;
pub mod postgres;

use std::sync::Arc;

use devtrail_core::Settings;

use crate::backend::Backend;
use crate::embedding::Embedder;
use crate::error::StoreError;
use crate::store::CommitStore;

pub use elasticsearch::ElasticsearchStore;
pub use memory::{InjectedFailure, MemoryStore};
pub use neo4j::Neo4jStore;
pub use postgres::PostgresStore;

/// Connects to `backend` using its section of `settings`.
///
/// Only the relational backend uses `embedder`.
pub async fn connect(
    backend: Backend,
    settings: &Settings,
    embedder: Arc<dyn Embedder>,
) -> Result<Box<dyn CommitStore>, StoreError> {
    let store: Box<dyn CommitStore> = match backend {
        Backend::Postgres => Box::new(PostgresStore::connect(&settings.postgres, embedder).await?),
        Backend::Neo4j => Box::new(Neo4jStore::connect(&settings.neo4j).await?),
        Backend::Elasticsearch => {
            Box::new(ElasticsearchStore::connect(&settings.elasticsearch).await?)
        }
    };
    Ok(store)
}
