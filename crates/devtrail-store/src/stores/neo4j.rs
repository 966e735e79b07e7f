//! Neo4j adapter
//!
//! Each commit becomes a `GitCommit` node merged on `memory_id`. Once the
//! nodes are written the batch is linked into the graph:
//!
//! ```text
//! (:Author)-[:AUTHORED]->(:GitCommit)-[:COMMITTED_TO]->(:Repository)
//! (:GitCommit)-[:FOLLOWED_BY]->(:GitCommit)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use devtrail_core::config::Neo4jConfig;
use devtrail_core::{CommitRecord, TemporalScope};
use neo4rs::{query, ConfigBuilder, Graph, Query, Row};

use crate::backend::Backend;
use crate::deadline::within;
use crate::error::StoreError;
use crate::store::{CommitStore, RepositoryActivity, StoreSummary, UpsertOutcome};

const BACKEND: Backend = Backend::Neo4j;

const CONSTRAINTS: [&str; 2] = [
    "CREATE CONSTRAINT git_commit_hash IF NOT EXISTS FOR (gc:GitCommit) REQUIRE gc.hash IS UNIQUE",
    "CREATE CONSTRAINT git_commit_memory_id IF NOT EXISTS FOR (gc:GitCommit) REQUIRE gc.memory_id IS UNIQUE",
];

const CLEAR_COMMITS: &str = "MATCH (gc:GitCommit) DETACH DELETE gc RETURN count(*) AS deleted";

const CLEAR_ORPHANS: [&str; 2] = [
    "MATCH (r:Repository) WHERE NOT (r)<-[:COMMITTED_TO]-() DELETE r",
    "MATCH (a:Author) WHERE NOT (a)-[:AUTHORED]->() DELETE a",
];

const MERGE_COMMIT: &str = "
    MERGE (gc:GitCommit {memory_id: $memory_id})
    SET gc.hash = $hash,
        gc.repository = $repository,
        gc.commit_type = $commit_type,
        gc.author = $author,
        gc.author_email = $author_email,
        gc.message = $message,
        gc.timestamp = datetime($timestamp),
        gc.files_changed = $files_changed,
        gc.lines_added = $lines_added,
        gc.lines_deleted = $lines_deleted,
        gc.primary_language = $primary_language,
        gc.created_at = datetime($timestamp)";

const LINK_REPOSITORIES: &str = "
    MATCH (gc:GitCommit)
    MERGE (r:Repository {name: gc.repository})
    MERGE (gc)-[:COMMITTED_TO]->(r)";

const LINK_AUTHORS: &str = "
    MATCH (gc:GitCommit)
    MERGE (a:Author {name: gc.author})
    MERGE (a)-[:AUTHORED]->(gc)";

/// Cypher linking commits that follow each other within `$window_hours`.
pub fn temporal_link_query(scope: TemporalScope) -> String {
    let same_repo = match scope {
        TemporalScope::Repository => "gc1.repository = gc2.repository AND ",
        TemporalScope::Global => "",
    };
    format!(
        "MATCH (gc1:GitCommit), (gc2:GitCommit)
         WHERE {same_repo}gc1.timestamp < gc2.timestamp
           AND gc2.timestamp <= gc1.timestamp + duration({{hours: $window_hours}})
         MERGE (gc1)-[:FOLLOWED_BY]->(gc2)"
    )
}

pub struct Neo4jStore {
    graph: Graph,
    window_hours: u32,
    scope: TemporalScope,
    /// Limit on each statement
    timeout: Duration,
}

impl Neo4jStore {
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, StoreError> {
        let neo_config = ConfigBuilder::default()
            .uri(config.uri.clone())
            .user(config.user.clone())
            .password(config.password.clone())
            .db(config.database.clone())
            .max_connections(config.max_connections)
            .build()
            .map_err(|e| StoreError::connection(BACKEND, e))?;

        let timeout = Duration::from_secs(config.timeout_secs);
        let graph = match tokio::time::timeout(timeout, Graph::connect(neo_config)).await {
            Ok(r) => r.map_err(|e| StoreError::connection(BACKEND, e))?,
            Err(_) => {
                return Err(StoreError::connection(
                    BACKEND,
                    format!("connect timeout after {:?}", timeout),
                ))
            }
        };

        let store = Self {
            graph,
            window_hours: config.temporal_window_hours,
            scope: config.temporal_scope,
            timeout,
        };
        // Pool connects lazily; run a trivial query so an unreachable server fails here
        store
            .rows(query("RETURN 1 AS n"))
            .await
            .map_err(|e| StoreError::connection(BACKEND, e))?;

        log::info!("Connected to Neo4j at {}", config.uri);
        Ok(store)
    }

    async fn rows(&self, q: Query) -> Result<Vec<Row>, String> {
        let fetch = async {
            let mut result = self.graph.execute(q).await?;
            let mut rows = Vec::new();
            while let Some(row) = result.next().await? {
                rows.push(row);
            }
            Ok::<_, neo4rs::Error>(rows)
        };
        within(self.timeout, fetch).await
    }

    async fn run(&self, q: Query) -> Result<(), String> {
        within(self.timeout, self.graph.run(q)).await
    }

    async fn count(&self, cypher: &str, field: &str) -> Result<u64, StoreError> {
        let rows = self
            .rows(query(cypher))
            .await
            .map_err(|e| StoreError::query(BACKEND, e))?;
        match rows.first() {
            Some(row) => get_count(row, field),
            None => Ok(0),
        }
    }

    /// Rows of `key, commits` pairs
    async fn grouped(&self, property: &str) -> Result<Vec<(String, u64)>, StoreError> {
        let cypher = format!(
            "MATCH (gc:GitCommit) RETURN gc.{property} AS key, count(gc) AS commits"
        );
        let rows = self
            .rows(query(&cypher))
            .await
            .map_err(|e| StoreError::query(BACKEND, e))?;
        rows.iter()
            .map(|row| Ok((get_key(row)?, get_count(row, "commits")?)))
            .collect()
    }
}

fn merge_commit_query(record: &CommitRecord) -> Query {
    query(MERGE_COMMIT)
        .param("memory_id", record.memory_id.clone())
        .param("hash", record.hash.clone())
        .param("repository", record.repository.clone())
        .param("commit_type", record.commit_type.as_str().to_string())
        .param("author", record.author_name.clone())
        .param("author_email", record.author_email_anonymized.clone())
        .param("message", record.message_sanitized.clone())
        .param("timestamp", record.timestamp.to_rfc3339())
        .param("files_changed", i64::from(record.files_changed))
        .param("lines_added", i64::from(record.lines_added))
        .param("lines_deleted", i64::from(record.lines_deleted))
        .param("primary_language", record.primary_language.clone())
}

fn get_count(row: &Row, field: &str) -> Result<u64, StoreError> {
    let n: i64 = row
        .get(field)
        .map_err(|e| StoreError::query(BACKEND, format!("{}: {}", field, e)))?;
    Ok(u64::try_from(n).unwrap_or(0))
}

fn get_key(row: &Row) -> Result<String, StoreError> {
    // Missing properties come back as null
    Ok(row.get::<Option<String>>("key")
        .map_err(|e| StoreError::query(BACKEND, format!("key: {}", e)))?
        .unwrap_or_default())
}

#[async_trait]
impl CommitStore for Neo4jStore {
    fn backend(&self) -> Backend {
        BACKEND
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for constraint in CONSTRAINTS {
            if let Err(message) = self.run(query(constraint)).await {
                if message.contains("already exists") || message.contains("EquivalentSchemaRule") {
                    log::warn!("neo4j: constraint already present: {}", message);
                } else {
                    return Err(StoreError::schema(BACKEND, message));
                }
            }
        }
        Ok(())
    }

    async fn clear_prior_import(&self) -> Result<u64, StoreError> {
        let deleted = self.count(CLEAR_COMMITS, "deleted").await.map_err(|e| match e {
            StoreError::Query { message, .. } => StoreError::write(BACKEND, message),
            other => other,
        })?;
        for cypher in CLEAR_ORPHANS {
            self.run(query(cypher))
                .await
                .map_err(|e| StoreError::write(BACKEND, e))?;
        }
        Ok(deleted)
    }

    async fn upsert_batch(&self, records: &[CommitRecord]) -> Result<UpsertOutcome, StoreError> {
        let mut outcome = UpsertOutcome::default();

        for record in records {
            match self.run(merge_commit_query(record)).await {
                Ok(()) => {
                    outcome.imported += 1;
                    log::debug!("neo4j: merged {}", record.memory_id);
                }
                Err(e) => {
                    log::warn!("neo4j: failed to merge {}: {}", record.short_hash(), e);
                    outcome.skipped += 1;
                }
            }
        }

        log::info!("neo4j: linking repositories, authors and temporal sequences");
        self.run(query(LINK_REPOSITORIES))
            .await
            .map_err(|e| StoreError::write(BACKEND, e))?;
        self.run(query(LINK_AUTHORS))
            .await
            .map_err(|e| StoreError::write(BACKEND, e))?;
        self.run(
            query(&temporal_link_query(self.scope))
                .param("window_hours", i64::from(self.window_hours)),
        )
        .await
            .map_err(|e| StoreError::write(BACKEND, e))?;

        Ok(outcome)
    }

    async fn summary_aggregates(&self) -> Result<StoreSummary, StoreError> {
        let total = self
            .count("MATCH (gc:GitCommit) RETURN count(gc) AS total", "total")
            .await?;

        let repo_rows = self
            .rows(query(
                "MATCH (gc:GitCommit)
                 RETURN gc.repository AS key, count(gc) AS commits,
                        sum(gc.lines_added) AS added, sum(gc.lines_deleted) AS deleted",
            ))
            .await
            .map_err(|e| StoreError::query(BACKEND, e))?;
        let mut by_repository = std::collections::BTreeMap::new();
        for row in &repo_rows {
            by_repository.insert(
                get_key(row)?,
                RepositoryActivity {
                    commits: get_count(row, "commits")?,
                    lines_added: get_count(row, "added")?,
                    lines_deleted: get_count(row, "deleted")?,
                },
            );
        }

        let temporal_edges = self
            .count(
                "MATCH (:GitCommit)-[f:FOLLOWED_BY]->(:GitCommit) RETURN count(f) AS edges",
                "edges",
            )
            .await?;

        Ok(StoreSummary {
            total,
            by_repository,
            by_author: self.grouped("author").await?.into_iter().collect(),
            by_language: self.grouped("primary_language").await?.into_iter().collect(),
            by_commit_type: self.grouped("commit_type").await?.into_iter().collect(),
            temporal_edges: Some(temporal_edges),
        })
    }
}
