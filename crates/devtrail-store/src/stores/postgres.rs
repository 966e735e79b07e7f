//! PostgreSQL + pgvector adapter
//!
//! One row per commit keyed by `memory_id`, with an embedding of
//! [`CommitRecord::embedding_text`] in a `VECTOR(dims)` column. A record
//! whose embedding cannot be computed is skipped; rows are never written
//! with a null vector.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devtrail_core::config::PostgresConfig;
use devtrail_core::CommitRecord;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};

use crate::backend::Backend;
use crate::deadline::within;
use crate::embedding::{check_dims, Embedder};
use crate::error::StoreError;
use crate::store::{CommitStore, RepositoryActivity, StoreSummary, UpsertOutcome};

const BACKEND: Backend = Backend::Postgres;

pub struct PostgresStore {
    pool: PgPool,
    table: String,
    embedder: Arc<dyn Embedder>,
    /// Limit on each statement and each embedding request
    timeout: Duration,
}

impl PostgresStore {
    pub async fn connect(
        config: &PostgresConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, StoreError> {
        let options = connect_options(config)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::connection(BACKEND, e))?;

        log::info!("Connected to PostgreSQL (table {})", config.table);
        Ok(Self {
            pool,
            table: config.table.clone(),
            embedder,
            timeout,
        })
    }

    async fn execute(&self, sql: &str) -> Result<u64, String> {
        within(self.timeout, sqlx::query(sql).execute(&self.pool))
            .await
            .map(|done| done.rows_affected())
    }

    async fn write_row(&self, record: &CommitRecord, vector: &[f32]) -> Result<(), String> {
        let sql = upsert_sql(&self.table);
        let insert = sqlx::query(&sql)
            .bind(&record.memory_id)
            .bind(&record.hash)
            .bind(&record.author_name)
            .bind(&record.author_email_anonymized)
            .bind(record.timestamp)
            .bind(&record.message_sanitized)
            .bind(&record.repository)
            .bind(to_int(record.lines_added))
            .bind(to_int(record.lines_deleted))
            .bind(to_int(record.files_changed))
            .bind(record.commit_type.as_str())
            .bind(&record.primary_language)
            .bind(record.embedding_text())
            .bind(vector_literal(vector))
            .execute(&self.pool);
        within(self.timeout, insert).await.map(|_| ())
    }

    /// Declared dimension of the `embedding` column, if the column exists
    async fn embedding_typmod(&self) -> Result<Option<i32>, String> {
        let lookup = sqlx::query_scalar(EMBEDDING_TYPMOD_SQL)
            .bind(&self.table)
            .fetch_optional(&self.pool);
        within(self.timeout, lookup).await
    }

    async fn grouped(&self, column: &str) -> Result<Vec<(String, i64)>, StoreError> {
        let sql = format!(
            "SELECT COALESCE({column}, ''), COUNT(*) FROM {} GROUP BY {column}",
            self.table
        );
        within(self.timeout, sqlx::query_as(&sql).fetch_all(&self.pool))
            .await
            .map_err(|e| StoreError::query(BACKEND, e))
    }
}

fn connect_options(config: &PostgresConfig) -> Result<PgConnectOptions, StoreError> {
    if let Some(url) = &config.url {
        return PgConnectOptions::from_str(url).map_err(|e| StoreError::connection(BACKEND, e));
    }
    let ssl_mode =
        PgSslMode::from_str(&config.ssl_mode).map_err(|e| StoreError::connection(BACKEND, e))?;
    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
        .ssl_mode(ssl_mode))
}

fn to_int(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Renders a vector in pgvector's text input format, e.g. `[0.5,-1,0.25]`.
pub fn vector_literal(vector: &[f32]) -> String {
    let parts: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// Statements run by `ensure_schema`, in order.
pub fn schema_statements(table: &str, dims: usize) -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                memory_id VARCHAR(32) PRIMARY KEY,
                hash VARCHAR(64) NOT NULL,
                author_name VARCHAR(255),
                author_email VARCHAR(255),
                timestamp TIMESTAMPTZ,
                commit_message TEXT,
                repository_name VARCHAR(255),
                lines_added INTEGER DEFAULT 0,
                lines_deleted INTEGER DEFAULT 0,
                files_changed INTEGER DEFAULT 0,
                commit_type VARCHAR(50),
                primary_language VARCHAR(50),
                content TEXT,
                embedding VECTOR({dims})
            )"
        ),
        format!("CREATE UNIQUE INDEX IF NOT EXISTS {table}_memory_id_key ON {table}(memory_id)"),
        format!("CREATE INDEX IF NOT EXISTS {table}_timestamp_idx ON {table}(timestamp)"),
        format!("CREATE INDEX IF NOT EXISTS {table}_repository_idx ON {table}(repository_name)"),
    ]
}

/// Reads the `embedding` column's type modifier, which pgvector sets to
/// the vector dimension.
pub const EMBEDDING_TYPMOD_SQL: &str = "SELECT a.atttypmod FROM pg_attribute a
     WHERE a.attrelid = $1::regclass AND a.attname = 'embedding' AND NOT a.attisdropped";

/// State of an existing table's `embedding` column against the embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingColumn {
    Matches,
    Missing,
    /// Sized for another model; `None` when declared without a dimension
    Resize { found: Option<usize> },
}

pub fn embedding_column(typmod: Option<i32>, dims: usize) -> EmbeddingColumn {
    match typmod {
        None => EmbeddingColumn::Missing,
        Some(m) => match usize::try_from(m) {
            Ok(found) if found == dims => EmbeddingColumn::Matches,
            Ok(found) => EmbeddingColumn::Resize { found: Some(found) },
            Err(_) => EmbeddingColumn::Resize { found: None },
        },
    }
}

/// Replaces the `embedding` column with one of `dims` dimensions.
///
/// Existing vectors are dropped; the import clears the rows right after.
pub fn embedding_column_statements(table: &str, dims: usize) -> Vec<String> {
    vec![
        format!("ALTER TABLE {table} DROP COLUMN IF EXISTS embedding"),
        format!("ALTER TABLE {table} ADD COLUMN embedding VECTOR({dims})"),
    ]
}

pub fn upsert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} (
            memory_id, hash, author_name, author_email, timestamp,
            commit_message, repository_name, lines_added, lines_deleted,
            files_changed, commit_type, primary_language, content, embedding
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14::text::vector
        )
        ON CONFLICT (memory_id) DO UPDATE SET
            hash = EXCLUDED.hash,
            author_name = EXCLUDED.author_name,
            author_email = EXCLUDED.author_email,
            timestamp = EXCLUDED.timestamp,
            commit_message = EXCLUDED.commit_message,
            repository_name = EXCLUDED.repository_name,
            lines_added = EXCLUDED.lines_added,
            lines_deleted = EXCLUDED.lines_deleted,
            files_changed = EXCLUDED.files_changed,
            commit_type = EXCLUDED.commit_type,
            primary_language = EXCLUDED.primary_language,
            content = EXCLUDED.content,
            embedding = EXCLUDED.embedding"
    )
}

#[async_trait]
impl CommitStore for PostgresStore {
    fn backend(&self) -> Backend {
        BACKEND
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        // Needs superuser on first install; table creation fails below if the type is missing
        if let Err(e) = self.execute("CREATE EXTENSION IF NOT EXISTS vector").await {
            log::warn!("postgres: could not create vector extension: {}", e);
        }

        let dims = self.embedder.dims();
        for sql in schema_statements(&self.table, dims) {
            self.execute(&sql)
                .await
                .map_err(|e| StoreError::schema(BACKEND, e))?;
        }

        let typmod = self
            .embedding_typmod()
            .await
            .map_err(|e| StoreError::schema(BACKEND, e))?;
        match embedding_column(typmod, dims) {
            EmbeddingColumn::Matches => {}
            column => {
                log::warn!(
                    "postgres: embedding column of {} is {:?}, recreating as VECTOR({})",
                    self.table,
                    column,
                    dims
                );
                for sql in embedding_column_statements(&self.table, dims) {
                    self.execute(&sql)
                        .await
                        .map_err(|e| StoreError::schema(BACKEND, e))?;
                }
            }
        }
        Ok(())
    }

    async fn clear_prior_import(&self) -> Result<u64, StoreError> {
        self.execute(&format!("DELETE FROM {}", self.table))
            .await
            .map_err(|e| StoreError::write(BACKEND, e))
    }

    async fn upsert_batch(&self, records: &[CommitRecord]) -> Result<UpsertOutcome, StoreError> {
        let mut outcome = UpsertOutcome::default();

        for record in records {
            let text = record.embedding_text();
            let vector = match within(self.timeout, self.embedder.embed(&text)).await {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("postgres: skipping {} - no embedding: {}", record.short_hash(), e);
                    outcome.skipped += 1;
                    continue;
                }
            };
            let vector = match check_dims(vector, self.embedder.dims()) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("postgres: skipping {}: {}", record.short_hash(), e);
                    outcome.skipped += 1;
                    continue;
                }
            };

            match self.write_row(record, &vector).await {
                Ok(()) => {
                    outcome.imported += 1;
                    log::debug!("postgres: wrote {}", record.memory_id);
                    if outcome.imported % 10 == 0 {
                        log::info!("postgres: {} commits written", outcome.imported);
                    }
                }
                Err(e) => {
                    log::warn!("postgres: failed to write {}: {}", record.short_hash(), e);
                    outcome.skipped += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn summary_aggregates(&self) -> Result<StoreSummary, StoreError> {
        let query_err = |e: String| StoreError::query(BACKEND, e);
        let table = &self.table;

        let count_sql = format!("SELECT COUNT(*) FROM {table}");
        let total: i64 = within(self.timeout, sqlx::query_scalar(&count_sql).fetch_one(&self.pool))
            .await
            .map_err(query_err)?;

        let repo_sql = format!(
            "SELECT COALESCE(repository_name, ''), COUNT(*),
                    COALESCE(SUM(lines_added), 0)::BIGINT,
                    COALESCE(SUM(lines_deleted), 0)::BIGINT
             FROM {table} GROUP BY repository_name"
        );
        let repos: Vec<(String, i64, i64, i64)> =
            within(self.timeout, sqlx::query_as(&repo_sql).fetch_all(&self.pool))
                .await
                .map_err(query_err)?;

        let authors = self.grouped("author_name").await?;
        let languages = self.grouped("primary_language").await?;
        let commit_types = self.grouped("commit_type").await?;

        Ok(StoreSummary {
            total: to_count(total),
            by_repository: repos
                .into_iter()
                .map(|(name, commits, added, deleted)| {
                    let activity = RepositoryActivity {
                        commits: to_count(commits),
                        lines_added: to_count(added),
                        lines_deleted: to_count(deleted),
                    };
                    (name, activity)
                })
                .collect(),
            by_author: authors
                .into_iter()
                .map(|(k, n)| (k, to_count(n)))
                .collect(),
            by_language: languages
                .into_iter()
                .map(|(k, n)| (k, to_count(n)))
                .collect(),
            by_commit_type: commit_types
                .into_iter()
                .map(|(k, n)| (k, to_count(n)))
                .collect(),
            temporal_edges: None,
        })
    }
}

fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}
