//! In-memory [`CommitStore`] for tests and dry runs.
//!
//! Behaves like one of the real backends: with an embedder attached it
//! applies the relational embedding gate, with a temporal window it counts
//! `FOLLOWED_BY` pairs the way the graph does. Failures can be injected
//! to exercise partial-failure handling.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use devtrail_core::{CommitRecord, TemporalScope};

use crate::backend::Backend;
use crate::deadline::within;
use crate::embedding::Embedder;
use crate::error::StoreError;
use crate::store::{CommitStore, StoreSummary, UpsertOutcome};

/// Failure a [`MemoryStore`] reports instead of doing its work
#[derive(Debug, Clone)]
pub enum InjectedFailure {
    Schema(String),
    Write(String),
    Query(String),
}

struct StoredCommit {
    record: CommitRecord,
    vector: Option<Vec<f32>>,
}

pub struct MemoryStore {
    backend: Backend,
    commits: RwLock<BTreeMap<String, StoredCommit>>,
    embedder: Option<Arc<dyn Embedder>>,
    temporal: Option<(Duration, TemporalScope)>,
    failure: Option<InjectedFailure>,
    timeout: StdDuration,
}

impl MemoryStore {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            commits: RwLock::new(BTreeMap::new()),
            embedder: None,
            temporal: None,
            failure: None,
            timeout: StdDuration::from_secs(30),
        }
    }

    /// Requires a vector for every record, skipping those that fail.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Reports temporal edges for commits at most `window_hours` apart.
    pub fn with_temporal_window(mut self, window_hours: u32, scope: TemporalScope) -> Self {
        self.temporal = Some((Duration::hours(i64::from(window_hours)), scope));
        self
    }

    /// Limit on each embedding request; a slower one skips the record.
    pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_failure(mut self, failure: InjectedFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Stored records, ordered by `memory_id`
    pub fn records(&self) -> Vec<CommitRecord> {
        self.read().values().map(|c| c.record.clone()).collect()
    }

    pub fn get(&self, memory_id: &str) -> Option<CommitRecord> {
        self.read().get(memory_id).map(|c| c.record.clone())
    }

    pub fn vector(&self, memory_id: &str) -> Option<Vec<f32>> {
        self.read().get(memory_id).and_then(|c| c.vector.clone())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, StoredCommit>> {
        self.commits.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, StoredCommit>> {
        self.commits.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CommitStore for MemoryStore {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        match &self.failure {
            Some(InjectedFailure::Schema(msg)) => Err(StoreError::schema(self.backend, msg)),
            _ => Ok(()),
        }
    }

    async fn clear_prior_import(&self) -> Result<u64, StoreError> {
        let mut commits = self.write();
        let removed = commits.len() as u64;
        commits.clear();
        Ok(removed)
    }

    async fn upsert_batch(&self, records: &[CommitRecord]) -> Result<UpsertOutcome, StoreError> {
        if let Some(InjectedFailure::Write(msg)) = &self.failure {
            return Err(StoreError::write(self.backend, msg));
        }

        let mut outcome = UpsertOutcome::default();
        for record in records {
            let vector = match &self.embedder {
                Some(embedder) => match within(self.timeout, embedder.embed(&record.embedding_text())).await {
                    Ok(v) => Some(v),
                    Err(e) => {
                        log::warn!("{}: skipping {}: {}", self.backend, record.short_hash(), e);
                        outcome.skipped += 1;
                        continue;
                    }
                },
                None => None,
            };

            self.write().insert(
                record.memory_id.clone(),
                StoredCommit {
                    record: record.clone(),
                    vector,
                },
            );
            outcome.imported += 1;
        }
        Ok(outcome)
    }

    async fn summary_aggregates(&self) -> Result<StoreSummary, StoreError> {
        if let Some(InjectedFailure::Query(msg)) = &self.failure {
            return Err(StoreError::query(self.backend, msg));
        }

        let records = self.records();
        let mut summary = StoreSummary::from_records(&records);
        if let Some((window, scope)) = self.temporal {
            summary.temporal_edges = Some(count_temporal_pairs(&records, window, scope));
        }
        Ok(summary)
    }
}

/// Counts ordered pairs `(a, b)` with `a.ts < b.ts <= a.ts + window`.
pub fn count_temporal_pairs(records: &[CommitRecord], window: Duration, scope: TemporalScope) -> u64 {
    let mut pairs = 0;
    for a in records {
        for b in records {
            if scope == TemporalScope::Repository && a.repository != b.repository {
                continue;
            }
            if a.timestamp < b.timestamp && b.timestamp <= a.timestamp + window {
                pairs += 1;
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use devtrail_core::{CommitDraft, CommitType};

    fn record(hash_prefix: char, repo: &str, hour: u32) -> CommitRecord {
        CommitRecord::from_draft(CommitDraft {
            hash: std::iter::repeat(hash_prefix).take(40).collect(),
            repository: repo.to_string(),
            author_name: "Jane Doe".to_string(),
            author_email_anonymized: "j***@example.com".to_string(),
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
                + Duration::hours(i64::from(hour)),
            message_sanitized: "Update".to_string(),
            commit_type: CommitType::Update,
            files_changed: 1,
            lines_added: 2,
            lines_deleted: 1,
            primary_language: "go".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_temporal_pairs_by_scope() {
        let records = vec![
            record('a', "api", 0),
            record('b', "api", 10),
            record('c', "web", 12),
            record('d', "api", 40),
        ];
        let window = Duration::hours(24);

        // api: a->b; b->d is 30h apart
        assert_eq!(count_temporal_pairs(&records, window, TemporalScope::Repository), 1);
        // plus a->c, b->c
        assert_eq!(count_temporal_pairs(&records, window, TemporalScope::Global), 3);
    }

    #[test]
    fn test_temporal_window_is_inclusive() {
        let records = vec![record('a', "api", 0), record('b', "api", 24)];
        assert_eq!(
            count_temporal_pairs(&records, Duration::hours(24), TemporalScope::Repository),
            1
        );
    }

    #[tokio::test]
    async fn test_injected_schema_failure() {
        let store = MemoryStore::new(Backend::Neo4j)
            .with_failure(InjectedFailure::Schema("constraint rejected".to_string()));
        let err = store.ensure_schema().await.unwrap_err();
        assert!(matches!(err, StoreError::Schema { backend: Backend::Neo4j, .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_injected_write_failure_is_not_fatal() {
        let store = MemoryStore::new(Backend::Elasticsearch)
            .with_failure(InjectedFailure::Write("bulk rejected".to_string()));
        let err = store.upsert_batch(&[record('a', "api", 0)]).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { backend: Backend::Elasticsearch, .. }));
        assert!(!err.is_fatal());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_id() {
        let store = MemoryStore::new(Backend::Elasticsearch);
        let r = record('a', "api", 0);
        store.upsert_batch(&[r.clone()]).await.unwrap();
        store.upsert_batch(&[r.clone()]).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&r.memory_id), Some(r));
    }
}
