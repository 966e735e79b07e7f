//! Store adapter contract
//!
//! Every backend implements [`CommitStore`]. An import is always the same
//! sequence (schema, clear, upsert) so that re-running it replaces the
//! backend's previous snapshot instead of appending to it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use devtrail_core::CommitRecord;

use crate::backend::Backend;
use crate::error::StoreError;

/// Result of writing one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub imported: usize,
    /// Records that failed individually and were left out
    pub skipped: usize,
}

/// Per-repository activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryActivity {
    pub commits: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

impl RepositoryActivity {
    pub fn total_changes(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }
}

/// Aggregate view of what a backend currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub total: u64,
    pub by_repository: BTreeMap<String, RepositoryActivity>,
    /// Commits per author name
    pub by_author: BTreeMap<String, u64>,
    /// Commits per primary language
    pub by_language: BTreeMap<String, u64>,
    /// Commits per classification (`bugfix`, `feature`, ...)
    pub by_commit_type: BTreeMap<String, u64>,
    /// `FOLLOWED_BY` edge count, reported by the graph backend only
    pub temporal_edges: Option<u64>,
}

impl StoreSummary {
    /// Aggregates records the same way the backends' queries do.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CommitRecord>) -> Self {
        let mut summary = StoreSummary::default();
        for record in records {
            summary.total += 1;
            let repo = summary
                .by_repository
                .entry(record.repository.clone())
                .or_default();
            repo.commits += 1;
            repo.lines_added += u64::from(record.lines_added);
            repo.lines_deleted += u64::from(record.lines_deleted);
            *summary
                .by_author
                .entry(record.author_name.clone())
                .or_default() += 1;
            *summary
                .by_language
                .entry(record.primary_language.clone())
                .or_default() += 1;
            *summary
                .by_commit_type
                .entry(record.commit_type.as_str().to_string())
                .or_default() += 1;
        }
        summary
    }
}

#[async_trait]
pub trait CommitStore: Send + Sync {
    fn backend(&self) -> Backend;

    /// Creates tables, constraints or mappings. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Removes every commit written by a previous import and returns how
    /// many were removed.
    async fn clear_prior_import(&self) -> Result<u64, StoreError>;

    /// Writes `records`, keyed by `memory_id`. A record that fails is
    /// logged and counted as skipped; the rest of the batch continues.
    async fn upsert_batch(&self, records: &[CommitRecord]) -> Result<UpsertOutcome, StoreError>;

    async fn summary_aggregates(&self) -> Result<StoreSummary, StoreError>;
}
