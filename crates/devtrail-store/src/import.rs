//! Clear-and-reload import driver

use std::collections::HashSet;
use std::time::{Duration, Instant};

use devtrail_core::CommitRecord;

use crate::backend::Backend;
use crate::error::StoreError;
use crate::store::CommitStore;

/// Records to import, unique by `memory_id`.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    records: Vec<CommitRecord>,
    duplicates: usize,
}

impl ImportBatch {
    /// Keeps the first record of each `memory_id`.
    pub fn new(records: Vec<CommitRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());
        let mut duplicates = 0;

        for record in records {
            if seen.insert(record.memory_id.clone()) {
                unique.push(record);
            } else {
                log::warn!(
                    "Dropping duplicate record {} ({})",
                    record.memory_id,
                    record.repository
                );
                duplicates += 1;
            }
        }

        Self {
            records: unique,
            duplicates,
        }
    }

    pub fn records(&self) -> &[CommitRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records dropped because their `memory_id` was already present
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub backend: Backend,
    pub cleared: u64,
    pub imported: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Replaces the backend's previous import with `batch`.
pub async fn import(store: &dyn CommitStore, batch: &ImportBatch) -> Result<ImportReport, StoreError> {
    let start = Instant::now();
    let backend = store.backend();

    store.ensure_schema().await?;
    let cleared = store.clear_prior_import().await?;
    log::info!("{}: cleared {} previously imported commits", backend, cleared);

    let outcome = store.upsert_batch(batch.records()).await?;
    let report = ImportReport {
        backend,
        cleared,
        imported: outcome.imported,
        skipped: outcome.skipped,
        elapsed: start.elapsed(),
    };

    if report.skipped > 0 {
        log::warn!(
            "{}: imported {} commits, skipped {}",
            backend,
            report.imported,
            report.skipped
        );
    } else {
        log::info!("{}: imported {} commits", backend, report.imported);
    }
    Ok(report)
}
