//! Extraction statistics

use std::collections::BTreeMap;
use std::time::Duration;

use devtrail_core::{CommitRecord, CommitType};

use crate::formatting::{format_duration, format_number};

/// Totals gathered over one extraction run
#[derive(Debug, Clone, Default)]
pub struct ExtractionStats {
    /// Commits kept per repository, including repositories with none
    pub per_repository: BTreeMap<String, usize>,
    pub by_type: BTreeMap<CommitType, usize>,
    pub by_language: BTreeMap<String, usize>,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    /// Commits dropped because they could not be read
    pub skipped: usize,
    pub failed_repositories: usize,
    pub elapsed_time: Duration,
}

impl ExtractionStats {
    pub(crate) fn record_repository(&mut self, name: &str, records: &[CommitRecord]) {
        *self.per_repository.entry(name.to_string()).or_default() += records.len();
        for record in records {
            *self.by_type.entry(record.commit_type).or_default() += 1;
            *self
                .by_language
                .entry(record.primary_language.clone())
                .or_default() += 1;
            self.files_changed += u64::from(record.files_changed);
            self.lines_added += u64::from(record.lines_added);
            self.lines_deleted += u64::from(record.lines_deleted);
        }
    }

    /// Number of commits kept across all repositories
    pub fn total_commits(&self) -> usize {
        self.per_repository.values().sum()
    }
}

impl std::fmt::Display for ExtractionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Commits: {} extracted, {} skipped | Repositories: {} scanned, {} failed | Lines: +{} -{} in {} files | Time: {}",
            format_number(self.total_commits() as u64),
            self.skipped,
            self.per_repository.len(),
            self.failed_repositories,
            format_number(self.lines_added),
            format_number(self.lines_deleted),
            format_number(self.files_changed),
            format_duration(self.elapsed_time)
        )
    }
}

/// Outcome of extracting one repository
#[derive(Debug, Default)]
pub(crate) struct RepoExtraction {
    pub records: Vec<CommitRecord>,
    pub skipped: usize,
}
