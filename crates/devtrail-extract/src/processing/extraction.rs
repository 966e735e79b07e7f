//! Repository walk and parallel extraction

use std::path::{Path, PathBuf};
use std::time::Instant;

use devtrail_core::CommitRecord;
use git2::{Repository, Sort};
use rayon::prelude::*;

use super::commit::{build_record, RepoContext};
use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::language::detect_language;
use crate::locator::repository_name;
use crate::stats::{ExtractionStats, RepoExtraction};

/// Records of every repository, merged in input order, with run totals.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<CommitRecord>,
    pub stats: ExtractionStats,
}

impl Extractor {
    /// Extracts one repository, returning an empty set when the repository
    /// itself cannot be read.
    pub fn extract(&self, repo_path: &Path) -> Vec<CommitRecord> {
        match self.try_extract(repo_path) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Skipping repository {:?}: {}", repo_path, e);
                Vec::new()
            }
        }
    }

    /// Extracts one repository, surfacing repository-level failures.
    pub fn try_extract(&self, repo_path: &Path) -> Result<Vec<CommitRecord>, ExtractError> {
        self.scan(repo_path).map(|scan| scan.records)
    }

    /// Extracts every repository on the rayon pool.
    ///
    /// Output order follows `repos`, and inside a repository the walk
    /// order (newest first), so the same inputs give the same file.
    pub fn extract_all(&self, repos: &[PathBuf]) -> Extraction {
        let start_time = Instant::now();
        log::info!(
            "Extracting {} repositories since {} ({} threads)",
            repos.len(),
            self.cutoff().format("%Y-%m-%d %H:%M:%S"),
            rayon::current_num_threads()
        );

        let results: Vec<_> = repos
            .par_iter()
            .map(|path| (repository_name(path), self.scan(path)))
            .collect();

        let mut extraction = Extraction::default();
        for (name, result) in results {
            match result {
                Ok(scan) => {
                    extraction.stats.record_repository(&name, &scan.records);
                    extraction.stats.skipped += scan.skipped;
                    extraction.records.extend(scan.records);
                }
                Err(e) => {
                    log::error!("Failed to extract {}: {}", name, e);
                    extraction.stats.per_repository.entry(name).or_default();
                    extraction.stats.failed_repositories += 1;
                }
            }
        }
        extraction.stats.elapsed_time = start_time.elapsed();

        log::info!("{}", extraction.stats);
        extraction
    }

    fn scan(&self, repo_path: &Path) -> Result<RepoExtraction, ExtractError> {
        let git_err = |source: git2::Error| ExtractError::Repository {
            path: repo_path.to_path_buf(),
            source,
        };

        let repo = Repository::open(repo_path).map_err(git_err)?;
        let name = repository_name(repo_path);
        let language = detect_language(repo_path);
        let ctx = RepoContext {
            repo: &repo,
            name: &name,
            language: &language,
            stat_mode: self.stat_mode,
        };

        let cutoff = self.cutoff().timestamp();
        let mut revwalk = repo.revwalk().map_err(git_err)?;
        revwalk.push_head().map_err(git_err)?;
        revwalk.set_sorting(Sort::TIME).map_err(git_err)?;

        let mut scan = RepoExtraction::default();
        for oid_result in revwalk {
            let oid = oid_result.map_err(git_err)?;
            let commit = match repo.find_commit(oid) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Failed to read commit {} in {}: {}", oid, name, e);
                    scan.skipped += 1;
                    continue;
                }
            };

            // Walk is newest first, nothing older can follow
            if commit.time().seconds() < cutoff {
                break;
            }
            if commit.parent_count() > 1 {
                log::debug!("Skipping merge commit {} in {}", oid, name);
                continue;
            }

            match build_record(&ctx, &commit) {
                Ok(record) => {
                    log::debug!("{}", record);
                    scan.records.push(record);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    scan.skipped += 1;
                }
            }
        }

        log::info!(
            "{}: {} commits ({}), {} skipped",
            name,
            scan.records.len(),
            language,
            scan.skipped
        );
        Ok(scan)
    }
}
