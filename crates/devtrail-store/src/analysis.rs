//! Commit pattern analysis
//!
//! Read-only views over a commit set: how productive each repository is,
//! how each author works, which authors share repositories, when commits
//! of each type happen, and which languages go with which repositories.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use devtrail_core::{CommitRecord, CommitType};

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryPattern {
    pub name: String,
    pub commits: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub avg_files_per_commit: f64,
    pub commit_types: BTreeSet<CommitType>,
    pub languages: BTreeSet<String>,
}

impl RepositoryPattern {
    pub fn total_changes(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthorPattern {
    pub name: String,
    pub commits: u64,
    pub languages: BTreeSet<String>,
    pub repositories: BTreeSet<String>,
    /// Mean of `lines_added / files_changed` over commits touching files
    pub avg_lines_per_file: Option<f64>,
}

/// Two authors committing to the same repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collaboration {
    /// Alphabetically ordered pair
    pub authors: (String, String),
    pub repository: String,
    /// Commit pairs, one commit by each author
    pub commit_pairs: u64,
}

/// Commits inside one clock hour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityBucket {
    pub hour: DateTime<Utc>,
    pub commits: u64,
    pub by_type: BTreeMap<CommitType, u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageCorrelation {
    pub language: String,
    pub commits: u64,
    pub avg_lines_added: f64,
    pub repositories: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternReport {
    /// Most changed lines first
    pub repositories: Vec<RepositoryPattern>,
    /// Most commits first
    pub authors: Vec<AuthorPattern>,
    /// Most commit pairs first
    pub collaborations: Vec<Collaboration>,
    /// Chronological, empty hours left out
    pub activity: Vec<ActivityBucket>,
    /// Most commits first
    pub languages: Vec<LanguageCorrelation>,
}

pub fn analyze(records: &[CommitRecord]) -> PatternReport {
    PatternReport {
        repositories: repository_patterns(records),
        authors: author_patterns(records),
        collaborations: collaborations(records),
        activity: activity(records),
        languages: language_correlations(records),
    }
}

fn mean(sum: f64, n: u64) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Larger count first, then by name
fn by_count_then_name(a: (u64, &str), b: (u64, &str)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

fn repository_patterns(records: &[CommitRecord]) -> Vec<RepositoryPattern> {
    let mut files: BTreeMap<&str, u64> = BTreeMap::new();
    let mut patterns: BTreeMap<&str, RepositoryPattern> = BTreeMap::new();

    for r in records {
        let p = patterns
            .entry(r.repository.as_str())
            .or_insert_with(|| RepositoryPattern {
                name: r.repository.clone(),
                commits: 0,
                lines_added: 0,
                lines_deleted: 0,
                avg_files_per_commit: 0.0,
                commit_types: BTreeSet::new(),
                languages: BTreeSet::new(),
            });
        p.commits += 1;
        p.lines_added += u64::from(r.lines_added);
        p.lines_deleted += u64::from(r.lines_deleted);
        p.commit_types.insert(r.commit_type);
        p.languages.insert(r.primary_language.clone());
        *files.entry(r.repository.as_str()).or_default() += u64::from(r.files_changed);
    }

    let mut out: Vec<RepositoryPattern> = patterns
        .into_iter()
        .map(|(name, mut p)| {
            let total_files = files.get(name).copied().unwrap_or(0);
            p.avg_files_per_commit = mean(total_files as f64, p.commits);
            p
        })
        .collect();
    out.sort_by(|a, b| by_count_then_name((a.total_changes(), a.name.as_str()), (b.total_changes(), b.name.as_str())));
    out
}

fn author_patterns(records: &[CommitRecord]) -> Vec<AuthorPattern> {
    // (pattern, sum of per-commit lines/file, commits touching files)
    let mut acc: BTreeMap<&str, (AuthorPattern, f64, u64)> = BTreeMap::new();

    for r in records {
        let (p, ratio_sum, ratio_n) = acc.entry(r.author_name.as_str()).or_insert_with(|| {
            let pattern = AuthorPattern {
                name: r.author_name.clone(),
                commits: 0,
                languages: BTreeSet::new(),
                repositories: BTreeSet::new(),
                avg_lines_per_file: None,
            };
            (pattern, 0.0, 0)
        });
        p.commits += 1;
        p.languages.insert(r.primary_language.clone());
        p.repositories.insert(r.repository.clone());
        if r.files_changed > 0 {
            *ratio_sum += f64::from(r.lines_added) / f64::from(r.files_changed);
            *ratio_n += 1;
        }
    }

    let mut out: Vec<AuthorPattern> = acc
        .into_values()
        .map(|(mut p, ratio_sum, ratio_n)| {
            if ratio_n > 0 {
                p.avg_lines_per_file = Some(mean(ratio_sum, ratio_n));
            }
            p
        })
        .collect();
    out.sort_by(|a, b| by_count_then_name((a.commits, a.name.as_str()), (b.commits, b.name.as_str())));
    out
}

fn collaborations(records: &[CommitRecord]) -> Vec<Collaboration> {
    let mut per_repo: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    for r in records {
        *per_repo
            .entry(r.repository.as_str())
            .or_default()
            .entry(r.author_name.as_str())
            .or_default() += 1;
    }

    let mut out = Vec::new();
    for (repository, authors) in &per_repo {
        let authors: Vec<(&str, u64)> = authors.iter().map(|(a, n)| (*a, *n)).collect();
        for (i, (first, first_n)) in authors.iter().enumerate() {
            for (second, second_n) in &authors[i + 1..] {
                out.push(Collaboration {
                    authors: (first.to_string(), second.to_string()),
                    repository: repository.to_string(),
                    commit_pairs: first_n * second_n,
                });
            }
        }
    }
    out.sort_by(|a, b| b.commit_pairs.cmp(&a.commit_pairs));
    out
}

fn hour_of(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(SECONDS_PER_HOUR), 0).unwrap_or(ts)
}

fn activity(records: &[CommitRecord]) -> Vec<ActivityBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, ActivityBucket> = BTreeMap::new();
    for r in records {
        let hour = hour_of(r.timestamp);
        let bucket = buckets.entry(hour).or_insert_with(|| ActivityBucket {
            hour,
            commits: 0,
            by_type: BTreeMap::new(),
        });
        bucket.commits += 1;
        *bucket.by_type.entry(r.commit_type).or_default() += 1;
    }
    buckets.into_values().collect()
}

fn language_correlations(records: &[CommitRecord]) -> Vec<LanguageCorrelation> {
    let mut acc: BTreeMap<&str, (LanguageCorrelation, u64)> = BTreeMap::new();
    for r in records {
        let (c, added) = acc.entry(r.primary_language.as_str()).or_insert_with(|| {
            let correlation = LanguageCorrelation {
                language: r.primary_language.clone(),
                commits: 0,
                avg_lines_added: 0.0,
                repositories: BTreeMap::new(),
            };
            (correlation, 0)
        });
        c.commits += 1;
        *added += u64::from(r.lines_added);
        *c.repositories.entry(r.repository.clone()).or_default() += 1;
    }

    let mut out: Vec<LanguageCorrelation> = acc
        .into_values()
        .map(|(mut c, added)| {
            c.avg_lines_added = mean(added as f64, c.commits);
            c
        })
        .collect();
    out.sort_by(|a, b| by_count_then_name((a.commits, a.language.as_str()), (b.commits, b.language.as_str())));
    out
}
