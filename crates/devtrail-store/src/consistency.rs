//! Cross-store consistency validation
//!
//! Reads the aggregate state of every backend, compares them, and derives
//! a few summary insights. Never writes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use futures::future::join_all;

use crate::backend::Backend;
use crate::error::StoreError;
use crate::store::{CommitStore, StoreSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Available(StoreSummary),
    Unavailable { reason: String },
}

#[derive(Debug, Clone)]
pub struct BackendState {
    pub backend: Backend,
    pub status: BackendStatus,
}

impl BackendState {
    pub fn summary(&self) -> Option<&StoreSummary> {
        match &self.status {
            BackendStatus::Available(summary) => Some(summary),
            BackendStatus::Unavailable { .. } => None,
        }
    }
}

/// Two backends disagreeing on the total commit count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMismatch {
    pub left: Backend,
    pub left_total: u64,
    pub right: Backend,
    pub right_total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dimension {
    Repository,
    Language,
    Author,
    CommitType,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dimension::Repository => "repository",
            Dimension::Language => "language",
            Dimension::Author => "author",
            Dimension::CommitType => "commit type",
        })
    }
}

/// A grouping key whose commit count differs between backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMismatch {
    pub dimension: Dimension,
    pub key: String,
    /// Count per available backend; absent keys count as zero
    pub counts: Vec<(Backend, u64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insights {
    pub total_commits: u64,
    pub repositories: usize,
    /// Repository with the most commits
    pub most_active: Option<(String, u64)>,
    /// Repository with the most changed lines
    pub most_productive: Option<(String, u64)>,
    pub dominant_language: Option<(String, u64)>,
    pub authors: usize,
    pub temporal_sequences: Option<u64>,
    /// Whether the search backend holds any commit document
    pub search_populated: bool,
}

#[derive(Debug, Clone)]
pub struct ConsistencyReport {
    pub backends: Vec<BackendState>,
    pub count_mismatches: Vec<CountMismatch>,
    /// Backends held responsible for the count mismatches
    pub attributed: Vec<Backend>,
    pub key_mismatches: Vec<KeyMismatch>,
    pub insights: Insights,
}

impl ConsistencyReport {
    /// All three backends answered and agree everywhere.
    pub fn is_consistent(&self) -> bool {
        let all_available = Backend::ALL.iter().all(|b| {
            self.backends
                .iter()
                .any(|s| s.backend == *b && s.summary().is_some())
        });
        all_available && self.count_mismatches.is_empty() && self.key_mismatches.is_empty()
    }

    pub fn state(&self, backend: Backend) -> Option<&BackendState> {
        self.backends.iter().find(|s| s.backend == backend)
    }
}

/// Queries every source and compares what they hold.
pub async fn validate(
    sources: Vec<(Backend, Result<Box<dyn CommitStore>, StoreError>)>,
) -> ConsistencyReport {
    let queries = sources.into_iter().map(|(backend, source)| async move {
        let status = match source {
            Ok(store) => match store.summary_aggregates().await {
                Ok(summary) => BackendStatus::Available(summary),
                Err(e) => BackendStatus::Unavailable {
                    reason: e.to_string(),
                },
            },
            Err(e) => BackendStatus::Unavailable {
                reason: e.to_string(),
            },
        };
        if let BackendStatus::Unavailable { reason } = &status {
            log::error!("{} unavailable for validation: {}", backend, reason);
        }
        BackendState { backend, status }
    });

    build_report(join_all(queries).await)
}

/// Compares already collected backend states.
pub fn build_report(backends: Vec<BackendState>) -> ConsistencyReport {
    let available: Vec<(Backend, &StoreSummary)> = backends
        .iter()
        .filter_map(|s| s.summary().map(|summary| (s.backend, summary)))
        .collect();

    let mut count_mismatches = Vec::new();
    for (i, (left, ls)) in available.iter().enumerate() {
        for (right, rs) in &available[i + 1..] {
            if ls.total != rs.total {
                count_mismatches.push(CountMismatch {
                    left: *left,
                    left_total: ls.total,
                    right: *right,
                    right_total: rs.total,
                });
            }
        }
    }

    let totals: Vec<(Backend, u64)> = available.iter().map(|(b, s)| (*b, s.total)).collect();
    let attributed = attribute(&totals);

    let mut key_mismatches = Vec::new();
    let repos: Vec<(Backend, BTreeMap<String, u64>)> = available
        .iter()
        .map(|(b, s)| {
            let counts = s
                .by_repository
                .iter()
                .map(|(k, a)| (k.clone(), a.commits))
                .collect();
            (*b, counts)
        })
        .collect();
    compare_keys(Dimension::Repository, &repos, &mut key_mismatches);
    let languages: Vec<_> = available
        .iter()
        .map(|(b, s)| (*b, s.by_language.clone()))
        .collect();
    compare_keys(Dimension::Language, &languages, &mut key_mismatches);
    let authors: Vec<_> = available
        .iter()
        .map(|(b, s)| (*b, s.by_author.clone()))
        .collect();
    compare_keys(Dimension::Author, &authors, &mut key_mismatches);
    let commit_types: Vec<_> = available
        .iter()
        .map(|(b, s)| (*b, s.by_commit_type.clone()))
        .collect();
    compare_keys(Dimension::CommitType, &commit_types, &mut key_mismatches);

    for m in &count_mismatches {
        log::warn!(
            "Count mismatch: {} has {}, {} has {}",
            m.left,
            m.left_total,
            m.right,
            m.right_total
        );
    }

    let insights = insights(&available);
    ConsistencyReport {
        backends,
        count_mismatches,
        attributed,
        key_mismatches,
        insights,
    }
}

/// Backends whose total differs from the majority total.
///
/// When no total has a strict majority, the highest of the most frequent
/// totals is taken as the reference, so lower counts are blamed.
pub fn attribute(totals: &[(Backend, u64)]) -> Vec<Backend> {
    let mut frequency: BTreeMap<u64, usize> = BTreeMap::new();
    for (_, total) in totals {
        *frequency.entry(*total).or_default() += 1;
    }
    if frequency.len() < 2 {
        return Vec::new();
    }

    let reference = frequency
        .iter()
        .max_by_key(|(total, count)| (**count, **total))
        .map(|(total, _)| *total);

    totals
        .iter()
        .filter(|(_, total)| Some(*total) != reference)
        .map(|(backend, _)| *backend)
        .collect()
}

fn compare_keys(
    dimension: Dimension,
    maps: &[(Backend, BTreeMap<String, u64>)],
    out: &mut Vec<KeyMismatch>,
) {
    let keys: BTreeSet<&String> = maps.iter().flat_map(|(_, m)| m.keys()).collect();
    for key in keys {
        let counts: Vec<(Backend, u64)> = maps
            .iter()
            .map(|(b, m)| (*b, m.get(key).copied().unwrap_or(0)))
            .collect();
        if counts.windows(2).any(|w| w[0].1 != w[1].1) {
            out.push(KeyMismatch {
                dimension,
                key: key.clone(),
                counts,
            });
        }
    }
}

/// Largest value, ties going to the alphabetically first key.
fn top<I: IntoIterator<Item = (String, u64)>>(items: I) -> Option<(String, u64)> {
    let mut best: Option<(String, u64)> = None;
    for (key, value) in items {
        let better = match &best {
            Some((best_key, best_value)) => {
                value > *best_value || (value == *best_value && key < *best_key)
            }
            None => true,
        };
        if better {
            best = Some((key, value));
        }
    }
    best
}

fn insights(available: &[(Backend, &StoreSummary)]) -> Insights {
    // Fullest backend is the reference
    let mut reference: Option<&StoreSummary> = None;
    for (_, summary) in available {
        if reference.map_or(true, |r| summary.total > r.total) {
            reference = Some(*summary);
        }
    }

    let temporal_sequences = available.iter().find_map(|(_, s)| s.temporal_edges);
    let search_populated = available
        .iter()
        .any(|(b, s)| *b == Backend::Elasticsearch && s.total > 0);

    let Some(summary) = reference else {
        return Insights {
            temporal_sequences,
            search_populated,
            ..Insights::default()
        };
    };

    Insights {
        total_commits: summary.total,
        repositories: summary.by_repository.len(),
        most_active: top(summary
            .by_repository
            .iter()
            .map(|(k, a)| (k.clone(), a.commits))),
        most_productive: top(summary
            .by_repository
            .iter()
            .map(|(k, a)| (k.clone(), a.total_changes()))),
        dominant_language: top(summary.by_language.iter().map(|(k, n)| (k.clone(), *n))),
        authors: summary.by_author.len(),
        temporal_sequences,
        search_populated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RepositoryActivity;

    fn summary(total: u64, repos: &[(&str, u64, u64)]) -> StoreSummary {
        let mut s = StoreSummary {
            total,
            ..StoreSummary::default()
        };
        for (name, commits, changes) in repos {
            s.by_repository.insert(
                name.to_string(),
                RepositoryActivity {
                    commits: *commits,
                    lines_added: *changes,
                    lines_deleted: 0,
                },
            );
        }
        s
    }

    fn available(backend: Backend, s: StoreSummary) -> BackendState {
        BackendState {
            backend,
            status: BackendStatus::Available(s),
        }
    }

    #[test]
    fn test_attribute_majority() {
        let totals = [
            (Backend::Postgres, 4),
            (Backend::Neo4j, 5),
            (Backend::Elasticsearch, 5),
        ];
        assert_eq!(attribute(&totals), vec![Backend::Postgres]);
    }

    #[test]
    fn test_attribute_tie_blames_lower() {
        let totals = [(Backend::Neo4j, 7), (Backend::Elasticsearch, 3)];
        assert_eq!(attribute(&totals), vec![Backend::Elasticsearch]);
    }

    #[test]
    fn test_attribute_agreement() {
        let totals = [(Backend::Neo4j, 3), (Backend::Elasticsearch, 3)];
        assert!(attribute(&totals).is_empty());
    }

    #[test]
    fn test_top_breaks_ties_by_name() {
        let items = vec![("web".to_string(), 3), ("api".to_string(), 3), ("cli".to_string(), 1)];
        assert_eq!(top(items), Some(("api".to_string(), 3)));
        assert_eq!(top(Vec::new()), None);
    }

    #[test]
    fn test_report_insights() {
        let s = summary(5, &[("api", 3, 10), ("web", 2, 400)]);
        let mut graph = s.clone();
        graph.temporal_edges = Some(2);
        let report = build_report(vec![
            available(Backend::Postgres, s.clone()),
            available(Backend::Neo4j, graph),
            available(Backend::Elasticsearch, s),
        ]);

        assert!(report.count_mismatches.is_empty());
        assert_eq!(report.insights.total_commits, 5);
        assert_eq!(report.insights.repositories, 2);
        assert_eq!(report.insights.most_active, Some(("api".to_string(), 3)));
        assert_eq!(report.insights.most_productive, Some(("web".to_string(), 400)));
        assert_eq!(report.insights.temporal_sequences, Some(2));
        assert!(report.insights.search_populated);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_unavailable_backend_is_inconsistent() {
        let s = summary(1, &[("api", 1, 1)]);
        let report = build_report(vec![
            available(Backend::Postgres, s.clone()),
            BackendState {
                backend: Backend::Neo4j,
                status: BackendStatus::Unavailable {
                    reason: "connection refused".to_string(),
                },
            },
            available(Backend::Elasticsearch, s),
        ]);

        assert!(report.count_mismatches.is_empty());
        assert!(!report.is_consistent());
    }

    #[test]
    fn test_commit_type_breakdown_is_compared() {
        let mut graph = summary(2, &[("api", 2, 4)]);
        graph.by_commit_type.insert("bugfix".to_string(), 2);
        let mut search = graph.clone();
        search.by_commit_type.clear();
        search.by_commit_type.insert("bugfix".to_string(), 1);
        search.by_commit_type.insert("feature".to_string(), 1);

        let report = build_report(vec![
            available(Backend::Neo4j, graph),
            available(Backend::Elasticsearch, search),
        ]);
        let keys: Vec<&str> = report
            .key_mismatches
            .iter()
            .filter(|m| m.dimension == Dimension::CommitType)
            .map(|m| m.key.as_str())
            .collect();
        assert_eq!(keys, vec!["bugfix", "feature"]);
        assert!(report.count_mismatches.is_empty());
    }

    #[test]
    fn test_key_mismatch_counts_missing_as_zero() {
        let report = build_report(vec![
            available(Backend::Postgres, summary(1, &[("api", 1, 1)])),
            available(Backend::Neo4j, summary(1, &[("web", 1, 1)])),
        ]);

        let repo_keys: Vec<&str> = report
            .key_mismatches
            .iter()
            .filter(|m| m.dimension == Dimension::Repository)
            .map(|m| m.key.as_str())
            .collect();
        assert_eq!(repo_keys, vec!["api", "web"]);
        assert_eq!(
            report.key_mismatches[0].counts,
            vec![(Backend::Postgres, 1), (Backend::Neo4j, 0)]
        );
    }
}
