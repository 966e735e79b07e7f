//! Keyword-based commit classification

use crate::models::CommitType;

/// Keyword groups in precedence order; the first group with a hit wins.
const KEYWORD_GROUPS: [(CommitType, &[&str]); 6] = [
    (CommitType::Bugfix, &["fix", "bug", "error", "issue", "patch"]),
    (CommitType::Feature, &["add", "new", "feature", "implement", "create"]),
    (CommitType::Refactor, &["refactor", "cleanup", "reorganize", "restructure"]),
    (CommitType::Test, &["test", "spec", "coverage", "unit", "integration"]),
    (CommitType::Documentation, &["doc", "readme", "comment", "documentation"]),
    (CommitType::Update, &["update", "upgrade", "bump", "version"]),
];

/// Classifies a commit by substring search over its lowercased subject.
pub fn classify_commit(subject: &str) -> CommitType {
    let lower = subject.to_lowercase();
    KEYWORD_GROUPS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(kind, _)| *kind)
        .unwrap_or(CommitType::General)
}
