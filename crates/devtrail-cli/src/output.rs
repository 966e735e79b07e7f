//! Output formatting structures for CLI display

use tabled::Tabled;

/// Commits kept per repository after extraction
#[derive(Tabled)]
pub struct RepositoryRow {
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Commits")]
    pub commits: usize,
}

/// Commits per classification
#[derive(Tabled)]
pub struct TypeRow {
    #[tabled(rename = "Type")]
    pub commit_type: String,
    #[tabled(rename = "Commits")]
    pub commits: usize,
}

/// Outcome of importing into one backend
#[derive(Tabled)]
pub struct ImportRow {
    #[tabled(rename = "Backend")]
    pub backend: String,
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Cleared")]
    pub cleared: String,
    #[tabled(rename = "Imported")]
    pub imported: String,
    #[tabled(rename = "Skipped")]
    pub skipped: String,
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

/// Aggregate state of one backend during validation
#[derive(Tabled)]
pub struct BackendRow {
    #[tabled(rename = "Backend")]
    pub backend: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Commits")]
    pub commits: String,
    #[tabled(rename = "Repositories")]
    pub repositories: String,
    #[tabled(rename = "Authors")]
    pub authors: String,
}

/// A grouping key the backends disagree on
#[derive(Tabled)]
pub struct KeyMismatchRow {
    #[tabled(rename = "Dimension")]
    pub dimension: String,
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Counts")]
    pub counts: String,
}

/// Productivity of one repository
#[derive(Tabled)]
pub struct ProductivityRow {
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Commits")]
    pub commits: u64,
    #[tabled(rename = "Lines")]
    pub lines: String,
    #[tabled(rename = "Files/commit")]
    pub files_per_commit: String,
    #[tabled(rename = "Types")]
    pub types: String,
}

/// How one author works
#[derive(Tabled)]
pub struct AuthorRow {
    #[tabled(rename = "Author")]
    pub author: String,
    #[tabled(rename = "Commits")]
    pub commits: u64,
    #[tabled(rename = "Languages")]
    pub languages: String,
    #[tabled(rename = "Repositories")]
    pub repositories: String,
    #[tabled(rename = "Lines/file")]
    pub lines_per_file: String,
}

/// Two authors sharing a repository
#[derive(Tabled)]
pub struct CollaborationRow {
    #[tabled(rename = "Authors")]
    pub authors: String,
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Commit pairs")]
    pub commit_pairs: u64,
}

/// Commits inside one hour
#[derive(Tabled)]
pub struct ActivityRow {
    #[tabled(rename = "Hour (UTC)")]
    pub hour: String,
    #[tabled(rename = "Commits")]
    pub commits: u64,
    #[tabled(rename = "By type")]
    pub by_type: String,
}

/// Where a language is used
#[derive(Tabled)]
pub struct LanguageRow {
    #[tabled(rename = "Language")]
    pub language: String,
    #[tabled(rename = "Commits")]
    pub commits: u64,
    #[tabled(rename = "Avg added")]
    pub avg_added: String,
    #[tabled(rename = "Repositories")]
    pub repositories: String,
}
