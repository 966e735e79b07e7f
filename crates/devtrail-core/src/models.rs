//! Core data models for devtrail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::identifier::{derive_id, verify_id};

/// Commit category derived from the subject line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Bugfix,
    Feature,
    Refactor,
    Test,
    Documentation,
    Update,
    General,
}

impl CommitType {
    pub const ALL: [CommitType; 7] = [
        CommitType::Bugfix,
        CommitType::Feature,
        CommitType::Refactor,
        CommitType::Test,
        CommitType::Documentation,
        CommitType::Update,
        CommitType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Bugfix => "bugfix",
            CommitType::Feature => "feature",
            CommitType::Refactor => "refactor",
            CommitType::Test => "test",
            CommitType::Documentation => "documentation",
            CommitType::Update => "update",
            CommitType::General => "general",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted commit, as written to every store.
///
/// Records are immutable once built: every field is either copied from
/// version control or derived deterministically from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full commit SHA (hex)
    pub hash: String,

    /// `"git_" + hash[..16]`, the merge key in every backend
    pub memory_id: String,

    /// Name of the repository directory
    pub repository: String,

    pub author_name: String,

    /// First character of the local part plus the domain
    pub author_email_anonymized: String,

    /// Commit time in UTC
    pub timestamp: DateTime<Utc>,

    /// Redacted subject line, at most 200 characters
    pub message_sanitized: String,

    pub commit_type: CommitType,

    pub files_changed: u32,
    pub lines_added: u32,
    pub lines_deleted: u32,

    /// Dominant language of the whole repository, not of this commit
    pub primary_language: String,
}

/// Raw commit fields before identifier derivation.
#[derive(Debug, Clone)]
pub struct CommitDraft {
    pub hash: String,
    pub repository: String,
    pub author_name: String,
    pub author_email_anonymized: String,
    pub timestamp: DateTime<Utc>,
    pub message_sanitized: String,
    pub commit_type: CommitType,
    pub files_changed: u32,
    pub lines_added: u32,
    pub lines_deleted: u32,
    pub primary_language: String,
}

impl CommitRecord {
    /// Builds a record, deriving `memory_id` from the hash.
    pub fn from_draft(draft: CommitDraft) -> Result<Self, ValidationError> {
        let memory_id = derive_id(&draft.hash)?;
        Ok(Self {
            hash: draft.hash,
            memory_id,
            repository: draft.repository,
            author_name: draft.author_name,
            author_email_anonymized: draft.author_email_anonymized,
            timestamp: draft.timestamp,
            message_sanitized: draft.message_sanitized,
            commit_type: draft.commit_type,
            files_changed: draft.files_changed,
            lines_added: draft.lines_added,
            lines_deleted: draft.lines_deleted,
            primary_language: draft.primary_language,
        })
    }

    /// Checks the identifier invariant on a record that came from outside
    /// (the interchange file).
    pub fn validate(&self) -> Result<(), ValidationError> {
        verify_id(&self.hash, &self.memory_id)
    }

    /// First 8 characters of the hash, for log lines
    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }

    pub fn total_changes(&self) -> u64 {
        u64::from(self.lines_added) + u64::from(self.lines_deleted)
    }

    /// Text handed to the embedding service and stored next to the vector.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {}",
            self.message_sanitized, self.repository, self.primary_language
        )
    }

    /// Human-readable summary indexed for full-text search.
    pub fn search_content(&self) -> String {
        format!(
            r#"Git Commit: {repo}

Type: {kind}
Message: {message}
Repository: {repo}
Language: {lang}

Changes:
- Files: {files}
- Added: {added} lines
- Deleted: {deleted} lines

Author: {author}
Timestamp: {ts}"#,
            repo = self.repository,
            kind = self.commit_type,
            message = self.message_sanitized,
            lang = self.primary_language,
            files = self.files_changed,
            added = self.lines_added,
            deleted = self.lines_deleted,
            author = self.author_name,
            ts = self.timestamp.to_rfc3339(),
        )
    }
}

impl fmt::Display for CommitRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {} (+{}/-{})",
            self.repository,
            self.short_hash(),
            self.commit_type,
            self.message_sanitized,
            self.lines_added,
            self.lines_deleted
        )
    }
}
