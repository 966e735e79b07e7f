//! Devtrail Core - Shared data model for commit replication
//!
//! This crate defines the `CommitRecord` written to every store, the
//! identifier scheme that keys it, the privacy filters and classifier
//! applied during extraction, the interchange file format and the
//! pipeline configuration.

mod classify;
pub mod config;
mod error;
mod identifier;
pub mod interchange;
mod models;
mod sanitize;

pub use classify::classify_commit;
pub use config::{Settings, StatMode, TemporalScope};
pub use error::{CoreError, ValidationError};
pub use identifier::{derive_id, verify_id, MEMORY_ID_HASH_LEN, MEMORY_ID_PREFIX};
pub use models::{CommitDraft, CommitRecord, CommitType};
pub use sanitize::{anonymize_email, sanitize_message, MAX_MESSAGE_CHARS, REDACTION_MARKER};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(hash: &str) -> CommitDraft {
        CommitDraft {
            hash: hash.to_string(),
            repository: "parser".to_string(),
            author_name: "Jane Doe".to_string(),
            author_email_anonymized: anonymize_email("jdoe@example.com"),
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            message_sanitized: sanitize_message("Fix bug in parser"),
            commit_type: classify_commit("Fix bug in parser"),
            files_changed: 3,
            lines_added: 10,
            lines_deleted: 2,
            primary_language: "rust".to_string(),
        }
    }

    #[test]
    fn test_record_from_draft_derives_id() {
        let record =
            CommitRecord::from_draft(draft("abcdef1234567890abcdef1234567890abcdef12")).unwrap();
        assert_eq!(record.memory_id, "git_abcdef1234567890");
        assert_eq!(record.commit_type, CommitType::Bugfix);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_record_from_draft_rejects_short_hash() {
        assert!(CommitRecord::from_draft(draft("abc")).is_err());
    }
}
