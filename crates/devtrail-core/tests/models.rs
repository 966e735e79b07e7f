//! Tests for core data models and the interchange file

use chrono::{TimeZone, Utc};
use devtrail_core::interchange::{read_records, write_records};
use devtrail_core::{
    classify_commit, derive_id, sanitize_message, CommitDraft, CommitRecord, CommitType, CoreError,
};
use std::collections::HashSet;
use tempfile::TempDir;

// ── fixtures ─────────────────────────────────────────────────────────────────

const HASH: &str = "abcdef1234567890abcdef1234567890abcdef12";

fn make_record(hash: &str, message: &str) -> CommitRecord {
    CommitRecord::from_draft(CommitDraft {
        hash: hash.to_string(),
        repository: "parser".to_string(),
        author_name: "Jane Doe".to_string(),
        author_email_anonymized: "j***@example.com".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        message_sanitized: sanitize_message(message),
        commit_type: classify_commit(message),
        files_changed: 3,
        lines_added: 10,
        lines_deleted: 2,
        primary_language: "rust".to_string(),
    })
    .unwrap()
}

// ── identifier ───────────────────────────────────────────────────────────────

#[test]
fn test_derive_id_is_deterministic() {
    assert_eq!(derive_id(HASH).unwrap(), derive_id(HASH).unwrap());
}

#[test]
fn test_derive_id_injective_over_prefixes() {
    let hashes: Vec<String> = (0..256u32)
        .map(|i| format!("{:016x}{}", i * 7919, "0".repeat(24)))
        .collect();
    let ids: HashSet<String> = hashes.iter().map(|h| derive_id(h).unwrap()).collect();
    assert_eq!(ids.len(), hashes.len());
}

// ── record shape ─────────────────────────────────────────────────────────────

#[test]
fn test_end_to_end_record_fields() {
    let r = make_record(HASH, "Fix bug in parser");
    assert_eq!(r.memory_id, "git_abcdef1234567890");
    assert_eq!(r.commit_type, CommitType::Bugfix);
    assert_eq!(r.files_changed, 3);
    assert_eq!(r.lines_added, 10);
    assert_eq!(r.lines_deleted, 2);
    assert_eq!(r.total_changes(), 12);
    assert_eq!(r.short_hash(), "abcdef12");
}

#[test]
fn test_json_field_names() {
    let value = serde_json::to_value(make_record(HASH, "Add parser")).unwrap();
    for field in [
        "hash",
        "memory_id",
        "repository",
        "author_name",
        "author_email_anonymized",
        "timestamp",
        "message_sanitized",
        "commit_type",
        "files_changed",
        "lines_added",
        "lines_deleted",
        "primary_language",
    ] {
        assert!(value.get(field).is_some(), "missing field {}", field);
    }
    assert_eq!(value["commit_type"], "feature");
    assert_eq!(value["timestamp"], "2024-05-01T12:00:00Z");
}

#[test]
fn test_embedding_text_and_search_content() {
    let r = make_record(HASH, "Fix bug in parser");
    assert_eq!(r.embedding_text(), "Fix bug in parser parser rust");
    let content = r.search_content();
    assert!(content.contains("Type: bugfix"));
    assert!(content.contains("- Added: 10 lines"));
}

// ── interchange ──────────────────────────────────────────────────────────────

#[test]
fn test_interchange_preserves_records() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("out/commits.json");
    let records = vec![
        make_record(HASH, "Fix bug in parser"),
        make_record("1111111111111111222222222222222233333333", "Write docs"),
    ];

    write_records(&path, &records).unwrap();
    let loaded = read_records(&path).unwrap();

    assert_eq!(loaded.rejected, 0);
    assert_eq!(loaded.records, records);
}

#[test]
fn test_interchange_rejects_tampered_memory_id() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("commits.json");
    let mut bad = make_record(HASH, "Fix bug in parser");
    bad.memory_id = "git_0000000000000000".to_string();
    let good = make_record("1111111111111111222222222222222233333333", "Write docs");

    write_records(&path, &[bad, good.clone()]).unwrap();
    let loaded = read_records(&path).unwrap();

    assert_eq!(loaded.rejected, 1);
    assert_eq!(loaded.records, vec![good]);
}

#[test]
fn test_interchange_missing_file() {
    let tmp = TempDir::new().unwrap();
    let err = read_records(&tmp.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, CoreError::InterchangeNotFound(_)));
}

#[test]
fn test_interchange_rejects_unknown_commit_type() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("commits.json");
    let mut value = serde_json::to_value(vec![make_record(HASH, "Fix")]).unwrap();
    value[0]["commit_type"] = serde_json::Value::from("chore");
    std::fs::write(&path, value.to_string()).unwrap();

    assert!(matches!(
        read_records(&path),
        Err(CoreError::InterchangeFormat { .. })
    ));
}
