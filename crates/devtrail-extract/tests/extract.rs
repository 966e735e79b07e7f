//! Extraction against a temporary git repository

mod common;

use anyhow::Result;
use common::{build_fixture, now};
use devtrail_core::{CommitType, StatMode};
use devtrail_extract::{ExtractError, Extractor};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_repo() -> Result<(TempDir, PathBuf, common::Fixture)> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("parser");
    std::fs::create_dir_all(&path)?;
    let fixture = build_fixture(&path)?;
    Ok((tmp, path, fixture))
}

// ── window / merges ───────────────────────────────────────────────────────────

#[test]
fn test_extract_skips_merges_and_old_commits() -> Result<()> {
    let (_tmp, path, fixture) = fixture_repo()?;
    let extractor = Extractor::new(14, StatMode::Exact).with_now(now());

    let records = extractor.try_extract(&path)?;
    let hashes: Vec<String> = records.iter().map(|r| r.hash.clone()).collect();

    assert_eq!(
        hashes,
        vec![
            fixture.c2.to_string(),
            fixture.side.to_string(),
            fixture.c1.to_string()
        ]
    );
    Ok(())
}

#[test]
fn test_extract_wide_window_includes_initial_commit() -> Result<()> {
    let (_tmp, path, _) = fixture_repo()?;
    let extractor = Extractor::new(365, StatMode::Exact).with_now(now());

    let records = extractor.try_extract(&path)?;
    assert_eq!(records.len(), 4);
    assert_eq!(records.last().unwrap().message_sanitized, "Initial commit");
    Ok(())
}

// ── record contents ──────────────────────────────────────────────────────────

#[test]
fn test_extract_record_fields() -> Result<()> {
    let (_tmp, path, fixture) = fixture_repo()?;
    let records = Extractor::new(14, StatMode::Exact)
        .with_now(now())
        .try_extract(&path)?;

    let c1 = records
        .iter()
        .find(|r| r.hash == fixture.c1.to_string())
        .unwrap();
    assert_eq!(c1.memory_id, format!("git_{}", &c1.hash[..16]));
    assert_eq!(c1.repository, "parser");
    assert_eq!(c1.author_name, "Jane Doe");
    assert_eq!(c1.author_email_anonymized, "j***@example.com");
    assert_eq!(c1.commit_type, CommitType::Bugfix);
    assert_eq!(c1.files_changed, 3);
    assert_eq!(c1.lines_added, 10);
    assert_eq!(c1.lines_deleted, 0);
    assert_eq!(c1.primary_language, "rust");
    assert_eq!(c1.timestamp.timestamp(), common::ago(48));

    let c2 = &records[0];
    assert_eq!(c2.message_sanitized, "Add new lexer [REDACTED] table");
    assert_eq!(c2.commit_type, CommitType::Feature);
    assert_eq!((c2.files_changed, c2.lines_added, c2.lines_deleted), (1, 2, 2));

    let side = &records[1];
    assert_eq!(side.commit_type, CommitType::Update);
    assert_eq!((side.files_changed, side.lines_added, side.lines_deleted), (1, 1, 0));
    Ok(())
}

#[test]
fn test_extract_is_repeatable() -> Result<()> {
    let (_tmp, path, _) = fixture_repo()?;
    let extractor = Extractor::new(14, StatMode::Exact).with_now(now());

    assert_eq!(extractor.try_extract(&path)?, extractor.try_extract(&path)?);
    Ok(())
}

#[test]
fn test_glyph_mode_matches_exact_on_small_diffs() -> Result<()> {
    let (_tmp, path, _) = fixture_repo()?;
    let exact = Extractor::new(14, StatMode::Exact)
        .with_now(now())
        .try_extract(&path)?;
    let glyph = Extractor::new(14, StatMode::Glyph)
        .with_now(now())
        .try_extract(&path)?;

    assert_eq!(exact, glyph);
    Ok(())
}

// ── failures ─────────────────────────────────────────────────────────────────

#[test]
fn test_extract_non_repository() -> Result<()> {
    let tmp = TempDir::new()?;
    let extractor = Extractor::new(14, StatMode::Exact).with_now(now());

    let err = extractor.try_extract(tmp.path()).unwrap_err();
    assert!(matches!(err, ExtractError::Repository { .. }));
    assert!(extractor.extract(tmp.path()).is_empty());
    Ok(())
}

#[test]
fn test_extract_all_counts_failed_repositories() -> Result<()> {
    let (tmp, path, _) = fixture_repo()?;
    let broken = tmp.path().join("broken");
    std::fs::create_dir_all(&broken)?;

    let extraction = Extractor::new(14, StatMode::Exact)
        .with_now(now())
        .extract_all(&[broken, path]);

    assert_eq!(extraction.records.len(), 3);
    assert_eq!(extraction.stats.failed_repositories, 1);
    assert_eq!(extraction.stats.per_repository.get("parser"), Some(&3));
    assert_eq!(extraction.stats.per_repository.get("broken"), Some(&0));
    assert_eq!(extraction.stats.by_language.get("rust"), Some(&3));
    assert_eq!(extraction.stats.by_type.get(&CommitType::Bugfix), Some(&1));
    assert_eq!(extraction.stats.lines_added, 13);
    assert_eq!(extraction.stats.lines_deleted, 2);
    assert_eq!(extraction.stats.skipped, 0);
    Ok(())
}
