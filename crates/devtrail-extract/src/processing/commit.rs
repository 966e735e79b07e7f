//! Single commit → CommitRecord

use chrono::{DateTime, Utc};
use devtrail_core::{
    anonymize_email, classify_commit, sanitize_message, CommitDraft, CommitRecord, StatMode,
};
use git2::{Commit, Repository};

use super::diffstat::commit_stats;
use crate::error::ExtractError;

/// Repository-wide values shared by every commit of one repository.
pub(crate) struct RepoContext<'a> {
    pub repo: &'a Repository,
    pub name: &'a str,
    pub language: &'a str,
    pub stat_mode: StatMode,
}

/// Builds the sanitized, classified record for one commit.
pub(crate) fn build_record(ctx: &RepoContext<'_>, commit: &Commit) -> Result<CommitRecord, ExtractError> {
    let hash = commit.id().to_string();
    let parse_err = |reason: String| ExtractError::Parse {
        commit: hash.clone(),
        reason,
    };

    let author = commit.author();
    let seconds = author.when().seconds();
    let timestamp = DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| parse_err(format!("timestamp {} out of range", seconds)))?;

    let subject = commit
        .summary_bytes()
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .unwrap_or_default();

    let stats = commit_stats(ctx.repo, commit, ctx.stat_mode)
        .map_err(|e| parse_err(format!("diff stats: {}", e)))?;

    let draft = CommitDraft {
        hash: hash.clone(),
        repository: ctx.name.to_string(),
        author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
        author_email_anonymized: anonymize_email(&String::from_utf8_lossy(author.email_bytes())),
        timestamp,
        message_sanitized: sanitize_message(&subject),
        commit_type: classify_commit(&subject),
        files_changed: stats.files_changed,
        lines_added: stats.lines_added,
        lines_deleted: stats.lines_deleted,
        primary_language: ctx.language.to_string(),
    };

    CommitRecord::from_draft(draft).map_err(|e| parse_err(e.to_string()))
}
