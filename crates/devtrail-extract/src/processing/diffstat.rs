//! Per-commit change statistics

use devtrail_core::StatMode;
use git2::{Commit, DiffStatsFormat, Repository};

/// Width used when rendering `--stat` bars for glyph counting.
const STAT_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeStats {
    pub files_changed: u32,
    pub lines_added: u32,
    pub lines_deleted: u32,
}

/// Computes change statistics of `commit` against its first parent
/// (or the empty tree for a root commit).
pub fn commit_stats(
    repo: &Repository,
    commit: &Commit,
    mode: StatMode,
) -> Result<ChangeStats, git2::Error> {
    let tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
    let stats = diff.stats()?;

    match mode {
        StatMode::Exact => Ok(ChangeStats {
            files_changed: saturate(stats.files_changed()),
            lines_added: saturate(stats.insertions()),
            lines_deleted: saturate(stats.deletions()),
        }),
        StatMode::Glyph => {
            let buf = stats.to_buf(DiffStatsFormat::FULL, STAT_WIDTH)?;
            Ok(parse_stat_glyphs(buf.as_str().unwrap_or_default()))
        }
    }
}

/// Approximates change statistics from a rendered `--stat` block.
///
/// Every line holding a `|` and at least one `+` or `-` counts as one
/// file; its `+` and `-` characters are added to the line totals. Bars are
/// scaled for large changes and file names may contain `-`, so the
/// numbers are only exact for small, plainly named diffs.
pub fn parse_stat_glyphs(text: &str) -> ChangeStats {
    let mut stats = ChangeStats::default();
    for line in text.lines() {
        if !line.contains('|') || !(line.contains('+') || line.contains('-')) {
            continue;
        }
        let plus = line.chars().filter(|&c| c == '+').count();
        let minus = line.chars().filter(|&c| c == '-').count();
        stats.files_changed = stats.files_changed.saturating_add(1);
        stats.lines_added = stats.lines_added.saturating_add(saturate(plus));
        stats.lines_deleted = stats.lines_deleted.saturating_add(saturate(minus));
    }
    stats
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
