//! Analyze command implementation

use anyhow::{Context, Result};
use colored::Colorize;
use devtrail_core::interchange;
use devtrail_extract::formatting::format_number;
use devtrail_store::analysis::{analyze, PatternReport};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::path::Path;

use crate::helpers::table;
use crate::output::{ActivityRow, AuthorRow, CollaborationRow, LanguageRow, ProductivityRow};

/// Reads the interchange file and prints commit patterns
pub fn cmd_analyze(input: &Path, limit: usize) -> Result<()> {
    let loaded = interchange::read_records(input)
        .with_context(|| format!("Failed to read interchange file {:?}", input))?;
    if loaded.rejected > 0 {
        log::warn!("{} records rejected while reading {:?}", loaded.rejected, input);
    }
    log::info!("Analyzing {} records from {:?}", loaded.records.len(), input);

    print_patterns(&analyze(&loaded.records), limit);
    Ok(())
}

fn joined<T: Display>(items: &BTreeSet<T>) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

fn section(title: &str) {
    println!("\n{}", title.bright_cyan().bold());
    println!("{}", "━".repeat(60).bright_black());
}

fn print_patterns(report: &PatternReport, limit: usize) {
    if report.repositories.is_empty() {
        println!("  {}", "No commits to analyze".yellow());
        return;
    }

    section("🏭 Repository Productivity");
    let rows: Vec<ProductivityRow> = report.repositories.iter()
        .take(limit)
        .map(|r| ProductivityRow {
            repository: r.name.clone(),
            commits: r.commits,
            lines: format!("+{} -{}", format_number(r.lines_added), format_number(r.lines_deleted)),
            files_per_commit: format!("{:.1}", r.avg_files_per_commit),
            types: r.commit_types.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", "),
        })
        .collect();
    println!("{}", table(rows));

    section("👤 Author Patterns");
    let rows: Vec<AuthorRow> = report.authors.iter()
        .take(limit)
        .map(|a| AuthorRow {
            author: a.name.clone(),
            commits: a.commits,
            languages: joined(&a.languages),
            repositories: joined(&a.repositories),
            lines_per_file: a.avg_lines_per_file
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("{}", table(rows));

    section("🤝 Shared Repositories");
    if report.collaborations.is_empty() {
        println!("  {}", "No repository has more than one author".yellow());
    } else {
        let rows: Vec<CollaborationRow> = report.collaborations.iter()
            .take(limit)
            .map(|c| CollaborationRow {
                authors: format!("{} & {}", c.authors.0, c.authors.1),
                repository: c.repository.clone(),
                commit_pairs: c.commit_pairs,
            })
            .collect();
        println!("{}", table(rows));
    }

    section("🕐 Hourly Activity");
    // most recent hours
    let skip = report.activity.len().saturating_sub(limit);
    let rows: Vec<ActivityRow> = report.activity.iter()
        .skip(skip)
        .map(|b| ActivityRow {
            hour: b.hour.format("%Y-%m-%d %H:00").to_string(),
            commits: b.commits,
            by_type: b.by_type.iter()
                .map(|(t, n)| format!("{}={}", t.as_str(), n))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    println!("{}", table(rows));

    section("🗣️ Languages by Repository");
    let rows: Vec<LanguageRow> = report.languages.iter()
        .take(limit)
        .map(|l| LanguageRow {
            language: l.language.clone(),
            commits: l.commits,
            avg_added: format!("{:.1}", l.avg_lines_added),
            repositories: l.repositories.iter()
                .map(|(repo, n)| format!("{} ({})", repo, n))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    println!("{}", table(rows));
}
