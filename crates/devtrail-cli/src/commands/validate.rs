//! Validate command implementation

use anyhow::{bail, Result};
use colored::Colorize;
use devtrail_core::Settings;
use devtrail_extract::formatting::format_number;
use devtrail_store::{validate, Backend, BackendStatus, ConsistencyReport};

use crate::helpers::{connect_all, embedder, format_counts, table};
use crate::output::{BackendRow, KeyMismatchRow};

/// Compares the backends and prints the report
pub async fn cmd_validate(settings: &Settings, strict: bool) -> Result<()> {
    let report = check_consistency(settings).await?;
    print_report(&report);

    if strict && !report.is_consistent() {
        bail!("Backends are not consistent");
    }
    Ok(())
}

pub(crate) async fn check_consistency(settings: &Settings) -> Result<ConsistencyReport> {
    let embedder = embedder(settings)?;
    let sources = connect_all(settings, &Backend::ALL, embedder).await;
    Ok(validate(sources).await)
}

pub(crate) fn print_report(report: &ConsistencyReport) {
    println!("\n{}", "🔍 Consistency Report".bright_cyan().bold());
    println!("{}", "━".repeat(60).bright_black());

    let rows: Vec<BackendRow> = report.backends.iter()
        .map(|state| match &state.status {
            BackendStatus::Available(summary) => BackendRow {
                backend: state.backend.to_string(),
                status: "available".to_string(),
                commits: format_number(summary.total),
                repositories: summary.by_repository.len().to_string(),
                authors: summary.by_author.len().to_string(),
            },
            BackendStatus::Unavailable { .. } => BackendRow {
                backend: state.backend.to_string(),
                status: "unavailable".to_string(),
                commits: "-".to_string(),
                repositories: "-".to_string(),
                authors: "-".to_string(),
            },
        })
        .collect();
    println!("{}", table(rows));

    for state in &report.backends {
        if let BackendStatus::Unavailable { reason } = &state.status {
            eprintln!("{} {}: {}", "❌".red(), state.backend.to_string().bold(), reason);
        }
    }

    for mismatch in &report.count_mismatches {
        println!(
            "{} {} has {} commits, {} has {}",
            "⚠️ ".yellow(),
            mismatch.left.to_string().bold(),
            mismatch.left_total,
            mismatch.right.to_string().bold(),
            mismatch.right_total
        );
    }
    if !report.attributed.is_empty() {
        let names: Vec<String> = report.attributed.iter().map(|b| b.to_string()).collect();
        println!("  {}: {}", "Likely incomplete".bright_yellow(), names.join(", ").red());
    }

    if !report.key_mismatches.is_empty() {
        let rows: Vec<KeyMismatchRow> = report.key_mismatches.iter()
            .map(|m| KeyMismatchRow {
                dimension: m.dimension.to_string(),
                key: m.key.clone(),
                counts: format_counts(&m.counts),
            })
            .collect();
        println!("{}", table(rows));
    }

    let insights = &report.insights;
    println!("\n{}", "💡 Insights".bright_cyan().bold());
    println!("  {}: {}", "Commits".bright_yellow(), format_number(insights.total_commits).bold());
    println!("  {}: {}", "Repositories".bright_yellow(), insights.repositories);
    if let Some((name, commits)) = &insights.most_active {
        println!("  {}: {} ({} commits)", "Most active".bright_yellow(), name.bold(), commits);
    }
    if let Some((name, lines)) = &insights.most_productive {
        println!("  {}: {} ({} lines changed)", "Most productive".bright_yellow(), name.bold(), format_number(*lines));
    }
    if let Some((language, commits)) = &insights.dominant_language {
        println!("  {}: {} ({} commits)", "Dominant language".bright_yellow(), language.bold(), commits);
    }
    println!("  {}: {}", "Authors".bright_yellow(), insights.authors);
    if let Some(sequences) = insights.temporal_sequences {
        println!("  {}: {}", "Temporal sequences".bright_yellow(), sequences);
    }
    println!(
        "  {}: {}",
        "Full-text search".bright_yellow(),
        if insights.search_populated { "populated".green() } else { "empty".yellow() }
    );

    if report.is_consistent() {
        println!("\n{} All backends agree", "✅".green());
    } else {
        println!("\n{} Backends disagree or are unavailable", "❌".red());
    }
}
