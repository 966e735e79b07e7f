//! Extract command implementation

use anyhow::{Context, Result};
use colored::Colorize;
use devtrail_core::{interchange, Settings};
use devtrail_extract::{formatting::format_number, locate, Extraction, ExtractionStats, Extractor};

use crate::helpers::{configure_threads, table};
use crate::output::{RepositoryRow, TypeRow};

/// Extracts recent commits and writes the interchange file
pub fn cmd_extract(settings: &Settings, threads: Option<usize>) -> Result<()> {
    let num_threads = configure_threads(threads)?;
    log::info!("Using {} threads for parallel extraction", num_threads);

    let extraction = extract_to_file(settings)?;
    print_extraction(&extraction.stats);
    println!(
        "\n{} {}",
        "💾 Written to".bright_cyan(),
        settings.extract.output.display().to_string().bold()
    );
    Ok(())
}

/// Locates, extracts and writes; shared with `run`
pub(crate) fn extract_to_file(settings: &Settings) -> Result<Extraction> {
    let cfg = &settings.extract;
    log::info!(
        "Extracting commits from the last {} days under {:?}",
        cfg.since_days,
        cfg.root
    );

    let repos = locate(&cfg.root, &cfg.exclude)
        .with_context(|| format!("Failed to locate repositories under {:?}", cfg.root))?;

    let extraction = Extractor::new(cfg.since_days, cfg.stat_mode).extract_all(&repos);

    interchange::write_records(&cfg.output, &extraction.records)
        .context("Failed to write interchange file")?;
    Ok(extraction)
}

pub(crate) fn print_extraction(stats: &ExtractionStats) {
    println!("\n{}", "📊 Extraction Summary".bright_cyan().bold());
    println!("{}", "━".repeat(60).bright_black());

    if stats.per_repository.is_empty() {
        println!("  {}", "No repositories found".yellow());
    } else {
        let rows: Vec<RepositoryRow> = stats.per_repository.iter()
            .map(|(repository, &commits)| RepositoryRow {
                repository: repository.clone(),
                commits,
            })
            .collect();
        println!("{}", table(rows));
    }

    if !stats.by_type.is_empty() {
        let rows: Vec<TypeRow> = stats.by_type.iter()
            .map(|(commit_type, &commits)| TypeRow {
                commit_type: commit_type.as_str().to_string(),
                commits,
            })
            .collect();
        println!("{}", table(rows));
    }

    println!("  {}: {}", "Commits".bright_yellow(), format_number(stats.total_commits() as u64).bold());
    println!(
        "  {}: +{} -{} in {} files",
        "Lines".bright_yellow(),
        format_number(stats.lines_added).green(),
        format_number(stats.lines_deleted).red(),
        format_number(stats.files_changed)
    );
    if stats.skipped > 0 {
        println!("  {}: {}", "Skipped commits".bright_yellow(), stats.skipped.to_string().yellow());
    }
    if stats.failed_repositories > 0 {
        println!(
            "  {}: {}",
            "Failed repositories".bright_yellow(),
            stats.failed_repositories.to_string().red()
        );
    }
}
