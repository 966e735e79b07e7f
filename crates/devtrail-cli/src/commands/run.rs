//! Run command implementation

use anyhow::Result;
use colored::Colorize;
use devtrail_core::Settings;
use devtrail_store::{Backend, ConsistencyReport, ImportBatch};

use super::extract::{extract_to_file, print_extraction};
use super::import::{ensure_imported, import_into, print_import_results};
use super::validate::{check_consistency, print_report};

/// Extracts, imports into every backend, then validates
pub async fn cmd_run(settings: &Settings) -> Result<()> {
    let extraction = extract_to_file(settings)?;
    print_extraction(&extraction.stats);

    let batch = ImportBatch::new(extraction.records);
    let results = import_into(settings, &Backend::ALL, &batch).await?;
    print_import_results(&results);

    let report = check_consistency(settings).await?;
    print_report(&report);

    ensure_imported(&results)?;

    let skipped: usize = results.iter()
        .filter_map(|(_, result)| result.as_ref().ok())
        .map(|r| r.skipped)
        .sum();
    let problems = run_problems(skipped, &report);
    if problems.is_empty() {
        println!("\n{} Run completed", "✅".green());
    } else {
        println!("\n{} Run finished with problems:", "⚠️ ".yellow());
        for problem in &problems {
            println!("  • {}", problem);
        }
    }
    Ok(())
}

/// Everything that kept the run from a clean finish
fn run_problems(skipped: usize, report: &ConsistencyReport) -> Vec<String> {
    let mut problems = Vec::new();
    if skipped > 0 {
        problems.push(format!("{} records skipped during import", skipped));
    }

    let unavailable: Vec<String> = Backend::ALL.iter()
        .filter(|b| report.state(**b).and_then(|s| s.summary()).is_none())
        .map(|b| b.to_string())
        .collect();
    if !unavailable.is_empty() {
        problems.push(format!("unavailable during validation: {}", unavailable.join(", ")));
    }

    if !report.count_mismatches.is_empty() {
        problems.push(format!(
            "{} commit count mismatches between backends",
            report.count_mismatches.len()
        ));
    }
    if !report.key_mismatches.is_empty() {
        problems.push(format!(
            "{} repository, language, author or type counts differ",
            report.key_mismatches.len()
        ));
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use devtrail_store::consistency::{BackendState, CountMismatch, Dimension, KeyMismatch};
    use devtrail_store::{BackendStatus, Insights, StoreSummary};

    fn report(states: Vec<BackendState>) -> ConsistencyReport {
        ConsistencyReport {
            backends: states,
            count_mismatches: Vec::new(),
            attributed: Vec::new(),
            key_mismatches: Vec::new(),
            insights: Insights::default(),
        }
    }

    fn available(backend: Backend) -> BackendState {
        BackendState {
            backend,
            status: BackendStatus::Available(StoreSummary::default()),
        }
    }

    #[test]
    fn test_clean_run_has_no_problems() {
        let report = report(Backend::ALL.iter().map(|b| available(*b)).collect());
        assert!(run_problems(0, &report).is_empty());
    }

    #[test]
    fn test_inconsistency_without_skips_is_named() {
        let mut report = report(Backend::ALL.iter().map(|b| available(*b)).collect());
        report.count_mismatches.push(CountMismatch {
            left: Backend::Postgres,
            left_total: 3,
            right: Backend::Neo4j,
            right_total: 2,
        });
        report.key_mismatches.push(KeyMismatch {
            dimension: Dimension::Repository,
            key: "api".to_string(),
            counts: vec![(Backend::Postgres, 3), (Backend::Neo4j, 2)],
        });

        let problems = run_problems(0, &report);
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().all(|p| !p.contains("skipped")));
        assert!(problems[0].contains("1 commit count mismatches"));
    }

    #[test]
    fn test_unavailable_backend_is_named() {
        let report = report(vec![
            available(Backend::Postgres),
            BackendState {
                backend: Backend::Neo4j,
                status: BackendStatus::Unavailable { reason: "refused".to_string() },
            },
        ]);

        let problems = run_problems(2, &report);
        assert_eq!(problems[0], "2 records skipped during import");
        assert_eq!(problems[1], "unavailable during validation: neo4j, elasticsearch");
    }
}
