//! Import command implementation

use anyhow::{bail, Context, Result};
use colored::Colorize;
use devtrail_core::{interchange, Settings};
use devtrail_extract::formatting::{format_duration, format_number};
use devtrail_store::{import, Backend, ImportBatch, ImportReport, StoreError};
use futures::future::join_all;
use std::path::Path;

use crate::helpers::{connect_all, embedder, table};
use crate::output::ImportRow;
use crate::Target;

/// Import outcome of a single backend
pub(crate) type ImportResult = (Backend, Result<ImportReport, StoreError>);

/// Loads the interchange file and replaces the target backends' contents
pub async fn cmd_import(settings: &Settings, target: Target, input: &Path) -> Result<()> {
    let loaded = interchange::read_records(input)
        .with_context(|| format!("Failed to read interchange file {:?}", input))?;
    if loaded.rejected > 0 {
        log::warn!("{} records rejected while reading {:?}", loaded.rejected, input);
    }
    log::info!("Loaded {} records from {:?}", loaded.records.len(), input);

    let batch = ImportBatch::new(loaded.records);
    let results = import_into(settings, &target.backends(), &batch).await?;

    print_import_results(&results);
    ensure_imported(&results)
}

/// Runs the import against every backend concurrently
pub(crate) async fn import_into(
    settings: &Settings,
    backends: &[Backend],
    batch: &ImportBatch,
) -> Result<Vec<ImportResult>> {
    let embedder = embedder(settings)?;
    let connections = connect_all(settings, backends, embedder).await;

    let runs = connections.into_iter().map(|(backend, connection)| async move {
        let result = match connection {
            Ok(store) => import(store.as_ref(), batch).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            if e.is_fatal() {
                log::error!("{} import aborted: {}", backend, e);
            } else {
                log::error!("{} import failed: {}", backend, e);
            }
        }
        (backend, result)
    });

    Ok(join_all(runs).await)
}

/// Fails when any backend import was aborted
pub(crate) fn ensure_imported(results: &[ImportResult]) -> Result<()> {
    let failed: Vec<String> = results.iter()
        .filter(|(_, result)| result.is_err())
        .map(|(backend, _)| backend.to_string())
        .collect();
    if !failed.is_empty() {
        bail!("{} of {} backend imports failed: {}", failed.len(), results.len(), failed.join(", "));
    }
    Ok(())
}

/// Short label for the Status column
fn status(result: &Result<ImportReport, StoreError>) -> &'static str {
    match result {
        Ok(report) if report.skipped > 0 => "partial",
        Ok(_) => "ok",
        Err(e) if e.is_fatal() => "unreachable",
        Err(_) => "failed",
    }
}

pub(crate) fn print_import_results(results: &[ImportResult]) {
    println!("\n{}", "📥 Import Summary".bright_cyan().bold());
    println!("{}", "━".repeat(60).bright_black());

    let rows: Vec<ImportRow> = results.iter()
        .map(|(backend, result)| match result {
            Ok(report) => ImportRow {
                backend: backend.to_string(),
                role: backend.role().to_string(),
                cleared: format_number(report.cleared),
                imported: format_number(report.imported as u64),
                skipped: report.skipped.to_string(),
                time: format_duration(report.elapsed),
                status: status(result).to_string(),
            },
            Err(_) => ImportRow {
                backend: backend.to_string(),
                role: backend.role().to_string(),
                cleared: "-".to_string(),
                imported: "-".to_string(),
                skipped: "-".to_string(),
                time: "-".to_string(),
                status: status(result).to_string(),
            },
        })
        .collect();
    println!("{}", table(rows));

    for (backend, result) in results {
        if let Err(e) = result {
            eprintln!("{} {}: {}", "❌".red(), backend.to_string().bold(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report(backend: Backend) -> ImportReport {
        ImportReport {
            backend,
            cleared: 0,
            imported: 5,
            skipped: 0,
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_ensure_imported_all_ok() {
        let results = vec![
            (Backend::Postgres, Ok(report(Backend::Postgres))),
            (Backend::Neo4j, Ok(report(Backend::Neo4j))),
        ];
        assert!(ensure_imported(&results).is_ok());
    }

    #[test]
    fn test_ensure_imported_reports_aborted_backend() {
        let results = vec![
            (Backend::Postgres, Ok(report(Backend::Postgres))),
            (Backend::Neo4j, Err(StoreError::connection(Backend::Neo4j, "refused"))),
        ];
        let err = ensure_imported(&results).unwrap_err();
        assert!(err.to_string().contains("neo4j"));
        assert!(err.to_string().contains("1 of 2"));
    }

    #[test]
    fn test_status_labels() {
        let mut partial = report(Backend::Postgres);
        partial.skipped = 2;
        assert_eq!(status(&Ok(report(Backend::Postgres))), "ok");
        assert_eq!(status(&Ok(partial)), "partial");
        assert_eq!(
            status(&Err(StoreError::connection(Backend::Neo4j, "refused"))),
            "unreachable"
        );
        assert_eq!(
            status(&Err(StoreError::write(Backend::Neo4j, "constraint"))),
            "failed"
        );
    }
}
