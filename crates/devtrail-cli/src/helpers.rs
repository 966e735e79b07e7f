//! Helper functions shared by the commands

use anyhow::{Context, Result};
use devtrail_core::Settings;
use devtrail_store::{stores, Backend, CommitStore, Embedder, OllamaEmbedder, StoreError};
use futures::future::join_all;
use std::sync::Arc;
use tabled::{Table, Tabled, settings::{Style, Color, Modify, object::Rows}};

/// A backend paired with its connection attempt
pub type Connection = (Backend, Result<Box<dyn CommitStore>, StoreError>);

/// Configures the global rayon pool; returns the thread count in use
pub fn configure_threads(threads: Option<usize>) -> Result<usize> {
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .context("Failed to configure thread pool")?;
        Ok(num_threads)
    } else {
        Ok(rayon::current_num_threads())
    }
}

/// Builds the embedding client used by the relational backend
pub fn embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let client = OllamaEmbedder::new(&settings.embedding)
        .context("Failed to create embedding client")?;
    log::info!("Embedding commits with model {}", client.model());
    Ok(Arc::new(client))
}

/// Connects to every backend in `backends` concurrently
pub async fn connect_all(
    settings: &Settings,
    backends: &[Backend],
    embedder: Arc<dyn Embedder>,
) -> Vec<Connection> {
    let attempts = backends.iter().map(|&backend| {
        let embedder = Arc::clone(&embedder);
        async move {
            let result = stores::connect(backend, settings, embedder).await;
            if let Err(e) = &result {
                log::warn!("{} unavailable: {}", backend, e);
            }
            (backend, result)
        }
    });
    join_all(attempts).await
}

/// Renders rows in the CLI table style
pub fn table<T: Tabled>(rows: Vec<T>) -> Table {
    let mut table = Table::new(rows);
    table.with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Color::FG_BRIGHT_CYAN));
    table
}

/// Joins per-backend counts as `postgres=3, neo4j=2`
pub fn format_counts(counts: &[(Backend, u64)]) -> String {
    counts.iter()
        .map(|(backend, count)| format!("{}={}", backend, count))
        .collect::<Vec<_>>()
        .join(", ")
}
