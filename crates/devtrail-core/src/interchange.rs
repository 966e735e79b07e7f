//! The JSON interchange file between extraction and import

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::CoreError;
use crate::models::CommitRecord;

/// Records loaded from an interchange file.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    /// Records that passed validation, in file order
    pub records: Vec<CommitRecord>,
    /// Records dropped because their identifier did not check out
    pub rejected: usize,
}

/// Writes `records` as a pretty-printed JSON array.
pub fn write_records(path: &Path, records: &[CommitRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .with_context(|| format!("Failed to write records to {:?}", path))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    log::info!("Wrote {} commit records to {:?}", records.len(), path);
    Ok(())
}

/// Reads and validates an interchange file.
///
/// A structurally invalid file fails as a whole. A record whose
/// `memory_id` does not derive from its hash is logged and skipped.
pub fn read_records(path: &Path) -> Result<LoadedRecords, CoreError> {
    if !path.exists() {
        return Err(CoreError::InterchangeNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|_| CoreError::InterchangeNotFound(path.to_path_buf()))?;
    let raw: Vec<CommitRecord> = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        CoreError::InterchangeFormat {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut loaded = LoadedRecords::default();
    for record in raw {
        match record.validate() {
            Ok(()) => loaded.records.push(record),
            Err(e) => {
                log::warn!("Rejecting record {}: {}", record.short_hash(), e);
                loaded.rejected += 1;
            }
        }
    }
    log::info!(
        "Loaded {} commit records from {:?} ({} rejected)",
        loaded.records.len(),
        path,
        loaded.rejected
    );
    Ok(loaded)
}
