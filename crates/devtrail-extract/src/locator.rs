//! Repository discovery

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::ExtractError;

/// Lists the git repositories directly under `root`, sorted by name.
///
/// Children without a `.git` entry are ignored. Children whose directory
/// name is in `excluded` are skipped with a notice.
pub fn locate(root: &Path, excluded: &BTreeSet<String>) -> Result<Vec<PathBuf>, ExtractError> {
    if !root.exists() {
        return Err(ExtractError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ExtractError::NotADirectory(root.to_path_buf()));
    }

    let entries = std::fs::read_dir(root).map_err(|source| ExtractError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut repos = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() || !path.join(".git").exists() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if excluded.contains(&name) {
            log::info!("Skipping excluded repository: {}", name);
            continue;
        }
        repos.push(path);
    }

    repos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    log::info!("Found {} git repositories in {:?}", repos.len(), root);
    Ok(repos)
}

/// Directory name used as the `repository` field.
pub fn repository_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
