//! Devtrail Extract - commit history extraction
//!
//! This crate is responsible for:
//! - Finding git repositories under a projects root
//! - Walking each history inside a time window with git2
//! - Computing change statistics and the dominant language
//! - Producing sanitized, classified `CommitRecord`s in parallel

mod error;
mod extractor;
pub mod formatting;
mod language;
mod locator;
mod processing;
mod stats;

pub use error::ExtractError;
pub use extractor::Extractor;
pub use language::{detect_language, UNKNOWN_LANGUAGE};
pub use locator::{locate, repository_name};
pub use processing::diffstat::{parse_stat_glyphs, ChangeStats};
pub use processing::Extraction;
pub use stats::ExtractionStats;
