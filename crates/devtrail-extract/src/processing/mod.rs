//! Commit processing logic
//!
//! - Repository walk and parallel fan-out (extraction.rs)
//! - Single commit to record conversion (commit.rs)
//! - Change statistics (diffstat.rs)

mod commit;
pub mod diffstat;
mod extraction;

pub use extraction::Extraction;
