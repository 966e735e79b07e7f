//! Command implementations

mod analyze;
mod extract;
mod import;
mod run;
mod validate;

pub use analyze::cmd_analyze;
pub use extract::cmd_extract;
pub use import::cmd_import;
pub use run::cmd_run;
pub use validate::cmd_validate;
