//! Command implementations for hub-cli

pub mod list;
pub mod report;
pub mod sync;

pub use list::run_list;
pub use sync::{Output, parse_scope, run_install, run_pull, run_push};
