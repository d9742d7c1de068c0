//! Version-control collaborator for hubsync
//!
//! Answers "does this file carry uncommitted edits?" for the pull conflict
//! check, and manages git checkouts of vendored (externally-tracked) sources.

pub mod error;
pub mod provider;
pub mod status;
pub mod vendor;

pub use error::{Error, Result};
pub use provider::WorkingTree;
pub use status::GitWorkingTree;
pub use vendor::VendorSource;
