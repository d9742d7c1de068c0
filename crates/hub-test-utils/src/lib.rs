//! Shared test utilities for the hubsync workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`git`]: git repository fixtures
//! - [`project`]: [`TestProject`](project::TestProject) for a temporary sync project directory

pub mod git;
pub mod project;
