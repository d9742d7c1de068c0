//! Filesystem primitives for hubsync
//!
//! Provides the content hasher used for change detection and safe I/O
//! operations for source files and the manifest store.

pub mod checksum;
pub mod error;
pub mod io;

pub use checksum::compute_content_hash;
pub use error::{Error, Result};
