//! Error types for hub-git

use std::path::PathBuf;

/// Result type for hub-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hub-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid vendored path '{spec}': {reason}")]
    InvalidVendorPath { spec: String, reason: String },

    #[error("Repository at {path} has no working directory")]
    BareRepository { path: PathBuf },

    #[error("Checkout at {path} is not on a branch")]
    DetachedHead { path: PathBuf },

    #[error("Checkout at {path} has uncommitted changes")]
    DirtyCheckout { path: PathBuf },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Pull failed: {message}")]
    PullFailed { message: String },

    #[error("Cannot fast-forward: {message}")]
    CannotFastForward { message: String },
}
