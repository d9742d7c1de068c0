//! Error types for hub-core

use std::path::PathBuf;

use crate::resource::{CodeType, ResourceId};
use crate::sync::FailureReason;

/// Result type for hub-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hub-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown resource type argument
    #[error("Invalid type \"{value}\"")]
    InvalidType { value: String },

    /// Non-numeric resource id argument
    #[error("ID must be a number, got \"{value}\"")]
    InvalidId { value: String },

    /// A remote listing entry that cannot be mapped to a local file
    #[error("Invalid resource: {message}")]
    InvalidResource { message: String },

    /// Resource id does not exist on the hub
    #[error("{kind} {id} not found on the hub")]
    NotFound { kind: CodeType, id: ResourceId },

    /// Non-success status or network failure talking to the hub
    #[error("Hub request failed: {message}")]
    RemoteTransport { message: String },

    /// The hub rejected a saved source (e.g. a compile error)
    #[error("Hub rejected {kind}: {message}")]
    RemoteValidation { kind: CodeType, message: String },

    /// Local edits that are not committed would be overwritten by a pull
    #[error("{} has uncommitted changes; please commit first", path.display())]
    UncommittedChanges { path: PathBuf },

    /// The hub moved ahead of the manifest since the last pull
    #[error("{filename} is out of date (local version {local}, hub version {remote}); pull first")]
    VersionConflict {
        filename: String,
        local: u64,
        remote: u64,
    },

    /// Push of a tracked resource whose file is gone
    #[error("No local script {}", path.display())]
    LocalFileMissing { path: PathBuf },

    /// Push of a tracked resource the hub no longer has
    #[error("{kind} {filename} does not exist on the hub; ignoring")]
    MissingRemote { kind: CodeType, filename: String },

    /// Install of a file that is already tracked
    #[error("{filename} is already tracked as {kind} {id}; use push")]
    AlreadyTracked {
        kind: CodeType,
        id: ResourceId,
        filename: String,
    },

    /// Manifest store exists but cannot be parsed
    #[error("Failed to parse manifest at {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    /// Invalid configuration file
    #[error("Invalid configuration at {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// No hub host configured
    #[error("Hub host is not configured; set HUBITAT_HOST or [hub] host in hubsync.toml")]
    MissingHost,

    /// A reconciliation task panicked or was aborted
    #[error("Sync task failed: {message}")]
    Task { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from hub-fs
    #[error(transparent)]
    Fs(#[from] hub_fs::Error),

    /// Git error from hub-git
    #[error(transparent)]
    Git(#[from] hub_git::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error for a per-resource report entry.
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            Error::InvalidType { .. } | Error::InvalidId { .. } => FailureReason::Validation,
            Error::InvalidResource { .. } => FailureReason::InvalidResource,
            Error::NotFound { .. } => FailureReason::NotFound,
            Error::RemoteTransport { .. } => FailureReason::Transport,
            Error::RemoteValidation { .. } => FailureReason::Rejected,
            Error::UncommittedChanges { .. } => FailureReason::UncommittedChanges,
            Error::VersionConflict { .. } => FailureReason::OutOfDate,
            Error::LocalFileMissing { .. } => FailureReason::MissingLocal,
            Error::MissingRemote { .. } => FailureReason::MissingRemote,
            _ => FailureReason::Local,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::RemoteTransport {
            message: message.into(),
        }
    }
}
