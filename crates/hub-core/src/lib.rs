//! Synchronization core for hubsync
//!
//! This crate keeps a local tree of app and driver sources consistent with
//! the copies hosted on a hub, implementing:
//!
//! - **Resource model**: closed type enums parsed once at the edge
//! - **Manifest**: durable record of the last-synced state per resource
//! - **Remote gateway**: the trait the hub is reached through
//! - **Conflict policy**: hash, version and uncommitted-change rules
//! - **SyncEngine**: pull, push and install
//!
//! # Architecture
//!
//! ```text
//!                  hub-cli
//!                     |
//!        +--------- hub-core ---------+
//!        |            |               |
//!     hub-fs       hub-git      RemoteGateway <- hub-client
//! ```

pub mod config;
pub mod error;
pub mod filename;
pub mod gateway;
pub mod manifest;
pub mod policy;
pub mod remote;
pub mod resource;
pub mod sync;

pub use config::{HubConfig, Layout, MissingLocalPolicy, PullNewPolicy};
pub use error::{Error, Result};
pub use filename::derive_filename;
pub use gateway::{RemoteGateway, RemoteSource, SaveTarget, SavedResource};
pub use manifest::{Manifest, ManifestEntry, ManifestStore};
pub use remote::{RemoteEntry, RemoteManifest};
pub use resource::{CodeType, Resource, ResourceId, ResourceType, parse_id};
pub use sync::{
    Action, FailureReason, InstallTarget, ResourceAction, ResourceFailure, SkipReason, SyncEngine,
    SyncOptions, SyncReport, SyncScope,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn version_conflict_displays_both_versions() {
        let error = Error::VersionConflict {
            filename: "acme-door.groovy".into(),
            local: 2,
            remote: 3,
        };
        let display = error.to_string();
        assert!(display.contains("acme-door.groovy"), "got: {display}");
        assert!(display.contains("pull first"), "got: {display}");
        assert_eq!(error.failure_reason(), FailureReason::OutOfDate);
    }

    #[test]
    fn uncommitted_changes_asks_for_commit() {
        let error = Error::UncommittedChanges {
            path: PathBuf::from("drivers/acme-door.groovy"),
        };
        assert!(error.to_string().contains("commit first"));
        assert_eq!(error.failure_reason(), FailureReason::UncommittedChanges);
    }
}
