//! Pull, push and install
//!
//! - **engine**: the [`SyncEngine`] driving each operation
//! - **report**: per-resource actions and failures
//! - **scope**: which resources an invocation covers

mod engine;
mod report;
mod scope;

pub use engine::{InstallTarget, SyncEngine, SyncOptions};
pub use report::{Action, FailureReason, ResourceAction, ResourceFailure, SkipReason, SyncReport};
pub use scope::SyncScope;

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::Error;

/// Wait for a fan-out slot.
pub(crate) async fn acquire(semaphore: &Arc<Semaphore>) -> crate::Result<OwnedSemaphorePermit> {
    Arc::clone(semaphore)
        .acquire_owned()
        .await
        .map_err(|e| Error::Task {
            message: e.to_string(),
        })
}

pub(crate) fn task_error(e: tokio::task::JoinError) -> Error {
    Error::Task {
        message: e.to_string(),
    }
}
