//! Remote gateway trait
//!
//! The reconciliation engine only ever talks to the hub through this trait.
//! `hub-client` implements it over HTTP; tests implement it in memory.

use async_trait::async_trait;

use crate::Result;
use crate::resource::{CodeType, Resource, ResourceId};

/// Source text and version of a remote resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    pub source: String,
    pub version: u64,
}

/// Identity of an existing resource being updated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTarget {
    pub id: ResourceId,
    /// Version the update is based on
    pub version: u64,
}

/// Identity and version assigned by the hub after a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedResource {
    pub id: ResourceId,
    pub version: u64,
}

/// Listing, fetching and saving code resources on the hub.
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Enumerate every resource of `kind` on the hub.
    async fn list_resources(&self, kind: CodeType) -> Result<Vec<Resource>>;

    /// Fetch the source and version of one resource.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](crate::Error::NotFound) if the id does not exist,
    /// [`Error::RemoteTransport`](crate::Error::RemoteTransport) on any other
    /// failed request.
    async fn fetch_resource(&self, kind: CodeType, id: ResourceId) -> Result<RemoteSource>;

    /// Create (`target` is `None`) or update a resource.
    ///
    /// The hub does not detect version conflicts; callers check versions
    /// before saving.
    ///
    /// # Errors
    ///
    /// [`Error::RemoteValidation`](crate::Error::RemoteValidation) carrying the
    /// hub's message when it rejects the source.
    async fn save_resource(
        &self,
        kind: CodeType,
        target: Option<SaveTarget>,
        source: &str,
    ) -> Result<SavedResource>;
}
