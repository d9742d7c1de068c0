//! Remote manifest construction
//!
//! A remote manifest is a fresh snapshot of the hub, built per invocation by
//! listing each code type in scope and then fetching every listed resource.
//! It is never cached between runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::filename::derive_filename;
use crate::gateway::{RemoteGateway, RemoteSource};
use crate::resource::{CodeType, Resource, ResourceId};
use crate::sync::{SyncScope, acquire, task_error};
use crate::{Error, Result};

/// One fetched resource with its content hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub id: ResourceId,
    pub kind: CodeType,
    pub name: String,
    pub namespace: String,
    pub version: u64,
    pub hash: String,
    pub source: String,
}

impl RemoteEntry {
    fn new(resource: Resource, fetched: RemoteSource) -> Self {
        Self {
            id: resource.id,
            kind: resource.kind,
            name: resource.name,
            namespace: resource.namespace,
            version: fetched.version,
            hash: hub_fs::compute_content_hash(&fetched.source),
            source: fetched.source,
        }
    }

    /// Filename this resource gets when it is first written locally.
    ///
    /// Tracked resources keep their manifest filename whatever the hub
    /// later calls them, so this only matters for untracked ones.
    pub fn derived_filename(&self) -> Result<String> {
        derive_filename(&Resource {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        })
    }
}

/// Snapshot of the hub for the code types in scope
#[derive(Debug, Default)]
pub struct RemoteManifest {
    pub app: BTreeMap<ResourceId, RemoteEntry>,
    pub driver: BTreeMap<ResourceId, RemoteEntry>,
    /// Listed resources that could not be fetched
    pub failures: BTreeMap<(CodeType, ResourceId), Error>,
}

impl RemoteManifest {
    /// Build a snapshot of every resource in `scope`.
    pub async fn build(
        gateway: Arc<dyn RemoteGateway>,
        scope: &SyncScope,
        concurrency: usize,
    ) -> Result<Self> {
        Self::build_filtered(gateway, scope, concurrency, |_, _| true).await
    }

    /// Build a snapshot, fetching only listed resources accepted by `wanted`.
    ///
    /// Listing a type is foundational and any failure there aborts the build.
    /// A failed fetch only lands in [`failures`](Self::failures).
    pub async fn build_filtered<F>(
        gateway: Arc<dyn RemoteGateway>,
        scope: &SyncScope,
        concurrency: usize,
        wanted: F,
    ) -> Result<Self>
    where
        F: Fn(CodeType, ResourceId) -> bool + Send,
    {
        let mut remote = RemoteManifest::default();
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for kind in scope.kinds() {
            let listed = gateway.list_resources(kind).await?;
            tracing::debug!(kind = %kind, count = listed.len(), "listed remote resources");

            for resource in listed {
                if !scope.includes(kind, resource.id) || !wanted(kind, resource.id) {
                    continue;
                }

                let permit = acquire(&semaphore).await?;
                let gateway = Arc::clone(&gateway);

                join_set.spawn(async move {
                    let fetched = gateway.fetch_resource(kind, resource.id).await;
                    drop(permit);
                    (kind, resource, fetched)
                });
            }
        }

        while let Some(joined) = join_set.join_next().await {
            let (kind, resource, fetched) = joined.map_err(task_error)?;

            match fetched {
                Ok(fetched) => {
                    let entry = RemoteEntry::new(resource, fetched);
                    remote.section_mut(kind).insert(entry.id, entry);
                }
                Err(e) => {
                    tracing::warn!(kind = %kind, id = resource.id, error = %e, "failed to fetch remote resource");
                    remote.failures.insert((kind, resource.id), e);
                }
            }
        }

        Ok(remote)
    }

    pub fn section(&self, kind: CodeType) -> &BTreeMap<ResourceId, RemoteEntry> {
        match kind {
            CodeType::App => &self.app,
            CodeType::Driver => &self.driver,
        }
    }

    fn section_mut(&mut self, kind: CodeType) -> &mut BTreeMap<ResourceId, RemoteEntry> {
        match kind {
            CodeType::App => &mut self.app,
            CodeType::Driver => &mut self.driver,
        }
    }

    pub fn get(&self, kind: CodeType, id: ResourceId) -> Option<&RemoteEntry> {
        self.section(kind).get(&id)
    }

    /// Remove and return the failure recorded for a resource, if any.
    pub fn take_failure(&mut self, kind: CodeType, id: ResourceId) -> Option<Error> {
        self.failures.remove(&(kind, id))
    }
}
