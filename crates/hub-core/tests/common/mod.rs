//! In-memory collaborators for engine tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hub_core::{
    CodeType, Error, Layout, RemoteGateway, RemoteSource, Resource, ResourceId, Result,
    SaveTarget, SavedResource, SyncEngine, SyncOptions,
};
use hub_git::WorkingTree;
use hub_test_utils::project::TestProject;

#[derive(Debug, Clone)]
pub struct HubResource {
    pub name: String,
    pub namespace: String,
    pub source: String,
    pub version: u64,
}

#[derive(Default)]
struct HubState {
    resources: BTreeMap<(CodeType, ResourceId), HubResource>,
    failing_fetches: BTreeSet<(CodeType, ResourceId)>,
    failing_lists: BTreeSet<CodeType>,
    reject_saves: Option<String>,
    create_as: Option<(String, String)>,
    next_id: ResourceId,
    fetch_calls: usize,
    saves: Vec<(CodeType, Option<SaveTarget>, String)>,
}

/// A hub held in memory, with switches for scripted failures.
#[derive(Default)]
pub struct FakeHub {
    state: Mutex<HubState>,
}

impl FakeHub {
    pub fn new() -> Arc<Self> {
        let hub = Self::default();
        hub.state.lock().unwrap().next_id = 1000;
        Arc::new(hub)
    }

    /// Put a resource on the hub, replacing any existing one.
    pub fn put(&self, kind: CodeType, id: ResourceId, namespace: &str, name: &str, source: &str, version: u64) {
        self.state.lock().unwrap().resources.insert(
            (kind, id),
            HubResource {
                name: name.to_string(),
                namespace: namespace.to_string(),
                source: source.to_string(),
                version,
            },
        );
    }

    /// Simulate someone saving `source` through the hub UI.
    pub fn edit(&self, kind: CodeType, id: ResourceId, source: &str) {
        let mut state = self.state.lock().unwrap();
        let resource = state.resources.get_mut(&(kind, id)).expect("resource on hub");
        resource.source = source.to_string();
        resource.version += 1;
    }

    pub fn rename(&self, kind: CodeType, id: ResourceId, namespace: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        let resource = state.resources.get_mut(&(kind, id)).expect("resource on hub");
        resource.namespace = namespace.to_string();
        resource.name = name.to_string();
    }

    pub fn delete(&self, kind: CodeType, id: ResourceId) {
        self.state.lock().unwrap().resources.remove(&(kind, id));
    }

    pub fn fail_fetch(&self, kind: CodeType, id: ResourceId) {
        self.state.lock().unwrap().failing_fetches.insert((kind, id));
    }

    pub fn fail_list(&self, kind: CodeType) {
        self.state.lock().unwrap().failing_lists.insert(kind);
    }

    pub fn reject_saves(&self, message: &str) {
        self.state.lock().unwrap().reject_saves = Some(message.to_string());
    }

    /// Name and namespace the next created resource is listed under.
    pub fn create_as(&self, namespace: &str, name: &str) {
        self.state.lock().unwrap().create_as = Some((namespace.to_string(), name.to_string()));
    }

    pub fn resource(&self, kind: CodeType, id: ResourceId) -> Option<HubResource> {
        self.state.lock().unwrap().resources.get(&(kind, id)).cloned()
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn save_calls(&self) -> usize {
        self.state.lock().unwrap().saves.len()
    }

    pub fn saves(&self) -> Vec<(CodeType, Option<SaveTarget>, String)> {
        self.state.lock().unwrap().saves.clone()
    }
}

#[async_trait]
impl RemoteGateway for FakeHub {
    async fn list_resources(&self, kind: CodeType) -> Result<Vec<Resource>> {
        let state = self.state.lock().unwrap();
        if state.failing_lists.contains(&kind) {
            return Err(Error::transport(format!("listing {kind}s: connection refused")));
        }
        Ok(state
            .resources
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|((_, id), r)| Resource {
                id: *id,
                kind,
                name: r.name.clone(),
                namespace: r.namespace.clone(),
            })
            .collect())
    }

    async fn fetch_resource(&self, kind: CodeType, id: ResourceId) -> Result<RemoteSource> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if state.failing_fetches.contains(&(kind, id)) {
            return Err(Error::transport(format!("fetching {kind} {id}: timed out")));
        }
        let resource = state
            .resources
            .get(&(kind, id))
            .ok_or(Error::NotFound { kind, id })?;
        Ok(RemoteSource {
            source: resource.source.clone(),
            version: resource.version,
        })
    }

    async fn save_resource(
        &self,
        kind: CodeType,
        target: Option<SaveTarget>,
        source: &str,
    ) -> Result<SavedResource> {
        let mut state = self.state.lock().unwrap();
        state.saves.push((kind, target, source.to_string()));

        if let Some(message) = state.reject_saves.clone() {
            return Err(Error::RemoteValidation { kind, message });
        }

        match target {
            Some(target) => {
                let resource = state
                    .resources
                    .get_mut(&(kind, target.id))
                    .ok_or(Error::NotFound { kind, id: target.id })?;
                resource.source = source.to_string();
                resource.version += 1;
                Ok(SavedResource {
                    id: target.id,
                    version: resource.version,
                })
            }
            None => {
                let id = state.next_id;
                state.next_id += 1;
                let (namespace, name) = state
                    .create_as
                    .take()
                    .unwrap_or_else(|| ("acme".to_string(), format!("Resource {id}")));
                state.resources.insert(
                    (kind, id),
                    HubResource {
                        name,
                        namespace,
                        source: source.to_string(),
                        version: 1,
                    },
                );
                Ok(SavedResource { id, version: 1 })
            }
        }
    }
}

/// Working tree whose uncommitted files are set by the test.
#[derive(Default)]
pub struct FakeTree {
    uncommitted: Mutex<BTreeSet<PathBuf>>,
}

impl FakeTree {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mark_uncommitted(&self, path: impl Into<PathBuf>) {
        self.uncommitted.lock().unwrap().insert(path.into());
    }
}

impl WorkingTree for FakeTree {
    fn has_uncommitted_changes(&self, path: &Path) -> hub_git::Result<bool> {
        Ok(self.uncommitted.lock().unwrap().contains(path))
    }
}

pub fn engine(project: &TestProject, hub: &Arc<FakeHub>, tree: &Arc<FakeTree>) -> SyncEngine {
    engine_with(project, hub, tree, SyncOptions::default())
}

pub fn engine_with(
    project: &TestProject,
    hub: &Arc<FakeHub>,
    tree: &Arc<FakeTree>,
    options: SyncOptions,
) -> SyncEngine {
    SyncEngine::new(
        Layout::with_defaults(project.root()),
        options,
        Arc::clone(hub) as Arc<dyn RemoteGateway>,
        Arc::clone(tree) as Arc<dyn WorkingTree>,
    )
}

pub fn sha512(content: &str) -> String {
    hub_fs::compute_content_hash(content)
}
