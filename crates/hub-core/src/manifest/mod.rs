//! Manifest of last-synced resource state
//!
//! The manifest records, per code type and resource id, which local file a
//! resource lives in and the version and hash it had when it was last
//! synchronized in either direction. It is the single persisted source of
//! truth for "what was last synced".

mod store;

pub use store::ManifestStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resource::{CodeType, ResourceId};

/// Entries of one code type, keyed by resource id
pub type ManifestSection = BTreeMap<ResourceId, ManifestEntry>;

/// Synchronization record for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: ResourceId,
    /// File name under the type directory, or a project-relative path for
    /// vendored resources. Set once at creation.
    pub filename: String,
    /// Hub version at the time of the last sync
    pub version: u64,
    /// SHA-512 of the source as of the last sync
    pub hash: String,
    /// Source lives in a vendored git checkout rather than the type directory
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub vendored: bool,
}

impl ManifestEntry {
    pub fn new(id: ResourceId, filename: impl Into<String>, version: u64, hash: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            version,
            hash: hash.into(),
            vendored: false,
        }
    }

    /// Mark the entry as living in a vendored checkout.
    pub fn vendored(mut self) -> Self {
        self.vendored = true;
        self
    }

    /// Copy of this entry after a sync that observed `version` and `hash`.
    ///
    /// The filename is carried over unchanged.
    pub fn synced(&self, version: u64, hash: impl Into<String>) -> Self {
        Self {
            version,
            hash: hash.into(),
            ..self.clone()
        }
    }
}

/// The full manifest: one section per code type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub app: ManifestSection,
    #[serde(default)]
    pub driver: ManifestSection,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, kind: CodeType) -> &ManifestSection {
        match kind {
            CodeType::App => &self.app,
            CodeType::Driver => &self.driver,
        }
    }

    pub fn section_mut(&mut self, kind: CodeType) -> &mut ManifestSection {
        match kind {
            CodeType::App => &mut self.app,
            CodeType::Driver => &mut self.driver,
        }
    }

    pub fn get(&self, kind: CodeType, id: ResourceId) -> Option<&ManifestEntry> {
        self.section(kind).get(&id)
    }

    /// Insert or replace the entry for `kind`, keyed by the entry's id.
    pub fn insert(&mut self, kind: CodeType, entry: ManifestEntry) {
        self.section_mut(kind).insert(entry.id, entry);
    }

    pub fn remove(&mut self, kind: CodeType, id: ResourceId) -> Option<ManifestEntry> {
        self.section_mut(kind).remove(&id)
    }

    /// Find an entry of `kind` by its filename.
    pub fn find_by_filename(&self, kind: CodeType, filename: &str) -> Option<&ManifestEntry> {
        self.section(kind).values().find(|e| e.filename == filename)
    }

    /// Total number of entries across all types
    pub fn len(&self) -> usize {
        self.app.len() + self.driver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
