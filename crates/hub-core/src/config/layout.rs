//! Resolved project directory layout

use std::path::{Path, PathBuf};

use super::LayoutSection;
use crate::manifest::ManifestEntry;
use crate::resource::CodeType;

/// Absolute locations of everything a sync touches.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    app_dir: PathBuf,
    driver_dir: PathBuf,
    vendor_dir: PathBuf,
    manifest: PathBuf,
}

impl Layout {
    pub fn new(root: &Path, section: &LayoutSection) -> Self {
        Self {
            root: root.to_path_buf(),
            app_dir: root.join(&section.app_dir),
            driver_dir: root.join(&section.driver_dir),
            vendor_dir: root.join(&section.vendor_dir),
            manifest: root.join(&section.manifest),
        }
    }

    /// Layout with default directory names under `root`.
    pub fn with_defaults(root: &Path) -> Self {
        Self::new(root, &LayoutSection::default())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest
    }

    pub fn vendor_dir(&self) -> &Path {
        &self.vendor_dir
    }

    /// Directory holding sources of `kind`.
    pub fn type_dir(&self, kind: CodeType) -> &Path {
        match kind {
            CodeType::App => &self.app_dir,
            CodeType::Driver => &self.driver_dir,
        }
    }

    /// Where the source for `filename` of `kind` lives.
    pub fn source_path(&self, kind: CodeType, filename: &str) -> PathBuf {
        self.type_dir(kind).join(filename)
    }

    /// Where the source for a manifest entry lives.
    ///
    /// Vendored entries store a project-relative path instead of a bare name.
    pub fn entry_path(&self, kind: CodeType, entry: &ManifestEntry) -> PathBuf {
        if entry.vendored {
            self.root.join(&entry.filename)
        } else {
            self.source_path(kind, &entry.filename)
        }
    }

    /// Express `path` relative to the project root, `/`-separated.
    ///
    /// Returns `None` when `path` is outside the project.
    pub fn relative_to_root(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}
