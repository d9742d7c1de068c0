//! Durable manifest storage

use std::path::PathBuf;

use hub_fs::io;

use super::Manifest;
use crate::{Error, Result};

/// Reads and writes the manifest JSON file.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the manifest, or an empty one if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Manifest> {
        let Some(content) = io::read_text_if_exists(&self.path)? else {
            tracing::debug!(path = %self.path.display(), "no manifest yet; starting empty");
            return Ok(Manifest::new());
        };

        if content.trim().is_empty() {
            return Ok(Manifest::new());
        }

        serde_json::from_str(&content).map_err(|e| Error::ManifestParse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Overwrite the manifest file with `manifest`.
    ///
    /// The write goes through a locked temp file and a rename, so a crash
    /// leaves either the old or the new manifest on disk.
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let mut content = serde_json::to_string_pretty(manifest)?;
        content.push('\n');
        io::write_text(&self.path, &content)?;
        tracing::debug!(path = %self.path.display(), entries = manifest.len(), "saved manifest");
        Ok(())
    }
}
