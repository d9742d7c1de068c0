//! Project context: root directory, configuration and collaborators
//!
//! Everything a command needs is resolved here once and passed down
//! explicitly; nothing below the CLI reads the environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hub_client::HubClient;
use hub_core::{HubConfig, SyncEngine};
use hub_git::GitWorkingTree;

use crate::error::Result;

/// Environment variable overriding `[hub] host`
pub const HOST_ENV: &str = "HUBITAT_HOST";

/// A resolved project
#[derive(Debug, Clone)]
pub struct Context {
    root: PathBuf,
    config: HubConfig,
}

impl Context {
    /// Resolve the project at `root` (or the current directory).
    ///
    /// Loads `.env` from the project root, falling back to the usual
    /// search from the current directory, then `hubsync.toml`.
    pub fn load(root: Option<PathBuf>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let root = match root {
            Some(root) if root.is_absolute() => root,
            Some(root) => cwd.join(root),
            None => cwd,
        };

        match dotenvy::from_path(root.join(".env")) {
            Ok(()) => tracing::debug!(root = %root.display(), "loaded .env from project root"),
            Err(_) => {
                if let Ok(path) = dotenvy::dotenv() {
                    tracing::debug!(path = %path.display(), "loaded .env");
                }
            }
        }

        let config = HubConfig::load(&root)?.with_host_override(std::env::var(HOST_ENV).ok());
        Ok(Self { root, config })
    }

    /// Resolve a user-supplied path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// HTTP gateway for the configured hub.
    pub fn client(&self) -> Result<HubClient> {
        let host = self.config.host()?;
        tracing::debug!(host = %host, timeout = ?self.config.timeout(), "connecting to hub");
        Ok(HubClient::new(&host, self.config.timeout())?)
    }

    /// Sync engine wired to the hub and the local git working tree.
    pub fn engine(&self) -> Result<SyncEngine> {
        let client = self.client()?;
        Ok(SyncEngine::new(
            self.config.layout(&self.root),
            self.config.sync_options(),
            Arc::new(client),
            Arc::new(GitWorkingTree::new()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn relative_paths_resolve_against_root() {
        let dir = TempDir::new().unwrap();
        let ctx = Context {
            root: dir.path().to_path_buf(),
            config: HubConfig::default(),
        };
        assert_eq!(ctx.resolve(Path::new("apps/a.groovy")), dir.path().join("apps/a.groovy"));
    }

    #[test]
    fn client_requires_host() {
        let ctx = Context {
            root: PathBuf::from("/nonexistent"),
            config: HubConfig::default(),
        };
        assert!(ctx.client().is_err());
    }

    #[test]
    fn engine_uses_configured_layout() {
        let dir = TempDir::new().unwrap();
        let ctx = Context {
            root: dir.path().to_path_buf(),
            config: HubConfig::default().with_host_override(Some("10.0.0.2".into())),
        };
        let engine = ctx.engine().unwrap();
        assert_eq!(engine.layout().manifest_path(), dir.path().join("manifest.json").as_path());
    }
}
