//! Project configuration
//!
//! Configuration is read from an optional `hubsync.toml` at the project
//! root and handed to the gateway and engine as plain values. Nothing in
//! the workspace reads configuration from global state.
//!
//! ```toml
//! [hub]
//! host = "192.168.1.10"
//! timeout_secs = 30
//!
//! [sync]
//! concurrency = 8
//! pull_new = "create"
//! missing_local = "retain"
//!
//! [layout]
//! app_dir = "apps"
//! driver_dir = "drivers"
//! ```

mod layout;

pub use layout::Layout;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sync::SyncOptions;
use crate::{Error, Result};

/// What a pull does with a hub resource the manifest has never seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullNewPolicy {
    /// Write it to its derived filename and start tracking it
    #[default]
    Create,
    /// Leave it alone; only `install` creates entries
    Skip,
}

/// What a push does with a tracked resource whose local file is gone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingLocalPolicy {
    /// Report it and keep the manifest entry
    #[default]
    Retain,
    /// Drop the manifest entry
    Forget,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_clone_base() -> String {
    hub_git::vendor::DEFAULT_CLONE_BASE.to_string()
}

/// `[hub]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSection {
    /// Hub address, `host` or `host:port`
    pub host: Option<String>,
    /// Timeout for each request to the hub
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where vendored `git:` repositories are cloned from
    #[serde(default = "default_clone_base")]
    pub clone_base: String,
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            host: None,
            timeout_secs: default_timeout_secs(),
            clone_base: default_clone_base(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}

/// `[sync]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    /// Maximum number of in-flight hub requests during a bulk operation
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    pub pull_new: PullNewPolicy,
    pub missing_local: MissingLocalPolicy,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            pull_new: PullNewPolicy::default(),
            missing_local: MissingLocalPolicy::default(),
        }
    }
}

/// `[layout]` section; all paths are relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    pub app_dir: PathBuf,
    pub driver_dir: PathBuf,
    pub vendor_dir: PathBuf,
    pub manifest: PathBuf,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            app_dir: PathBuf::from("apps"),
            driver_dir: PathBuf::from("drivers"),
            vendor_dir: PathBuf::from(".repos"),
            manifest: PathBuf::from("manifest.json"),
        }
    }
}

/// Parsed `hubsync.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub hub: HubSection,
    pub sync: SyncSection,
    pub layout: LayoutSection,
}

impl HubConfig {
    /// Name of the configuration file at the project root
    pub const FILE_NAME: &'static str = "hubsync.toml";

    /// Load `hubsync.toml` from `root`; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(Self::FILE_NAME);
        match hub_fs::io::read_text_if_exists(&path)? {
            Some(content) => Self::parse(&content).map_err(|message| Error::Config {
                path: path.clone(),
                message,
            }),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML content.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let config: HubConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        if config.sync.concurrency == 0 {
            return Err("sync.concurrency must be at least 1".to_string());
        }
        if config.hub.timeout_secs == 0 {
            return Err("hub.timeout_secs must be at least 1".to_string());
        }
        Ok(config)
    }

    /// Replace the configured host, e.g. from the environment.
    pub fn with_host_override(mut self, host: Option<String>) -> Self {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.hub.host = Some(host);
        }
        self
    }

    /// The hub host, trimmed of any scheme and trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHost`] if no host is configured.
    pub fn host(&self) -> Result<String> {
        let host = self
            .hub
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(Error::MissingHost)?;

        let host = host
            .strip_prefix("http://")
            .or_else(|| host.strip_prefix("https://"))
            .unwrap_or(host)
            .trim_end_matches('/');
        if host.is_empty() {
            return Err(Error::MissingHost);
        }
        Ok(host.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.hub.timeout_secs)
    }

    /// Resolve the layout against the project root.
    pub fn layout(&self, root: &Path) -> Layout {
        Layout::new(root, &self.layout)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            concurrency: self.sync.concurrency,
            pull_new: self.sync.pull_new,
            missing_local: self.sync.missing_local,
            clone_base: self.hub.clone_base.clone(),
        }
    }
}
