//! SyncEngine implementation
//!
//! The engine compares three views of every resource in scope: the manifest
//! (what was last synced), the hub (a fresh [`RemoteManifest`]), and the
//! local file tree. Per-resource work fans out over a bounded task set; each
//! task returns its manifest change instead of touching the manifest, and
//! changes are applied one by one after every task has settled. The manifest
//! file is written at most once per invocation, at the very end.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hub_fs::{compute_content_hash, io};
use hub_git::{VendorSource, WorkingTree, vendor};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::report::{Action, SkipReason, SyncReport};
use super::scope::SyncScope;
use super::{acquire, task_error};
use crate::config::{Layout, MissingLocalPolicy, PullNewPolicy};
use crate::filename::{SOURCE_EXTENSION, derive_filename};
use crate::gateway::{RemoteGateway, SaveTarget};
use crate::manifest::{Manifest, ManifestEntry, ManifestStore};
use crate::policy::{DiskState, PullDecision, PushDecision, decide_pull, decide_push};
use crate::remote::{RemoteEntry, RemoteManifest};
use crate::resource::{CodeType, ResourceId};
use crate::{Error, Result};

/// Behavior knobs for sync operations
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum number of in-flight per-resource tasks
    pub concurrency: usize,
    pub pull_new: PullNewPolicy,
    pub missing_local: MissingLocalPolicy,
    /// Base URL vendored repositories are cloned from
    pub clone_base: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            pull_new: PullNewPolicy::default(),
            missing_local: MissingLocalPolicy::default(),
            clone_base: vendor::DEFAULT_CLONE_BASE.to_string(),
        }
    }
}

/// Source of a resource being installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallTarget {
    /// A file in the local tree
    Local(PathBuf),
    /// A file in a vendored git repository
    Vendored(VendorSource),
}

impl InstallTarget {
    /// Parse an install argument; `git:` paths are vendored.
    pub fn parse(arg: &str) -> Result<Self> {
        if VendorSource::is_vendored(arg) {
            Ok(InstallTarget::Vendored(VendorSource::parse(arg)?))
        } else {
            Ok(InstallTarget::Local(PathBuf::from(arg)))
        }
    }
}

enum ManifestChange {
    Keep,
    Put(ManifestEntry),
}

/// Result of one per-resource task
struct Outcome {
    kind: CodeType,
    id: ResourceId,
    filename: String,
    result: Result<(Action, ManifestChange)>,
}

/// Everything a pull task needs, owned so it can move onto a blocking thread
#[derive(Clone)]
struct PullContext {
    layout: Layout,
    tree: Arc<dyn WorkingTree>,
    pull_new: PullNewPolicy,
}

/// Engine for synchronizing the local tree with the hub
///
/// The engine provides three operations:
/// - **pull**: bring hub changes into local files
/// - **push**: save local edits to the hub
/// - **install**: create a new hub resource from a local or vendored file
pub struct SyncEngine {
    layout: Layout,
    options: SyncOptions,
    gateway: Arc<dyn RemoteGateway>,
    tree: Arc<dyn WorkingTree>,
    store: ManifestStore,
}

impl SyncEngine {
    /// Create a new SyncEngine
    ///
    /// # Arguments
    ///
    /// * `layout` - Where sources, vendored checkouts and the manifest live
    /// * `options` - Concurrency and open-ended policy choices
    /// * `gateway` - Access to the hub
    /// * `tree` - Uncommitted-change detection for local files
    pub fn new(
        layout: Layout,
        options: SyncOptions,
        gateway: Arc<dyn RemoteGateway>,
        tree: Arc<dyn WorkingTree>,
    ) -> Self {
        let store = ManifestStore::new(layout.manifest_path());
        Self {
            layout,
            options,
            gateway,
            tree,
            store,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Load the manifest from disk
    pub fn load_manifest(&self) -> Result<Manifest> {
        self.store.load()
    }

    /// Bring hub state into the local tree.
    ///
    /// # Errors
    ///
    /// Fails as a whole only if the manifest cannot be loaded or saved, or a
    /// type listing cannot be retrieved. Per-resource problems are recorded
    /// in the returned report.
    pub async fn pull(&self, scope: SyncScope) -> Result<SyncReport> {
        let mut manifest = self.store.load()?;
        let original = manifest.clone();
        let mut report = SyncReport::new();

        let mut remote =
            RemoteManifest::build(Arc::clone(&self.gateway), &scope, self.options.concurrency).await?;

        for ((kind, id), error) in std::mem::take(&mut remote.failures) {
            let filename = manifest.get(kind, id).map(|e| e.filename.clone());
            report.fail(kind, id, filename, &error);
        }

        if let SyncScope::Resource(kind, id) = scope
            && remote.get(kind, id).is_none()
            && report.failure_for(kind, id).is_none()
        {
            let filename = manifest.get(kind, id).map(|e| e.filename.clone());
            report.fail(kind, id, filename, &Error::NotFound { kind, id });
        }

        let ctx = PullContext {
            layout: self.layout.clone(),
            tree: Arc::clone(&self.tree),
            pull_new: self.options.pull_new,
        };
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for kind in scope.kinds() {
            let mut claimed: BTreeSet<String> = manifest
                .section(kind)
                .values()
                .map(|e| e.filename.clone())
                .collect();

            for remote_entry in remote.section(kind).values() {
                let id = remote_entry.id;
                let entry = manifest.get(kind, id).cloned();

                // Tracked resources keep their filename through hub renames
                let filename = match &entry {
                    Some(entry) => entry.filename.clone(),
                    None => match remote_entry.derived_filename() {
                        Ok(filename) => filename,
                        Err(e) => {
                            tracing::warn!(kind = %kind, id, error = %e, "unusable listing entry");
                            report.fail(kind, id, None, &e);
                            continue;
                        }
                    },
                };

                if entry.is_none()
                    && ctx.pull_new == PullNewPolicy::Create
                    && !claimed.insert(filename.clone())
                {
                    let error = Error::InvalidResource {
                        message: format!("{kind} {id} maps to {filename}, which another resource already uses"),
                    };
                    report.fail(kind, id, Some(filename), &error);
                    continue;
                }

                let permit = acquire(&semaphore).await?;
                let ctx = ctx.clone();
                let remote_entry = remote_entry.clone();

                join_set.spawn_blocking(move || {
                    let outcome = reconcile_pull(&ctx, kind, entry, filename, remote_entry);
                    drop(permit);
                    outcome
                });
            }
        }

        while let Some(joined) = join_set.join_next().await {
            apply(&mut manifest, &mut report, joined.map_err(task_error)?);
        }

        if manifest != original {
            self.store.save(&manifest)?;
        }
        report.sort();
        Ok(report)
    }

    /// Save local edits of tracked resources to the hub.
    ///
    /// Only resources already in the manifest are pushed; new ones go
    /// through [`install`](Self::install).
    ///
    /// # Errors
    ///
    /// Fails as a whole only if the manifest cannot be loaded or saved, or a
    /// type listing cannot be retrieved.
    pub async fn push(&self, scope: SyncScope) -> Result<SyncReport> {
        let mut manifest = self.store.load()?;
        let original = manifest.clone();
        let mut report = SyncReport::new();

        let mut tracked: Vec<(CodeType, ManifestEntry)> = Vec::new();
        for kind in scope.kinds() {
            tracked.extend(
                manifest
                    .section(kind)
                    .values()
                    .filter(|e| scope.includes(kind, e.id))
                    .map(|e| (kind, e.clone())),
            );
        }

        if let SyncScope::Resource(kind, id) = scope
            && manifest.get(kind, id).is_none()
        {
            tracing::warn!(kind = %kind, id, "not tracked; use install to create it");
            report.record(
                kind,
                id,
                String::new(),
                Action::Skipped {
                    reason: SkipReason::Untracked,
                },
            );
        }

        if tracked.is_empty() {
            return Ok(report);
        }

        let stale_checkouts = self.refresh_vendored(&tracked).await?;

        let wanted: BTreeSet<(CodeType, ResourceId)> =
            tracked.iter().map(|(kind, e)| (*kind, e.id)).collect();
        let mut remote = RemoteManifest::build_filtered(
            Arc::clone(&self.gateway),
            &scope,
            self.options.concurrency,
            |kind, id| wanted.contains(&(kind, id)),
        )
        .await?;

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for (kind, entry) in tracked {
            let id = entry.id;
            let filename = entry.filename.clone();

            if let Some(error) = remote.take_failure(kind, id) {
                report.fail(kind, id, Some(filename), &error);
                continue;
            }

            let path = self.layout.entry_path(kind, &entry);
            if entry.vendored
                && let Some(checkout) = vendor::checkout_for_file(self.layout.vendor_dir(), &path)
                && let Some(message) = stale_checkouts.get(&checkout)
            {
                let error = Error::Git(hub_git::Error::PullFailed {
                    message: message.clone(),
                });
                report.fail(kind, id, Some(filename), &error);
                continue;
            }

            let local = match read_local(&path).await? {
                Ok(content) => content.map(|source| {
                    let hash = compute_content_hash(&source);
                    (source, hash)
                }),
                Err(e) => {
                    report.fail(kind, id, Some(filename), &Error::from(e));
                    continue;
                }
            };

            let local_hash = local.as_ref().map(|(_, hash)| hash.as_str());
            match decide_push(&entry, remote.get(kind, id), local_hash) {
                PushDecision::MissingRemote => {
                    let error = Error::MissingRemote {
                        kind,
                        filename: filename.clone(),
                    };
                    report.fail(kind, id, Some(filename), &error);
                }
                PushDecision::MissingLocal => match self.options.missing_local {
                    MissingLocalPolicy::Retain => {
                        report.fail(kind, id, Some(filename), &Error::LocalFileMissing { path });
                    }
                    MissingLocalPolicy::Forget => {
                        manifest.remove(kind, id);
                        tracing::info!(kind = %kind, id, filename = %filename, "local file gone; forgot entry");
                        report.record(kind, id, filename, Action::Forgotten);
                    }
                },
                PushDecision::Unchanged => {
                    tracing::debug!(kind = %kind, id, filename = %filename, "unchanged; skipping");
                    report.record(kind, id, filename, Action::Unchanged);
                }
                PushDecision::OutOfDate { local, remote } => {
                    let error = Error::VersionConflict {
                        filename: filename.clone(),
                        local,
                        remote,
                    };
                    report.fail(kind, id, Some(filename), &error);
                }
                PushDecision::Push { base_version } => {
                    let Some((source, hash)) = local else {
                        continue;
                    };
                    let permit = acquire(&semaphore).await?;
                    let gateway = Arc::clone(&self.gateway);

                    join_set.spawn(async move {
                        let target = SaveTarget {
                            id,
                            version: base_version,
                        };
                        let saved = gateway.save_resource(kind, Some(target), &source).await;
                        drop(permit);

                        let result = saved.map(|saved| {
                            (
                                Action::Pushed {
                                    version: saved.version,
                                },
                                ManifestChange::Put(entry.synced(saved.version, hash)),
                            )
                        });
                        Outcome {
                            kind,
                            id,
                            filename,
                            result,
                        }
                    });
                }
            }
        }

        while let Some(joined) = join_set.join_next().await {
            apply(&mut manifest, &mut report, joined.map_err(task_error)?);
        }

        if manifest != original {
            self.store.save(&manifest)?;
        }
        report.sort();
        Ok(report)
    }

    /// Create a new hub resource from a source file and start tracking it.
    ///
    /// Local files are tracked under the filename derived from the hub's
    /// listing of the new resource, copied into the type directory if they
    /// live elsewhere. Vendored files are tracked in place.
    pub async fn install(&self, kind: CodeType, target: InstallTarget) -> Result<SyncReport> {
        let mut manifest = self.store.load()?;

        let path = match &target {
            InstallTarget::Local(path) => path.clone(),
            InstallTarget::Vendored(source) => self.checkout_vendored(source).await?,
        };

        if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
            return Err(Error::InvalidResource {
                message: format!("{} is not a .{SOURCE_EXTENSION} file", path.display()),
            });
        }

        let Some(source) = read_local(&path).await?? else {
            return Err(Error::LocalFileMissing { path });
        };
        let hash = compute_content_hash(&source);

        let vendored_name = match &target {
            InstallTarget::Vendored(_) => Some(
                self.layout
                    .relative_to_root(&path)
                    .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            ),
            InstallTarget::Local(_) => None,
        };

        let tracked_as = match &vendored_name {
            Some(name) => Some(name.clone()),
            None => self.tracked_local_name(kind, &path),
        };
        if let Some(name) = tracked_as
            && let Some(existing) = manifest.find_by_filename(kind, &name)
        {
            return Err(Error::AlreadyTracked {
                kind,
                id: existing.id,
                filename: name,
            });
        }

        let saved = self.gateway.save_resource(kind, None, &source).await?;
        tracing::info!(kind = %kind, id = saved.id, version = saved.version, path = %path.display(), "created resource on hub");

        let entry = match vendored_name {
            Some(name) => ManifestEntry::new(saved.id, name, saved.version, hash).vendored(),
            None => {
                let resource = self
                    .gateway
                    .list_resources(kind)
                    .await?
                    .into_iter()
                    .find(|r| r.id == saved.id)
                    .ok_or(Error::NotFound { kind, id: saved.id })?;
                let filename = derive_filename(&resource)?;

                if let Some(existing) = manifest.find_by_filename(kind, &filename)
                    && existing.id != saved.id
                {
                    return Err(Error::AlreadyTracked {
                        kind,
                        id: existing.id,
                        filename,
                    });
                }

                let dest = self.layout.source_path(kind, &filename);
                if !same_file(&path, &dest) {
                    io::write_text(&dest, &source)?;
                    tracing::info!(from = %path.display(), to = %dest.display(), "copied source into place");
                }
                ManifestEntry::new(saved.id, filename, saved.version, hash)
            }
        };

        let mut report = SyncReport::new();
        report.record(kind, entry.id, entry.filename.clone(), Action::Created);
        manifest.insert(kind, entry);
        self.store.save(&manifest)?;
        Ok(report)
    }

    /// Clone a vendored repository if needed; returns the file's path.
    async fn checkout_vendored(&self, source: &VendorSource) -> Result<PathBuf> {
        let vendor_dir = self.layout.vendor_dir().to_path_buf();
        let clone_base = self.options.clone_base.clone();
        let source = source.clone();

        let path = tokio::task::spawn_blocking(move || -> hub_git::Result<PathBuf> {
            source.ensure_checkout(&vendor_dir, &clone_base)?;
            Ok(source.file_path(&vendor_dir))
        })
        .await
        .map_err(task_error)??;
        Ok(path)
    }

    /// Fast-forward every checkout holding a vendored entry.
    ///
    /// Returns the checkouts that could not be updated with the reason.
    async fn refresh_vendored(
        &self,
        tracked: &[(CodeType, ManifestEntry)],
    ) -> Result<BTreeMap<PathBuf, String>> {
        let checkouts: BTreeSet<PathBuf> = tracked
            .iter()
            .filter(|(_, e)| e.vendored)
            .filter_map(|(kind, e)| {
                vendor::checkout_for_file(self.layout.vendor_dir(), &self.layout.entry_path(*kind, e))
            })
            .collect();

        let mut stale = BTreeMap::new();
        for checkout in checkouts {
            let dir = checkout.clone();
            let refreshed = tokio::task::spawn_blocking(move || vendor::refresh_checkout(&dir))
                .await
                .map_err(task_error)?;

            match refreshed {
                Ok(()) => tracing::debug!(checkout = %checkout.display(), "vendored checkout up to date"),
                Err(e) => {
                    tracing::warn!(checkout = %checkout.display(), error = %e, "could not update vendored checkout");
                    stale.insert(checkout, e.to_string());
                }
            }
        }
        Ok(stale)
    }

    /// The manifest filename `path` would be tracked under, when it already
    /// sits in the type directory.
    fn tracked_local_name(&self, kind: CodeType, path: &Path) -> Option<String> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        if !same_file(parent, self.layout.type_dir(kind)) {
            return None;
        }
        path.file_name().map(|n| n.to_string_lossy().into_owned())
    }
}

/// Read a local source file on the blocking pool.
///
/// The outer error is a failed task; the inner one is the read itself.
async fn read_local(path: &Path) -> Result<hub_fs::Result<Option<String>>> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || io::read_text_if_exists(&path))
        .await
        .map_err(task_error)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn apply(manifest: &mut Manifest, report: &mut SyncReport, outcome: Outcome) {
    let Outcome {
        kind,
        id,
        filename,
        result,
    } = outcome;

    match result {
        Ok((action, change)) => {
            if let ManifestChange::Put(entry) = change {
                manifest.insert(kind, entry);
            }

            match action {
                Action::Unchanged | Action::Skipped { .. } => {
                    tracing::debug!(kind = %kind, id, filename = %filename, ?action, "no change")
                }
                _ => tracing::info!(kind = %kind, id, filename = %filename, ?action, "synced"),
            }
            report.record(kind, id, filename, action);
        }
        Err(error) => {
            tracing::warn!(kind = %kind, id, filename = %filename, error = %error, "resource failed");
            report.fail(kind, id, Some(filename), &error);
        }
    }
}

fn reconcile_pull(
    ctx: &PullContext,
    kind: CodeType,
    entry: Option<ManifestEntry>,
    filename: String,
    remote: RemoteEntry,
) -> Outcome {
    let result = pull_one(ctx, kind, entry.as_ref(), &filename, &remote);
    Outcome {
        kind,
        id: remote.id,
        filename,
        result,
    }
}

fn pull_one(
    ctx: &PullContext,
    kind: CodeType,
    entry: Option<&ManifestEntry>,
    filename: &str,
    remote: &RemoteEntry,
) -> Result<(Action, ManifestChange)> {
    let path = match entry {
        Some(entry) => ctx.layout.entry_path(kind, entry),
        None => ctx.layout.source_path(kind, filename),
    };
    let disk = match entry {
        Some(entry) if !entry.vendored => disk_state(&path, &entry.hash, ctx.tree.as_ref())?,
        None if ctx.pull_new == PullNewPolicy::Create => {
            disk_state(&path, &remote.hash, ctx.tree.as_ref())?
        }
        _ => DiskState::Missing,
    };

    match decide_pull(entry, remote, disk, ctx.pull_new) {
        PullDecision::Create => {
            io::write_text(&path, &remote.source)?;
            Ok((Action::Created, ManifestChange::Put(synced_entry(entry, filename, remote))))
        }
        PullDecision::Adopt => {
            tracing::debug!(path = %path.display(), "local file already matches the hub");
            Ok((Action::Created, ManifestChange::Put(synced_entry(entry, filename, remote))))
        }
        PullDecision::Restore | PullDecision::Overwrite => {
            io::write_text(&path, &remote.source)?;
            Ok((Action::Updated, ManifestChange::Put(synced_entry(entry, filename, remote))))
        }
        PullDecision::Unchanged => {
            // Same content saved again on the hub still bumps its version
            let change = match entry {
                Some(entry) if entry.version != remote.version => {
                    ManifestChange::Put(entry.synced(remote.version, remote.hash.clone()))
                }
                _ => ManifestChange::Keep,
            };
            Ok((Action::Unchanged, change))
        }
        PullDecision::RefuseUncommitted => Err(Error::UncommittedChanges { path }),
        PullDecision::SkipUntracked => Ok((
            Action::Skipped {
                reason: SkipReason::Untracked,
            },
            ManifestChange::Keep,
        )),
        PullDecision::SkipVendored => Ok((
            Action::Skipped {
                reason: SkipReason::Vendored,
            },
            ManifestChange::Keep,
        )),
    }
}

/// Entry reflecting `remote` after a sync, keeping an existing filename.
fn synced_entry(entry: Option<&ManifestEntry>, filename: &str, remote: &RemoteEntry) -> ManifestEntry {
    match entry {
        Some(entry) => entry.synced(remote.version, remote.hash.clone()),
        None => ManifestEntry::new(remote.id, filename, remote.version, remote.hash.clone()),
    }
}

fn disk_state(path: &Path, expected_hash: &str, tree: &dyn WorkingTree) -> Result<DiskState> {
    let Some(content) = io::read_text_if_exists(path)? else {
        return Ok(DiskState::Missing);
    };
    if compute_content_hash(&content) == expected_hash {
        return Ok(DiskState::Clean);
    }
    let uncommitted = tree.has_uncommitted_changes(path)?;
    Ok(DiskState::Modified { uncommitted })
}
