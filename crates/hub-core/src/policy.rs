//! Conflict policy
//!
//! Pure decision rules for pull and push. The engine gathers the inputs
//! (manifest entry, remote snapshot, local file state) and acts on the
//! decision; nothing here performs I/O.

use crate::config::PullNewPolicy;
use crate::manifest::ManifestEntry;
use crate::remote::RemoteEntry;

/// State of a local file relative to an expected hash
///
/// The expected hash is the manifest hash for a tracked resource and the
/// hub's hash for one that is not tracked yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskState {
    Missing,
    /// Content hash equals the expected hash
    Clean,
    /// Content hash differs from the expected hash
    Modified { uncommitted: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullDecision {
    /// Write a never-seen resource and start tracking it
    Create,
    /// The file is already there with the hub's content; only track it
    Adopt,
    SkipUntracked,
    SkipVendored,
    /// Local edits are not committed; leave file and entry alone
    RefuseUncommitted,
    /// Tracked file is gone; rewrite it from the hub
    Restore,
    Unchanged,
    Overwrite,
}

/// Decide what a pull does with one remote resource.
///
/// Rules are checked in order and the first match wins.
pub fn decide_pull(
    entry: Option<&ManifestEntry>,
    remote: &RemoteEntry,
    disk: DiskState,
    pull_new: PullNewPolicy,
) -> PullDecision {
    let Some(entry) = entry else {
        return match (pull_new, disk) {
            (PullNewPolicy::Skip, _) => PullDecision::SkipUntracked,
            (PullNewPolicy::Create, DiskState::Clean) => PullDecision::Adopt,
            (PullNewPolicy::Create, DiskState::Modified { uncommitted: true }) => {
                PullDecision::RefuseUncommitted
            }
            (PullNewPolicy::Create, _) => PullDecision::Create,
        };
    };

    if entry.vendored {
        return PullDecision::SkipVendored;
    }

    match disk {
        DiskState::Modified { uncommitted: true } => PullDecision::RefuseUncommitted,
        DiskState::Missing => PullDecision::Restore,
        _ if remote.hash == entry.hash => PullDecision::Unchanged,
        _ => PullDecision::Overwrite,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDecision {
    /// The hub no longer has this id
    MissingRemote,
    MissingLocal,
    Unchanged,
    /// The hub moved ahead since the last sync
    OutOfDate { local: u64, remote: u64 },
    /// Save, declaring `base_version` as the version being replaced
    Push { base_version: u64 },
}

/// Decide what a push does with one tracked resource.
///
/// `local_hash` is `None` when the local file does not exist. Rules are
/// checked in order and the first match wins.
pub fn decide_push(
    entry: &ManifestEntry,
    remote: Option<&RemoteEntry>,
    local_hash: Option<&str>,
) -> PushDecision {
    let Some(remote) = remote else {
        return PushDecision::MissingRemote;
    };
    let Some(local_hash) = local_hash else {
        return PushDecision::MissingLocal;
    };

    if local_hash == entry.hash {
        return PushDecision::Unchanged;
    }

    // Vendored sources follow their checkout, not the manifest version
    if entry.vendored {
        return PushDecision::Push {
            base_version: remote.version,
        };
    }

    if entry.version != remote.version {
        return PushDecision::OutOfDate {
            local: entry.version,
            remote: remote.version,
        };
    }

    PushDecision::Push {
        base_version: entry.version,
    }
}
