//! Vendored sources kept in git checkouts
//!
//! A vendored resource is installed from a file inside a clone of someone
//! else's repository, addressed as `git:<org>/<repo>/<path/to/file.groovy>`.
//! The clone lives at `<vendor root>/<org>/<repo>` and is fast-forwarded
//! before its file is pushed to the hub.

use std::path::{Component, Path, PathBuf};

use git2::{Repository, StatusOptions};

use crate::{Error, Result};

/// Prefix marking an install path as a vendored git source
pub const GIT_PREFIX: &str = "git:";

/// Default host that vendored repositories are cloned from
pub const DEFAULT_CLONE_BASE: &str = "https://github.com";

/// A file inside a vendored git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorSource {
    pub org: String,
    pub repo: String,
    /// Path of the file inside the repository, `/`-separated
    pub path: String,
}

impl VendorSource {
    /// Whether an install argument names a vendored git source.
    pub fn is_vendored(spec: &str) -> bool {
        spec.starts_with(GIT_PREFIX)
    }

    /// Parse `git:<org>/<repo>/<path>.groovy`.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidVendorPath {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let rest = spec
            .strip_prefix(GIT_PREFIX)
            .ok_or_else(|| invalid("expected a git: prefix"))?;
        let parts: Vec<&str> = rest.split('/').collect();

        if parts.len() < 3 {
            return Err(invalid("expected org/repo/path/to/file.groovy"));
        }
        if parts.iter().any(|p| p.is_empty() || *p == "." || *p == "..") {
            return Err(invalid("path segments must be non-empty and relative"));
        }
        if !rest.ends_with(".groovy") {
            return Err(invalid("file must have a .groovy extension"));
        }

        Ok(Self {
            org: parts[0].to_string(),
            repo: parts[1].to_string(),
            path: parts[2..].join("/"),
        })
    }

    /// Directory holding the clone, under `vendor_root`.
    pub fn checkout_dir(&self, vendor_root: &Path) -> PathBuf {
        vendor_root.join(&self.org).join(&self.repo)
    }

    /// Location of the vendored file, under `vendor_root`.
    pub fn file_path(&self, vendor_root: &Path) -> PathBuf {
        self.path
            .split('/')
            .fold(self.checkout_dir(vendor_root), |acc, part| acc.join(part))
    }

    /// URL the repository is cloned from.
    pub fn clone_url(&self, base: &str) -> String {
        format!("{}/{}/{}", base.trim_end_matches('/'), self.org, self.repo)
    }

    /// Clone the repository unless a checkout already exists.
    ///
    /// Returns the checkout directory.
    pub fn ensure_checkout(&self, vendor_root: &Path, clone_base: &str) -> Result<PathBuf> {
        let dir = self.checkout_dir(vendor_root);
        if dir.join(".git").exists() {
            tracing::debug!(checkout = %dir.display(), "vendored checkout already present");
            return Ok(dir);
        }

        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let url = self.clone_url(clone_base);
        tracing::info!(url = %url, checkout = %dir.display(), "cloning vendored repository");
        Repository::clone(&url, &dir)?;
        Ok(dir)
    }
}

/// Find the checkout that owns a vendored file.
///
/// `file` and `vendor_root` must be expressed relative to the same base.
/// Returns `None` when `file` is not under `vendor_root/<org>/<repo>`.
pub fn checkout_for_file(vendor_root: &Path, file: &Path) -> Option<PathBuf> {
    let inner = file.strip_prefix(vendor_root).ok()?;
    let mut parts = inner.components().filter_map(|c| match c {
        Component::Normal(p) => Some(p),
        _ => None,
    });
    let org = parts.next()?;
    let repo = parts.next()?;
    // Must still name something inside the checkout
    parts.next()?;
    Some(vendor_root.join(org).join(repo))
}

/// Fast-forward a checkout's current branch from `origin`.
pub fn refresh_checkout(checkout: &Path) -> Result<()> {
    let repo = Repository::open(checkout)?;

    let head = repo.head()?;
    if !head.is_branch() {
        return Err(Error::DetachedHead {
            path: checkout.to_path_buf(),
        });
    }
    let branch_name = head.shorthand().unwrap_or("HEAD").to_string();

    let mut remote = repo
        .find_remote("origin")
        .map_err(|_| Error::RemoteNotFound {
            name: "origin".to_string(),
        })?;

    remote
        .fetch(&[&branch_name], None, None)
        .map_err(|e| Error::PullFailed {
            message: format!("Fetch failed: {}", e.message()),
        })?;

    let fetch_head = repo
        .find_reference("FETCH_HEAD")
        .map_err(|e| Error::PullFailed {
            message: format!("Could not find FETCH_HEAD: {}", e.message()),
        })?;
    let fetch_commit = fetch_head.peel_to_commit().map_err(|e| Error::PullFailed {
        message: format!("Could not resolve FETCH_HEAD: {}", e.message()),
    })?;

    let head_commit = head.peel_to_commit()?;
    let (analysis, _) = repo.merge_analysis(&[&repo.find_annotated_commit(fetch_commit.id())?])?;

    if analysis.is_up_to_date() {
        tracing::debug!(checkout = %checkout.display(), "vendored checkout up to date");
        return Ok(());
    }

    if analysis.is_fast_forward() {
        // Local edits to tracked files would be lost by the checkout
        if has_tracked_changes(&repo)? {
            return Err(Error::DirtyCheckout {
                path: checkout.to_path_buf(),
            });
        }

        repo.checkout_tree(
            fetch_commit.as_object(),
            Some(git2::build::CheckoutBuilder::default().safe()),
        )?;
        let refname = format!("refs/heads/{}", branch_name);
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(
            fetch_commit.id(),
            &format!("hubsync: fast-forward to {}", fetch_commit.id()),
        )?;
        tracing::info!(checkout = %checkout.display(), commit = %fetch_commit.id(), "fast-forwarded vendored checkout");
        return Ok(());
    }

    Err(Error::CannotFastForward {
        message: format!(
            "{} from {} to {} in {}",
            branch_name,
            head_commit.id(),
            fetch_commit.id(),
            checkout.display()
        ),
    })
}

fn has_tracked_changes(repo: &Repository) -> Result<bool> {
    let mut options = StatusOptions::new();
    options.include_untracked(false).include_ignored(false);
    Ok(!repo.statuses(Some(&mut options))?.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn parse_splits_org_repo_and_path() {
        let source = VendorSource::parse("git:acme/hubitat-drivers/drivers/door.groovy").unwrap();
        assert_eq!(source.org, "acme");
        assert_eq!(source.repo, "hubitat-drivers");
        assert_eq!(source.path, "drivers/door.groovy");
    }

    #[rstest]
    #[case("acme/repo/file.groovy")]
    #[case("git:acme/file.groovy")]
    #[case("git:acme/repo/file.txt")]
    #[case("git:acme//file.groovy")]
    #[case("git:acme/repo/../escape.groovy")]
    fn parse_rejects_malformed_specs(#[case] spec: &str) {
        assert!(VendorSource::parse(spec).is_err(), "{spec} should be rejected");
    }

    #[test]
    fn file_path_is_under_checkout() {
        let source = VendorSource::parse("git:acme/repo/a/b.groovy").unwrap();
        let root = Path::new(".repos");
        assert_eq!(source.checkout_dir(root), Path::new(".repos/acme/repo"));
        assert_eq!(source.file_path(root), Path::new(".repos/acme/repo/a/b.groovy"));
    }

    #[test]
    fn clone_url_trims_trailing_slash() {
        let source = VendorSource::parse("git:acme/repo/b.groovy").unwrap();
        assert_eq!(source.clone_url("https://github.com/"), "https://github.com/acme/repo");
    }

    #[test]
    fn checkout_for_file_takes_two_components() {
        let root = Path::new(".repos");
        assert_eq!(
            checkout_for_file(root, Path::new(".repos/acme/repo/drivers/x.groovy")),
            Some(PathBuf::from(".repos/acme/repo"))
        );
        assert_eq!(checkout_for_file(root, Path::new(".repos/acme/repo")), None);
        assert_eq!(checkout_for_file(root, Path::new("drivers/x.groovy")), None);
    }
}
