//! git2-backed working-tree status

use std::path::Path;

use git2::{ErrorCode, Repository, Status};

use crate::provider::WorkingTree;
use crate::{Error, Result};

/// Working-tree status backed by the git repository enclosing each file.
///
/// The repository is discovered per query, walking up from the file's
/// directory, so one instance serves files from several checkouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitWorkingTree;

impl GitWorkingTree {
    pub fn new() -> Self {
        Self
    }
}

impl WorkingTree for GitWorkingTree {
    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        let file = dunce::canonicalize(path).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let start = file.parent().unwrap_or(&file);

        let repo = match Repository::discover(start) {
            Ok(repo) => repo,
            // Outside version control nothing proves the edit is saved
            Err(e) if e.code() == ErrorCode::NotFound => {
                tracing::debug!(path = %path.display(), "file is not inside a git repository");
                return Ok(true);
            }
            Err(e) => return Err(e.into()),
        };

        let workdir = repo.workdir().ok_or_else(|| Error::BareRepository {
            path: repo.path().to_path_buf(),
        })?;
        let workdir = dunce::canonicalize(workdir).map_err(|e| Error::Io {
            path: workdir.to_path_buf(),
            source: e,
        })?;

        let Ok(relative) = file.strip_prefix(&workdir) else {
            return Ok(true);
        };

        let status = repo.status_file(relative)?;
        tracing::trace!(path = %relative.display(), ?status, "git status");

        Ok(!(status.is_empty() || status == Status::IGNORED))
    }
}
