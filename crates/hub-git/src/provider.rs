//! Working-tree trait consumed by the reconciliation engine

use std::path::Path;

use crate::Result;

/// Answers questions about local edits to tracked source files.
///
/// The pull algorithm only overwrites a locally-modified file when this
/// reports the modification as committed. Implementations must be cheap to
/// share across concurrent reconciliation tasks.
pub trait WorkingTree: Send + Sync {
    /// Whether `path` has changes that are not committed.
    ///
    /// A path that does not exist has nothing to lose and reports `false`.
    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool>;
}
