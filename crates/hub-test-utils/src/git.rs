//! Git repository fixtures.
//!
//! All fixtures drive the `git` CLI so the resulting repositories look
//! exactly like the ones users keep their hub sources in.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Run `git` with `args` inside `path`, panicking on failure.
///
/// # Panics
/// Panics if git cannot be spawned or exits unsuccessfully.
pub fn git(path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap_or_else(|e| panic!("failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "`git {args:?}` failed in {}:\n{}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Initialises a real git repository with an initial commit.
///
/// Specifically:
/// - Runs `git init`
/// - Configures `user.email`, `user.name`, and `commit.gpgsign = false`
/// - Creates `README.md` and makes an initial commit
/// - Renames the default branch to `main`
///
/// # Panics
/// Panics if any git operation fails.
pub fn real_git_repo_with_commit(path: &Path) {
    fs::create_dir_all(path)
        .unwrap_or_else(|e| panic!("real_git_repo_with_commit: failed to create dir: {e}"));

    git(path, &["init"]);
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "commit.gpgsign", "false"]);

    fs::write(path.join("README.md"), "# Test")
        .unwrap_or_else(|e| panic!("real_git_repo_with_commit: failed to write README.md: {e}"));

    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);
    // Best-effort: older git versions may not support this flag
    let _ = Command::new("git")
        .args(["branch", "-m", "main"])
        .current_dir(path)
        .output();
}

/// Write `content` to `file` (relative to `repo`) and commit it.
///
/// # Panics
/// Panics if the write or any git operation fails.
pub fn commit_file(repo: &Path, file: &str, content: &str) {
    let full = repo.join(file);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&full, content)
        .unwrap_or_else(|e| panic!("commit_file: failed to write {}: {e}", full.display()));
    git(repo, &["add", file]);
    git(repo, &["commit", "-m", &format!("Update {file}")]);
}
