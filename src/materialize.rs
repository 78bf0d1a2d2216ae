//! Repository Materializer: obtains a local file tree for a remote repository
//! URL and owns the scratch-directory lifecycle.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Errors from materializing a repository.
#[derive(Debug)]
pub enum MaterializeError {
    Io(std::io::Error),
    /// `git` exited non-zero or could not be launched.
    Clone(String),
}

impl From<std::io::Error> for MaterializeError {
    fn from(e: std::io::Error) -> Self {
        MaterializeError::Io(e)
    }
}

impl std::fmt::Display for MaterializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterializeError::Io(e) => write!(f, "scratch directory error: {e}"),
            MaterializeError::Clone(msg) => write!(f, "failed to clone repository: {msg}"),
        }
    }
}

impl std::error::Error for MaterializeError {}

/// A materialized repository clone in a job-scoped scratch directory.
///
/// The orchestrator owns deletion: `cleanup` consumes the workspace, so the
/// scratch directory can only be removed once.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Local root of the cloned tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove the scratch directory. Failures are logged, never escalated:
    /// by the time cleanup runs, the job already has its outcome.
    pub fn cleanup(self) {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                debug!(path = %self.root.display(), "Removed scratch directory");
            }
            Err(e) => {
                warn!(
                    error = ?e,
                    path = %self.root.display(),
                    "Failed to remove scratch directory"
                );
            }
        }
    }
}

/// Clone `repo_url` into a fresh, uniquely named scratch directory under
/// `scratch_root`, namespaced by job id so concurrent jobs cannot collide.
///
/// On any cloning failure the directory is removed before the error is
/// propagated: no partial scratch directories survive a failed clone.
pub fn materialize(
    repo_url: &str,
    job_id: &str,
    scratch_root: &Path,
) -> Result<Workspace, MaterializeError> {
    if !scratch_root.exists() {
        fs::create_dir_all(scratch_root)?;
        debug!(path = %scratch_root.display(), "Created scratch root");
    }

    let dir_name = format!("repodoc_{}_{}", job_id, Uuid::new_v4().simple());
    let target = scratch_root.join(dir_name);

    // `git clone <repo_url> <target>`
    let status = Command::new("git")
        .arg("clone")
        .arg(repo_url)
        .arg(&target)
        .status();

    match status {
        Ok(s) if s.success() => {
            info!(
                repo_url = repo_url,
                job_id = job_id,
                path = %target.display(),
                "Successfully cloned repository"
            );
            Ok(Workspace { root: target })
        }
        Ok(s) => {
            error!(
                repo_url = repo_url,
                job_id = job_id,
                path = %target.display(),
                "Git exited with non-zero code: {}", s
            );
            remove_partial(&target);
            Err(MaterializeError::Clone(format!(
                "git clone of {repo_url} exited with {s}"
            )))
        }
        Err(e) => {
            error!(
                error = ?e,
                repo_url = repo_url,
                job_id = job_id,
                "Failed to launch git process"
            );
            remove_partial(&target);
            Err(MaterializeError::Clone(format!(
                "failed to launch git for {repo_url}: {e}"
            )))
        }
    }
}

fn remove_partial(target: &Path) {
    if target.exists() {
        if let Err(e) = fs::remove_dir_all(target) {
            warn!(
                error = ?e,
                path = %target.display(),
                "Failed to remove partial clone directory"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn failed_clone_leaves_no_scratch_directory() {
        let scratch = tempdir().unwrap();
        let result = materialize(
            "file:///nonexistent/definitely-not-a-repo",
            "job-err",
            scratch.path(),
        );
        assert!(result.is_err(), "Clone of a bogus URL should fail");
        let entries: Vec<_> = fs::read_dir(scratch.path()).unwrap().collect();
        assert!(
            entries.is_empty(),
            "No partial scratch directories should survive a failed clone"
        );
    }

    #[test]
    fn cleanup_removes_the_workspace() {
        let scratch = tempdir().unwrap();
        let root = scratch.path().join("repodoc_job_x");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();

        let ws = Workspace { root: root.clone() };
        ws.cleanup();
        assert!(!root.exists(), "Workspace directory should be gone");
    }
}
