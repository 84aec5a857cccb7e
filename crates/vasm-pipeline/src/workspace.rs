//! Per-job scratch directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use vasm_models::JobId;

use crate::error::{JobError, JobResult};

/// Scratch directory owned by one job.
///
/// The directory name is the job id plus a random suffix, so concurrent
/// jobs never share a path. It is removed by [`Workspace::close`] or, if the
/// job future is dropped first, when the workspace itself is dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create an empty workspace for `job_id` under `root`.
    pub async fn open(root: impl AsRef<Path>, job_id: &JobId) -> JobResult<Self> {
        let root = root.as_ref();

        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| JobError::workspace(root, e.to_string()))?;

        let prefix = format!("{}-", sanitize_component(job_id.as_str()));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(root)
            .map_err(|e| JobError::workspace(root, e.to_string()))?;

        debug!(job_id = %job_id, path = %dir.path().display(), "Workspace opened");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the workspace and everything in it.
    ///
    /// Removal errors are logged and swallowed; they never replace the
    /// job's own outcome.
    pub async fn close(self) {
        let path = self.dir.path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || self.dir.close()).await;

        match result {
            Ok(Ok(())) => debug!(path = %path.display(), "Workspace removed"),
            Ok(Err(e)) => warn!(path = %path.display(), "Failed to remove workspace: {}", e),
            Err(e) => warn!(path = %path.display(), "Workspace cleanup task failed: {}", e),
        }
    }
}

/// Make `value` safe as a single path component.
pub fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
