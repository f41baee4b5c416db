//! Per-job temporary storage.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use subburn_models::JobId;

use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// File name of the filter graph script.
pub const FILTER_SCRIPT_NAME: &str = "overlay.filtergraph";

/// A uniquely named directory owned by one job.
///
/// The directory and everything in it is removed when the workspace is
/// dropped, whether the job succeeded, failed, panicked or was cancelled.
/// Removal failures are logged and never surface as job errors.
#[derive(Debug)]
pub struct JobWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
    job_id: String,
}

impl JobWorkspace {
    /// Create `subburn-<job_id>-XXXXXX` under `root`.
    pub fn create(root: impl AsRef<Path>, job_id: &JobId) -> MediaResult<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| {
            MediaError::resource(format!(
                "Cannot create work root {}: {}",
                root.display(),
                e
            ))
        })?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("subburn-{}-", job_id.as_path_component()))
            .tempdir_in(root)
            .map_err(|e| {
                MediaError::resource(format!(
                    "Cannot create workspace under {}: {}",
                    root.display(),
                    e
                ))
            })?;

        let path = dir.path().to_path_buf();
        debug!(job_id = %job_id, path = %path.display(), "Created job workspace");

        Ok(Self {
            dir: Some(dir),
            path,
            job_id: job_id.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where staged source bytes go. `extension` is reduced to
    /// alphanumerics; `bin` when nothing usable remains.
    pub fn input_path(&self, extension: &str) -> PathBuf {
        self.path.join(format!("input.{}", sanitize_extension(extension, "bin")))
    }

    pub fn script_path(&self) -> PathBuf {
        self.path.join(FILTER_SCRIPT_NAME)
    }

    pub fn output_path(&self, container: &str) -> PathBuf {
        self.path.join(format!("output.{}", sanitize_extension(container, "mp4")))
    }

    /// Remove the directory now. Dropping does the same.
    pub fn close(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!(job_id = %self.job_id, "Removed job workspace"),
            Err(e) => {
                metrics::record_cleanup_failure();
                warn!(
                    job_id = %self.job_id,
                    path = %self.path.display(),
                    "Failed to remove job workspace: {}", e
                );
            }
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        self.remove();
    }
}

fn sanitize_extension(extension: &str, fallback: &str) -> String {
    let ext: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_ascii_lowercase();
    if ext.is_empty() {
        fallback.to_string()
    } else {
        ext
    }
}
