//! Job-scoped working directory.
//!
//! Every artifact a job produces lives here. The directory is removed by
//! [`JobWorkspace::teardown`] on both the success and the failure path, and
//! by `Drop` if the job future is abandoned halfway.

use std::path::{Path, PathBuf};

use scrollcast_models::JobId;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::PipelineResult;

pub const CLIP_FILE: &str = "talking-head.webm";
pub const WEBSITE_FILE: &str = "website.mp4";
pub const MASK_FILE: &str = "mask.mov";
pub const OUTPUT_FILE: &str = "output.mp4";

/// Uniquely named directory `video-processing-<job id>-<random>`.
#[derive(Debug)]
pub struct JobWorkspace {
    dir: TempDir,
}

impl JobWorkspace {
    /// Create the workspace under `root`, creating `root` if needed.
    pub async fn create(root: &Path, job_id: &JobId) -> PipelineResult<Self> {
        let root = root.to_path_buf();
        let prefix = format!("video-processing-{}-", job_id);

        let dir = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&root)?;
            tempfile::Builder::new().prefix(&prefix).tempdir_in(&root)
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn clip_path(&self) -> PathBuf {
        self.dir.path().join(CLIP_FILE)
    }

    pub fn website_path(&self) -> PathBuf {
        self.dir.path().join(WEBSITE_FILE)
    }

    pub fn mask_path(&self) -> PathBuf {
        self.dir.path().join(MASK_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE)
    }

    /// Remove the directory and everything in it.
    ///
    /// Failures are logged at warn and never returned.
    pub async fn teardown(self) {
        let path = self.dir.path().to_path_buf();
        let dir = self.dir;

        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => debug!("Removed workspace {}", path.display()),
            Ok(Err(e)) => warn!("Failed to remove workspace {}: {}", path.display(), e),
            Err(e) => warn!("Workspace cleanup task failed for {}: {}", path.display(), e),
        }
    }
}
