//! Stage seams between the orchestrator and the external tools.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use scrollcast_browser::PageRecorder;
use scrollcast_media::{CircularMask, Compositor};

use crate::error::{PipelineError, PipelineResult};

/// Records `url` as a video file at `output`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageCapture: Send + Sync {
    async fn capture(&self, url: &str, output: &Path) -> PipelineResult<PathBuf>;
}

/// Masks the talking-head clip at `input` into `output`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClipMasker: Send + Sync {
    async fn mask(&self, input: &Path, output: &Path) -> PipelineResult<PathBuf>;
}

/// Composites `overlay` onto `base` into `output`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoCompositor: Send + Sync {
    async fn composite(&self, base: &Path, overlay: &Path, output: &Path)
        -> PipelineResult<PathBuf>;
}

#[async_trait]
impl PageCapture for PageRecorder {
    async fn capture(&self, url: &str, output: &Path) -> PipelineResult<PathBuf> {
        Ok(PageRecorder::capture(self, url, output).await?)
    }
}

#[async_trait]
impl ClipMasker for CircularMask {
    async fn mask(&self, input: &Path, output: &Path) -> PipelineResult<PathBuf> {
        self.apply(input, output).await.map_err(PipelineError::Mask)
    }
}

#[async_trait]
impl VideoCompositor for Compositor {
    async fn composite(
        &self,
        base: &Path,
        overlay: &Path,
        output: &Path,
    ) -> PipelineResult<PathBuf> {
        Compositor::composite(self, base, overlay, output)
            .await
            .map_err(PipelineError::Composite)
    }
}
