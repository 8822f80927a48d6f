//! Hand-written stage fakes.
//!
//! They write small placeholder files instead of launching a browser or
//! ffmpeg, so the orchestration and HTTP layers can be tested anywhere.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scrollcast_browser::CaptureError;
use scrollcast_media::MediaError;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::processor::VideoPipeline;
use crate::stages::{ClipMasker, PageCapture, VideoCompositor};

/// Leading `ftyp` box of an ISO base media file.
pub const MP4_HEADER: &[u8] = b"\x00\x00\x00\x18ftypisom\x00\x00\x02\x00isomiso2";

/// Whether `bytes` starts like an MP4 file.
pub fn looks_like_mp4(bytes: &[u8]) -> bool {
    bytes.len() >= 8 && &bytes[4..8] == b"ftyp"
}

/// Writes a placeholder recording and remembers every output path.
#[derive(Debug, Default)]
pub struct FakeCapture {
    delay: Duration,
    outputs: Mutex<Vec<PathBuf>>,
}

impl FakeCapture {
    /// Hold each capture for `delay` so concurrent jobs overlap.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn outputs(&self) -> Vec<PathBuf> {
        self.outputs.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageCapture for FakeCapture {
    async fn capture(&self, url: &str, output: &Path) -> PipelineResult<PathBuf> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tokio::fs::write(output, format!("page:{}", url))
            .await
            .map_err(|e| CaptureError::Encoder(MediaError::Io(e)))?;
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.push(output.to_path_buf());
        }
        Ok(output.to_path_buf())
    }
}

/// Copies the clip through unchanged.
#[derive(Debug, Default)]
pub struct FakeMasker;

#[async_trait]
impl ClipMasker for FakeMasker {
    async fn mask(&self, input: &Path, output: &Path) -> PipelineResult<PathBuf> {
        tokio::fs::copy(input, output)
            .await
            .map_err(|e| PipelineError::Mask(MediaError::Io(e)))?;
        Ok(output.to_path_buf())
    }
}

/// Writes an `ftyp` header followed by the overlay's bytes.
#[derive(Debug, Default)]
pub struct FakeCompositor;

#[async_trait]
impl VideoCompositor for FakeCompositor {
    async fn composite(
        &self,
        base: &Path,
        overlay: &Path,
        output: &Path,
    ) -> PipelineResult<PathBuf> {
        let io = |e| PipelineError::Composite(MediaError::Io(e));
        tokio::fs::metadata(base).await.map_err(io)?;
        let mut bytes = MP4_HEADER.to_vec();
        bytes.extend(tokio::fs::read(overlay).await.map_err(io)?);
        tokio::fs::write(output, bytes).await.map_err(io)?;
        Ok(output.to_path_buf())
    }
}

/// Fails whichever stage it is plugged into, leaving a partial file behind.
#[derive(Debug, Default)]
pub struct FailingStage;

impl FailingStage {
    async fn leave_debris(output: &Path) {
        let _ = tokio::fs::write(output, b"partial").await;
    }
}

#[async_trait]
impl PageCapture for FailingStage {
    async fn capture(&self, _url: &str, output: &Path) -> PipelineResult<PathBuf> {
        Self::leave_debris(output).await;
        Err(CaptureError::NavigationTimeout(30).into())
    }
}

#[async_trait]
impl ClipMasker for FailingStage {
    async fn mask(&self, _input: &Path, output: &Path) -> PipelineResult<PathBuf> {
        Self::leave_debris(output).await;
        Err(PipelineError::Mask(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("Invalid data found when processing input".into()),
            Some(1),
        )))
    }
}

#[async_trait]
impl VideoCompositor for FailingStage {
    async fn composite(
        &self,
        _base: &Path,
        _overlay: &Path,
        output: &Path,
    ) -> PipelineResult<PathBuf> {
        Self::leave_debris(output).await;
        Err(PipelineError::Composite(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            None,
            Some(1),
        )))
    }
}

/// Pipeline on fakes with workspaces under `work_root`.
pub fn fake_pipeline(work_root: impl Into<PathBuf>) -> VideoPipeline {
    VideoPipeline::new(
        Arc::new(FakeCapture::default()),
        Arc::new(FakeMasker),
        Arc::new(FakeCompositor),
        PipelineConfig::default().with_work_root(work_root),
    )
}
