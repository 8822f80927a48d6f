//! Video pipeline orchestrator.
//!
//! One request is one job: validate, create a workspace, capture the page,
//! mask the clip, composite, read the output, tear the workspace down.
//! Stages run in a fixed order and each starts only after the previous one
//! finished. Nothing is retried.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::Instrument;

use scrollcast_browser::{CaptureConfig, PageRecorder};
use scrollcast_media::{CircularMask, Compositor, MediaConfig, MediaError, MediaResult};
use scrollcast_models::{JobId, JobStage};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::request::{JobRequest, ProcessedVideo};
use crate::stages::{ClipMasker, PageCapture, VideoCompositor};
use crate::workspace::JobWorkspace;

/// Runs capture, mask and composite for each request.
#[derive(Clone)]
pub struct VideoPipeline {
    capture: Arc<dyn PageCapture>,
    masker: Arc<dyn ClipMasker>,
    compositor: Arc<dyn VideoCompositor>,
    config: PipelineConfig,
}

impl VideoPipeline {
    pub fn new(
        capture: Arc<dyn PageCapture>,
        masker: Arc<dyn ClipMasker>,
        compositor: Arc<dyn VideoCompositor>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            capture,
            masker,
            compositor,
            config,
        }
    }

    /// Build the pipeline on Chromium and the configured ffmpeg/ffprobe.
    pub fn from_configs(
        media: &MediaConfig,
        capture: CaptureConfig,
        config: PipelineConfig,
    ) -> MediaResult<Self> {
        let runner = media.runner()?;
        let prober = media.prober()?;

        Ok(Self::new(
            Arc::new(PageRecorder::new(capture, runner.clone())),
            Arc::new(CircularMask::new(runner.clone(), prober.clone())),
            Arc::new(Compositor::new(runner, prober)),
            config,
        ))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one job to completion.
    ///
    /// The job's workspace no longer exists when this returns, whatever the
    /// outcome.
    pub async fn process(&self, request: JobRequest) -> PipelineResult<ProcessedVideo> {
        let target = request.validate()?;

        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, "process_video");
        let span = logger.create_span();

        async move {
            metrics::record_job_started();
            let _in_flight = metrics::in_flight_guard();
            let started = Instant::now();
            logger.log_start(target.as_str());

            let workspace = match JobWorkspace::create(&self.config.work_root, &job_id).await {
                Ok(workspace) => workspace,
                Err(e) => {
                    logger.log_error(&e.to_string());
                    metrics::record_job_failed(e.kind(), JobStage::Init);
                    return Err(e);
                }
            };

            let mut stage = JobStage::Init;
            let result = self
                .run_stages(&workspace, &request.clip, target.as_str(), &logger, &mut stage)
                .await;
            workspace.teardown().await;

            match result {
                Ok(bytes) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    metrics::record_job_completed(elapsed, bytes.len());
                    logger.log_completion(&format!("{} bytes in {:.2}s", bytes.len(), elapsed));
                    Ok(ProcessedVideo { job_id, bytes })
                }
                Err(e) => {
                    metrics::record_job_failed(e.kind(), stage);
                    logger.log_error(&format!(
                        "{} step failed, {}: {}",
                        e.kind(),
                        stage.fail(),
                        e
                    ));
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        workspace: &JobWorkspace,
        clip: &Bytes,
        url: &str,
        logger: &JobLogger,
        stage: &mut JobStage,
    ) -> PipelineResult<Bytes> {
        let clip_path = workspace.clip_path();
        tokio::fs::write(&clip_path, clip).await?;

        let website_path = workspace.website_path();
        let mask_path = workspace.mask_path();

        let (website, mask) = if self.config.parallel_capture {
            let (website, mask) = tokio::try_join!(
                timed("capture", self.capture.capture(url, &website_path)),
                timed("mask", self.masker.mask(&clip_path, &mask_path)),
            )?;
            advance(stage, logger);
            advance(stage, logger);
            (website, mask)
        } else {
            let website = timed("capture", self.capture.capture(url, &website_path)).await?;
            advance(stage, logger);
            let mask = timed("mask", self.masker.mask(&clip_path, &mask_path)).await?;
            advance(stage, logger);
            (website, mask)
        };

        let output = timed(
            "composite",
            self.compositor
                .composite(&website, &mask, &workspace.output_path()),
        )
        .await?;
        advance(stage, logger);

        let bytes = read_output(&output).await?;
        advance(stage, logger);
        Ok(bytes)
    }
}

/// Move to the next stage and log it.
fn advance(stage: &mut JobStage, logger: &JobLogger) {
    if let Some(next) = stage.advance() {
        *stage = next;
        logger.log_stage(next);
    }
}

async fn timed<T>(name: &str, fut: impl Future<Output = PipelineResult<T>>) -> PipelineResult<T> {
    let started = Instant::now();
    let result = fut.await;
    let elapsed = started.elapsed().as_secs_f64();
    metrics::record_stage_duration(name, elapsed);
    tracing::debug!("Stage {} finished in {:.2}s (ok: {})", name, elapsed, result.is_ok());
    result
}

async fn read_output(path: &Path) -> PipelineResult<Bytes> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::Composite(MediaError::Io(e)))?;
    if bytes.is_empty() {
        return Err(PipelineError::Composite(MediaError::invalid_video(
            "composite produced an empty file",
        )));
    }
    Ok(Bytes::from(bytes))
}
