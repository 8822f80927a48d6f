//! Application state.

use std::path::PathBuf;

use scrollcast_browser::CaptureConfig;
use scrollcast_media::{MediaConfig, MediaResult};
use scrollcast_pipeline::{PipelineConfig, VideoPipeline};

use crate::config::ApiConfig;

/// Explicitly configured executables; `None` means look them up on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct ToolPaths {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub chrome: Option<PathBuf>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: VideoPipeline,
    pub tools: ToolPaths,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: VideoPipeline, tools: ToolPaths) -> Self {
        Self {
            config,
            pipeline,
            tools,
        }
    }

    /// Build the production pipeline from environment configuration.
    pub fn from_env(config: ApiConfig) -> MediaResult<Self> {
        let media = MediaConfig::from_env();
        let capture = CaptureConfig::from_env();
        let tools = ToolPaths {
            ffmpeg: media.ffmpeg_path.clone(),
            ffprobe: media.ffprobe_path.clone(),
            chrome: capture.chrome_path.clone(),
        };
        let pipeline = VideoPipeline::from_configs(&media, capture, PipelineConfig::from_env())?;

        Ok(Self::new(config, pipeline, tools))
    }
}
