//! Job input and output.

use bytes::Bytes;
use scrollcast_models::JobId;
use url::Url;

use crate::error::{PipelineError, PipelineResult};

/// One processing request: a talking-head clip and the page to record.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub clip: Bytes,
    pub target_url: String,
}

impl JobRequest {
    pub fn new(clip: impl Into<Bytes>, target_url: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            target_url: target_url.into(),
        }
    }

    /// Check the request before any resource is created.
    ///
    /// Returns the parsed target URL.
    pub fn validate(&self) -> PipelineResult<Url> {
        let target = self.target_url.trim();
        if self.clip.is_empty() || target.is_empty() {
            return Err(PipelineError::missing_input());
        }

        let url = Url::parse(target).map_err(|_| PipelineError::invalid_url())?;
        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(url),
            _ => Err(PipelineError::invalid_url()),
        }
    }
}

/// The composited video.
#[derive(Debug, Clone)]
pub struct ProcessedVideo {
    pub job_id: JobId,
    pub bytes: Bytes,
}
