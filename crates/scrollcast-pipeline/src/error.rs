//! Pipeline error types.

use scrollcast_browser::CaptureError;
use scrollcast_media::MediaError;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Message for a request without a clip or URL.
pub const MISSING_INPUT: &str = "Missing required files or URL";
/// Message for a URL that is not absolute http(s).
pub const INVALID_URL: &str = "Invalid website URL";

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rejected before any resource was created; the message is client-facing.
    #[error("{0}")]
    Validation(String),

    #[error("Workspace error: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Mask failed: {0}")]
    Mask(#[source] MediaError),

    #[error("Composite failed: {0}")]
    Composite(#[source] MediaError),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn missing_input() -> Self {
        Self::validation(MISSING_INPUT)
    }

    pub fn invalid_url() -> Self {
        Self::validation(INVALID_URL)
    }

    /// Whether the client sent a bad request, as opposed to a processing failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Workspace(_) => "workspace",
            Self::Capture(_) => "capture",
            Self::Mask(_) => "mask",
            Self::Composite(_) => "composite",
        }
    }
}
