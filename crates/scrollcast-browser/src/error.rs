//! Error types for page capture.

use chromiumoxide::error::CdpError;
use scrollcast_media::MediaError;
use thiserror::Error;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors that can occur while recording a page.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Page did not reach network idle within {0} seconds")]
    NavigationTimeout(u64),

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Screencast recorder failed: {0}")]
    Recorder(String),

    #[error("Recorder encoder failed: {0}")]
    Encoder(#[from] MediaError),

    #[error("Browser protocol error: {0}")]
    Browser(#[from] CdpError),
}

impl CaptureError {
    pub fn navigation(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn script(message: impl ToString) -> Self {
        Self::Script(message.to_string())
    }

    pub fn recorder(message: impl ToString) -> Self {
        Self::Recorder(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_error_keeps_ffmpeg_output() {
        let err: CaptureError =
            MediaError::ffmpeg_failed("FFmpeg exited with non-zero status", Some("pipe:: Invalid data".into()), Some(1))
                .into();
        assert!(err.to_string().contains("pipe:: Invalid data"));
    }

    #[test]
    fn test_navigation_message() {
        let err = CaptureError::navigation("https://example.com", "net::ERR_NAME_NOT_RESOLVED");
        assert_eq!(
            err.to_string(),
            "Navigation to https://example.com failed: net::ERR_NAME_NOT_RESOLVED"
        );
    }
}
