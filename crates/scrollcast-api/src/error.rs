//! API error types.

use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use scrollcast_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message for a body that is not readable multipart form data.
pub const INVALID_FORM_DATA: &str = "Invalid form data";
/// Message for an upload over the body limit.
pub const PAYLOAD_TOO_LARGE: &str = "Upload too large";
/// The only message a client sees for a server-side failure.
pub const PROCESSING_FAILED: &str = "Failed to process video";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{}", PAYLOAD_TOO_LARGE)]
    PayloadTooLarge,

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn invalid_form_data() -> Self {
        Self::bad_request(INVALID_FORM_DATA)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pipeline(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client.
    fn client_message(&self) -> String {
        match self {
            ApiError::Pipeline(e) if e.is_validation() => e.to_string(),
            ApiError::Pipeline(_) | ApiError::Internal(_) => PROCESSING_FAILED.to_string(),
            other => other.to_string(),
        }
    }
}

/// `error: cause: cause ...` down the source chain.
fn cause_chain(err: &dyn StdError) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            match &self {
                ApiError::Pipeline(e) => error!(
                    kind = e.kind(),
                    "Video processing failed: {}",
                    cause_chain(e)
                ),
                other => error!("Request failed: {}", cause_chain(other)),
            }
        }

        let body = ErrorResponse {
            error: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}
