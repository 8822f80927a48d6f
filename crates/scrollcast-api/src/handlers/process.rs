//! Upload-and-process handler.

use std::error::Error as StdError;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{info, warn};

use scrollcast_pipeline::JobRequest;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field holding the talking-head clip.
pub const CLIP_FIELD: &str = "talkingHeadVideo";
/// Multipart field holding the page URL.
pub const URL_FIELD: &str = "websiteUrl";
/// Download name of the processed video.
pub const OUTPUT_FILENAME: &str = "processed-video.mp4";

/// Display of the body limit error, at whatever depth it is wrapped.
const LENGTH_LIMIT_EXCEEDED: &str = "length limit exceeded";

/// Whether the body limit cut the upload short.
fn is_length_limit(e: &MultipartError) -> bool {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return true;
    }
    let mut source = e.source();
    while let Some(cause) = source {
        if cause.to_string() == LENGTH_LIMIT_EXCEEDED {
            return true;
        }
        source = cause.source();
    }
    false
}

fn form_error(e: MultipartError) -> ApiError {
    if is_length_limit(&e) {
        warn!("Upload exceeded the body limit");
        return ApiError::PayloadTooLarge;
    }
    warn!(error = %e, detail = %e.body_text(), "Unreadable multipart body");
    ApiError::invalid_form_data()
}

/// Reject a declared length over the limit before reading anything.
fn check_content_length(headers: &HeaderMap, limit: usize) -> ApiResult<()> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    match declared {
        Some(len) if len > limit as u64 => {
            warn!(content_length = len, limit, "Upload exceeds the body limit");
            Err(ApiError::PayloadTooLarge)
        }
        _ => Ok(()),
    }
}

/// Collect the two form fields; unknown fields are skipped.
async fn read_form(mut multipart: Multipart) -> ApiResult<JobRequest> {
    let mut clip = Bytes::new();
    let mut target_url = String::new();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(CLIP_FIELD) => clip = field.bytes().await.map_err(form_error)?,
            Some(URL_FIELD) => target_url = field.text().await.map_err(form_error)?,
            _ => {}
        }
    }

    Ok(JobRequest::new(clip, target_url))
}

/// `POST /api/process-video`
///
/// Records `websiteUrl`, overlays the masked `talkingHeadVideo` and responds
/// with the composited MP4.
pub async fn process_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    check_content_length(&headers, state.config.max_body_size)?;
    let multipart = multipart.map_err(|e| {
        warn!(error = %e, "Rejected non-multipart request");
        ApiError::invalid_form_data()
    })?;
    let request = read_form(multipart).await?;

    info!(
        clip_bytes = request.clip.len(),
        target_url = %request.target_url,
        "Processing video"
    );

    let video = state.pipeline.process(request).await?;

    info!(job_id = %video.job_id, bytes = video.bytes.len(), "Video ready");

    let disposition = format!("attachment; filename=\"{}\"", OUTPUT_FILENAME);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        video.bytes,
    )
        .into_response())
}
