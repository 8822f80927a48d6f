//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use scrollcast_browser::resolve_chrome;
use scrollcast_media::{resolve_ffmpeg, resolve_ffprobe};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub ffmpeg: CheckStatus,
    pub ffprobe: CheckStatus,
    pub browser: CheckStatus,
}

impl ReadinessChecks {
    fn all_ok(&self) -> bool {
        [&self.ffmpeg, &self.ffprobe, &self.browser]
            .iter()
            .all(|c| c.is_ok())
    }
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn resolved(path: &std::path::Path) -> Self {
        Self {
            status: "ok".to_string(),
            path: Some(path.display().to_string()),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            path: None,
            error: Some(msg.into()),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness probe: every external executable a job needs must resolve.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let tools = &state.tools;

    let ffmpeg = match resolve_ffmpeg(tools.ffmpeg.as_deref()) {
        Ok(path) => CheckStatus::resolved(&path),
        Err(e) => CheckStatus::error(e.to_string()),
    };
    let ffprobe = match resolve_ffprobe(tools.ffprobe.as_deref()) {
        Ok(path) => CheckStatus::resolved(&path),
        Err(e) => CheckStatus::error(e.to_string()),
    };
    let browser = match resolve_chrome(tools.chrome.as_deref()) {
        Some(path) => CheckStatus::resolved(&path),
        None => CheckStatus::error("Chromium not found (set CHROME_PATH or install chromium)"),
    };

    let checks = ReadinessChecks {
        ffmpeg,
        ffprobe,
        browser,
    };
    let all_ok = checks.all_ok();

    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks,
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
