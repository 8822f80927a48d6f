//! Capture configuration.

use std::path::PathBuf;
use std::time::Duration;

use scrollcast_models::{EncodingConfig, Viewport};

use crate::scroll::{is_valid_step, ScrollPlan, DEFAULT_SCROLL_STEP_PX, DEFAULT_SCROLL_TICK};

/// Default recorder frame rate.
pub const DEFAULT_FPS: u32 = 30;
/// Default bound on navigation plus network-idle wait.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Default quiet window that counts as network idle.
pub const DEFAULT_NETWORK_IDLE: Duration = Duration::from_millis(500);
/// JPEG quality requested from the screencast.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Page capture configuration.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Browser viewport and recorded frame size
    pub viewport: Viewport,
    /// Recorder output frame rate
    pub fps: u32,
    /// Browser executable; auto-detected when unset
    pub chrome_path: Option<PathBuf>,
    /// Launch with `--no-sandbox` (needed as root in containers)
    pub no_sandbox: bool,
    /// Bound on navigation plus the network-idle wait
    pub navigation_timeout: Duration,
    /// Quiet window with zero in-flight requests
    pub network_idle: Duration,
    /// How the page is scrolled while recording
    pub scroll: ScrollPlan,
    /// Hard bound on the scroll phase; unbounded when unset
    pub max_duration: Option<Duration>,
    /// Screencast JPEG quality (0-100)
    pub jpeg_quality: u8,
    /// Encoder settings for the recording
    pub encoding: EncodingConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            fps: DEFAULT_FPS,
            chrome_path: None,
            no_sandbox: false,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            network_idle: DEFAULT_NETWORK_IDLE,
            scroll: ScrollPlan::default(),
            max_duration: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            encoding: EncodingConfig::capture(),
        }
    }
}

impl CaptureConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let scroll = scroll_plan(
            env_parse("CAPTURE_SCROLL_STEP_PX"),
            env_parse("CAPTURE_SCROLL_TICK_MS"),
            env_parse("CAPTURE_SCROLL_DURATION_SECS"),
        );

        Self {
            viewport: defaults.viewport,
            fps: env_parse::<u32>("CAPTURE_FPS")
                .filter(|fps| *fps > 0)
                .unwrap_or(DEFAULT_FPS),
            chrome_path: std::env::var("CHROME_PATH").ok().map(PathBuf::from),
            no_sandbox: std::env::var("CHROME_NO_SANDBOX")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            navigation_timeout: env_parse("CAPTURE_NAVIGATION_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_NAVIGATION_TIMEOUT),
            network_idle: env_parse("CAPTURE_NETWORK_IDLE_MS")
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_NETWORK_IDLE),
            scroll,
            max_duration: env_parse("CAPTURE_MAX_DURATION_SECS").map(Duration::from_secs),
            jpeg_quality: defaults.jpeg_quality,
            encoding: defaults.encoding,
        }
    }

    pub fn with_max_duration(mut self, max: Duration) -> Self {
        self.max_duration = Some(max);
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollPlan) -> Self {
        self.scroll = scroll;
        self
    }
}

/// Scroll plan from raw settings; unusable values fall back to the defaults.
fn scroll_plan(step_px: Option<f64>, tick_ms: Option<u64>, duration_secs: Option<u64>) -> ScrollPlan {
    let tick = tick_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_SCROLL_TICK);

    match duration_secs.filter(|secs| *secs > 0) {
        Some(secs) => ScrollPlan::timed(Duration::from_secs(secs), tick),
        None => ScrollPlan::fixed(
            step_px.filter(|s| is_valid_step(*s)).unwrap_or(DEFAULT_SCROLL_STEP_PX),
            tick,
        ),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::default();
        assert_eq!((config.viewport.width, config.viewport.height), (1920, 1080));
        assert_eq!(config.fps, 30);
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));
        assert_eq!(config.network_idle, Duration::from_millis(500));
        assert_eq!(config.scroll, ScrollPlan::fixed(100.0, Duration::from_millis(100)));
        assert_eq!(config.encoding.preset, "ultrafast");
    }

    #[test]
    fn test_infinite_scroll_is_unbounded_by_default() {
        // A page whose height keeps growing is recorded until it stops growing.
        assert!(CaptureConfig::default().max_duration.is_none());
    }

    #[test]
    fn test_scroll_plan_from_settings() {
        assert_eq!(
            scroll_plan(Some(250.0), Some(50), None),
            ScrollPlan::fixed(250.0, Duration::from_millis(50))
        );
        assert_eq!(
            scroll_plan(Some(250.0), None, Some(8)),
            ScrollPlan::timed(Duration::from_secs(8), DEFAULT_SCROLL_TICK)
        );
    }

    #[test]
    fn test_zero_tick_falls_back_to_default() {
        assert_eq!(scroll_plan(None, Some(0), None).tick(), DEFAULT_SCROLL_TICK);
    }

    #[test]
    fn test_unusable_step_falls_back_to_default() {
        for step in [0.0, -100.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                scroll_plan(Some(step), None, None),
                ScrollPlan::default(),
                "step {}",
                step
            );
        }
    }

    #[test]
    fn test_zero_scroll_duration_uses_fixed_plan() {
        assert_eq!(scroll_plan(None, None, Some(0)), ScrollPlan::default());
    }

    #[test]
    fn test_zero_fps_falls_back_to_default() {
        std::env::set_var("CAPTURE_FPS", "0");
        let config = CaptureConfig::from_env();
        std::env::remove_var("CAPTURE_FPS");
        assert_eq!(config.fps, DEFAULT_FPS);
    }

}
