//! Headless Chromium page capture.
//!
//! Records a web page to video: navigate, wait until the network settles,
//! scroll to the bottom while a screencast feeds ffmpeg.

pub mod capture;
pub mod config;
pub mod error;
pub mod network_idle;
pub mod pacer;
pub mod recorder;
pub mod scroll;

pub use capture::{resolve_chrome, PageRecorder};
pub use config::CaptureConfig;
pub use error::{CaptureError, CaptureResult};
pub use network_idle::NetworkIdleTracker;
pub use pacer::FramePacer;
pub use recorder::{RecordingStats, ScreencastRecorder};
pub use scroll::{ScrollOutcome, ScrollPlan, ScrollState};
