//! Media tool configuration.

use std::path::PathBuf;

use crate::command::{resolve_ffmpeg, resolve_ffprobe, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::Prober;

/// Locations of the ffmpeg/ffprobe executables and encode limits.
#[derive(Debug, Clone, Default)]
pub struct MediaConfig {
    /// Explicit ffmpeg path; `PATH` lookup when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe path; `PATH` lookup when unset
    pub ffprobe_path: Option<PathBuf>,
    /// Per-encode timeout; unbounded when unset
    pub timeout_secs: Option<u64>,
}

impl MediaConfig {
    /// Load from `FFMPEG_PATH`, `FFPROBE_PATH` and `FFMPEG_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self {
            ffmpeg_path: std::env::var("FFMPEG_PATH").ok().map(PathBuf::from),
            ffprobe_path: std::env::var("FFPROBE_PATH").ok().map(PathBuf::from),
            timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Build a runner bound to the resolved ffmpeg executable.
    pub fn runner(&self) -> MediaResult<FfmpegRunner> {
        let runner = FfmpegRunner::new(resolve_ffmpeg(self.ffmpeg_path.as_deref())?);
        Ok(match self.timeout_secs {
            Some(secs) => runner.with_timeout(secs),
            None => runner,
        })
    }

    /// Build a prober bound to the resolved ffprobe executable.
    pub fn prober(&self) -> MediaResult<Prober> {
        Ok(Prober::new(resolve_ffprobe(self.ffprobe_path.as_deref())?))
    }
}
