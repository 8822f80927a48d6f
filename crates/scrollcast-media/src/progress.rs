//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Progress information from FFmpeg's `-progress pipe:2` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Calculate progress percentage given total duration.
    pub fn percentage(&self, total: Duration) -> f64 {
        let total_ms = total.as_millis() as f64;
        if total_ms <= 0.0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_ms) * 100.0).clamp(0.0, 100.0)
    }

    /// Encoded output time.
    pub fn out_time(&self) -> Duration {
        Duration::from_millis(self.out_time_ms.max(0) as u64)
    }

    /// Fold one `key=value` line into the running state.
    ///
    /// Returns a snapshot at the end of every progress block (`progress=...`).
    pub fn apply_line(&mut self, line: &str) -> Option<FfmpegProgress> {
        let (key, value) = line.trim().split_once('=')?;

        match key {
            // out_time_ms is actually microseconds in every FFmpeg release
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    self.fps = fps;
                }
            }
            "speed" => {
                if let Some(speed) = value.trim().strip_suffix('x').and_then(|s| s.parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                self.is_complete = value == "end";
                return Some(self.clone());
            }
            _ => {}
        }

        None
    }
}

/// Whether a stderr line belongs to the `-progress` key/value stream.
///
/// Everything else on stderr is diagnostic output worth keeping.
pub fn is_progress_line(line: &str) -> bool {
    let Some((key, value)) = line.trim().split_once('=') else {
        return false;
    };
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !value.contains(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        assert!(progress.apply_line("out_time_us=5000000").is_none());
        assert_eq!(progress.out_time_ms, 5000);

        progress.apply_line("speed=1.5x");
        assert!((progress.speed - 1.5).abs() < 0.01);

        progress.apply_line("speed=N/A");
        assert!((progress.speed - 1.5).abs() < 0.01);

        let snapshot = progress.apply_line("progress=end").unwrap();
        assert!(snapshot.is_complete);
        assert_eq!(snapshot.out_time(), Duration::from_secs(5));
    }

    #[test]
    fn test_progress_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 5000,
            ..Default::default()
        };

        assert!((progress.percentage(Duration::from_secs(10)) - 50.0).abs() < 0.01);
        assert!((progress.percentage(Duration::from_secs(2)) - 100.0).abs() < 0.01);
        assert_eq!(progress.percentage(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_is_progress_line() {
        assert!(is_progress_line("frame=120"));
        assert!(is_progress_line("out_time=00:00:04.000000"));
        assert!(is_progress_line("progress=continue"));
        assert!(!is_progress_line("[libx264 @ 0x55] using cpu capabilities"));
        assert!(!is_progress_line("Error opening input file talking-head.webm."));
        assert!(!is_progress_line("[Parsed_crop_0 @ 0x5] Invalid too big or non positive size for width '640' or height '640'"));
    }
}
