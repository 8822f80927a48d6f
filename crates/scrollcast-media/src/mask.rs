//! Circular mask generation for the talking-head clip.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::circular_mask_filter;
use crate::fs_utils::write_via_partial;
use crate::probe::Prober;

/// Video codec that keeps an alpha channel inside MOV.
const MASK_VIDEO_CODEC: &str = "png";
const MASK_PIXEL_FORMAT: &str = "rgba";
const MASK_AUDIO_CODEC: &str = "aac";

/// Crops a clip to a square and cuts it to a circle via alpha.
#[derive(Debug, Clone)]
pub struct CircularMask {
    runner: FfmpegRunner,
    prober: Prober,
}

impl CircularMask {
    pub fn new(runner: FfmpegRunner, prober: Prober) -> Self {
        Self { runner, prober }
    }

    /// Build the ffmpeg command writing the masked clip to `output`.
    pub fn command(input: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(input, output)
            .video_filter(circular_mask_filter())
            .video_codec(MASK_VIDEO_CODEC)
            .pixel_format(MASK_PIXEL_FORMAT)
            .audio_codec(MASK_AUDIO_CODEC)
    }

    /// Mask `input` into `output` (expected `.mov`).
    ///
    /// The output has the same duration as the input and a square frame of
    /// side `min(width, height)`.
    pub async fn apply(&self, input: &Path, output: &Path) -> MediaResult<PathBuf> {
        let info = self.prober.probe(input).await?;
        info!(
            "Masking clip {}x{} ({:.2}s) to {}px circle",
            info.width,
            info.height,
            info.duration,
            info.square_side()
        );

        let written = write_via_partial(output, |partial| async move {
            let cmd = Self::command(input, &partial);
            self.runner.run(&cmd).await
        })
        .await?;

        debug!("Mask written to {}", written.display());
        Ok(written)
    }
}
