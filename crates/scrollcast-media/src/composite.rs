//! Overlay compositing of the masked clip onto the page recording.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use scrollcast_models::{EncodingConfig, OverlayLayout};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::{overlay_filter, OVERLAY_OUTPUT_LABEL};
use crate::fs_utils::write_via_partial;
use crate::probe::Prober;

/// Optional audio of the second input (the talking-head clip).
const OVERLAY_AUDIO_MAP: &str = "1:a?";

/// Composites a masked clip bottom-right over a base video.
#[derive(Debug, Clone)]
pub struct Compositor {
    runner: FfmpegRunner,
    prober: Prober,
    layout: OverlayLayout,
    encoding: EncodingConfig,
}

impl Compositor {
    /// Create a compositor with the default layout and encoding.
    pub fn new(runner: FfmpegRunner, prober: Prober) -> Self {
        Self {
            runner,
            prober,
            layout: OverlayLayout::default(),
            encoding: EncodingConfig::composite(),
        }
    }

    pub fn with_layout(mut self, layout: OverlayLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Build the two-input ffmpeg command.
    pub fn command(&self, base: &Path, overlay: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(base, output)
            .input(overlay)
            .filter_complex(overlay_filter(&self.layout))
            .map(OVERLAY_OUTPUT_LABEL)
            .map(OVERLAY_AUDIO_MAP)
            .encoding(&self.encoding)
            .audio_codec(self.encoding.audio_codec.clone())
            .faststart()
    }

    /// Composite `overlay` onto `base`, writing an MP4 to `output`.
    pub async fn composite(
        &self,
        base: &Path,
        overlay: &Path,
        output: &Path,
    ) -> MediaResult<PathBuf> {
        let base_info = self.prober.probe(base).await?;
        let total = base_info.duration();
        info!(
            "Compositing overlay onto {}x{} base ({:.2}s)",
            base_info.width, base_info.height, base_info.duration
        );

        let written = write_via_partial(output, |partial| async move {
            let cmd = self.command(base, overlay, &partial);
            self.runner
                .run_with_progress(&cmd, move |progress| {
                    debug!(
                        "Composite progress: {:.1}% (frame {}, {:.2}x)",
                        progress.percentage(total),
                        progress.frame,
                        progress.speed
                    );
                })
                .await
        })
        .await?;

        info!("Composite written to {}", written.display());
        Ok(written)
    }
}
