//! Screencast recorder.
//!
//! Frames from `Page.startScreencast` are acknowledged, decoded and fed as
//! MJPEG into an ffmpeg process reading `image2pipe` from stdin. A
//! [`FramePacer`] turns the repaint-driven frame stream into constant fps.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use chromiumoxide::cdp::browser_protocol::page::{
    EventScreencastFrame, ScreencastFrameAckParams, StartScreencastFormat, StartScreencastParams,
    StopScreencastParams,
};
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use scrollcast_media::{FfmpegCommand, FfmpegPipe, FfmpegRunner};

use crate::config::CaptureConfig;
use crate::error::{CaptureError, CaptureResult};
use crate::pacer::FramePacer;

/// Counters reported when a recording stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingStats {
    /// Screencast frames received from the browser
    pub frames_received: u64,
    /// Frames written to the encoder after pacing
    pub frames_written: u64,
    /// JPEG bytes written to the encoder
    pub bytes_written: u64,
}

/// Build the ffmpeg command that encodes piped JPEG frames to `output`.
pub fn recorder_command(output: &Path, config: &CaptureConfig) -> FfmpegCommand {
    FfmpegCommand::from_stdin(output)
        .format("image2pipe")
        .input_args(["-c:v", "mjpeg"])
        .frame_rate(config.fps.max(1))
        // screencast frames may arrive at odd sizes; the encoder needs one even size
        .video_filter(format!(
            "scale={}:{}",
            config.viewport.width, config.viewport.height
        ))
        .encoding(&config.encoding)
        .output_arg("-an")
}

/// Screencast parameters for the configured viewport.
pub fn screencast_params(config: &CaptureConfig) -> StartScreencastParams {
    StartScreencastParams::builder()
        .format(StartScreencastFormat::Jpeg)
        .quality(config.jpeg_quality as i64)
        .max_width(config.viewport.width as i64)
        .max_height(config.viewport.height as i64)
        .every_nth_frame(1)
        .build()
}

/// A running screencast bound to one page and one encoder.
pub struct ScreencastRecorder {
    page: Page,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<CaptureResult<RecordingStats>>,
}

impl ScreencastRecorder {
    /// Spawn the encoder and start the screencast.
    pub async fn start(
        page: &Page,
        runner: &FfmpegRunner,
        output: &Path,
        config: &CaptureConfig,
    ) -> CaptureResult<Self> {
        let pipe = runner.spawn_piped(&recorder_command(output, config))?;
        let frames = page.event_listener::<EventScreencastFrame>().await?;
        page.execute(screencast_params(config)).await?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(pump_frames(
            page.clone(),
            frames,
            pipe,
            FramePacer::new(config.fps),
            stop_rx,
        ));

        info!(
            "Screencast started at {}x{} @ {} fps",
            config.viewport.width, config.viewport.height, config.fps
        );
        Ok(Self {
            page: page.clone(),
            stop_tx,
            task,
        })
    }

    /// Stop the screencast, flush the held frame and wait for the encoder.
    pub async fn stop(self) -> CaptureResult<RecordingStats> {
        if let Err(e) = self.page.execute(StopScreencastParams::default()).await {
            warn!("Failed to stop screencast cleanly: {}", e);
        }
        // the pump may already have exited with an error
        let _ = self.stop_tx.send(());

        let stats = self.task.await.map_err(CaptureError::recorder)??;
        info!(
            "Screencast stopped: {} frames received, {} written ({} bytes)",
            stats.frames_received, stats.frames_written, stats.bytes_written
        );
        Ok(stats)
    }
}

async fn pump_frames<S>(
    page: Page,
    mut frames: S,
    mut pipe: FfmpegPipe,
    mut pacer: FramePacer,
    mut stop: oneshot::Receiver<()>,
) -> CaptureResult<RecordingStats>
where
    S: Stream<Item = Arc<EventScreencastFrame>> + Unpin,
{
    let mut stats = RecordingStats::default();
    let mut held: Option<Vec<u8>> = None;

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            frame = frames.next() => {
                let Some(frame) = frame else { break };
                stats.frames_received += 1;

                // unacknowledged frames stall the screencast
                if let Err(e) = page.execute(ScreencastFrameAckParams::new(frame.session_id)).await {
                    debug!("Screencast ack failed: {}", e);
                }

                let jpeg = decode_frame(&frame)?;
                let copies = pacer.on_frame(frame_timestamp(&frame));
                write_copies(&mut pipe, held.as_deref(), copies, &mut stats).await?;
                held = Some(jpeg);
            }
        }
    }

    let copies = pacer.finish(now_secs());
    write_copies(&mut pipe, held.as_deref(), copies, &mut stats).await?;
    stats.bytes_written = pipe.bytes_written();
    pipe.finish().await?;

    Ok(stats)
}

async fn write_copies(
    pipe: &mut FfmpegPipe,
    frame: Option<&[u8]>,
    copies: u64,
    stats: &mut RecordingStats,
) -> CaptureResult<()> {
    let Some(frame) = frame else {
        return Ok(());
    };
    for _ in 0..copies {
        pipe.write(frame).await?;
        stats.frames_written += 1;
    }
    Ok(())
}

fn decode_frame(frame: &EventScreencastFrame) -> CaptureResult<Vec<u8>> {
    let encoded: &str = frame.data.as_ref();
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| CaptureError::recorder(format!("undecodable screencast frame: {}", e)))
}

fn frame_timestamp(frame: &EventScreencastFrame) -> f64 {
    frame
        .metadata
        .timestamp
        .as_ref()
        .map(|t| *t.inner())
        .unwrap_or_else(now_secs)
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_command_reads_mjpeg_from_stdin() {
        let config = CaptureConfig::default();
        let cmd = recorder_command(Path::new("website.mp4"), &config);
        assert!(cmd.reads_stdin());

        let joined = cmd.build_args().join(" ");
        assert!(joined.contains("-f image2pipe -c:v mjpeg -framerate 30 -i -"));
        assert!(joined.contains("-vf scale=1920:1080"));
        assert!(joined.contains("-c:v libx264 -preset ultrafast"));
        assert!(joined.ends_with("-an website.mp4"));
    }

    #[test]
    fn test_screencast_params_match_viewport() {
        let params = screencast_params(&CaptureConfig::default());
        assert_eq!(params.format, Some(StartScreencastFormat::Jpeg));
        assert_eq!(params.max_width, Some(1920));
        assert_eq!(params.max_height, Some(1080));
        assert_eq!(params.every_nth_frame, Some(1));
    }
}
