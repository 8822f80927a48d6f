//! Mask geometry checks against a real ffmpeg.
//!
//! Ignored by default; run with `cargo test -- --ignored` where ffmpeg and
//! ffprobe are installed.

use std::path::{Path, PathBuf};
use std::process::Command;

use scrollcast_media::{resolve_ffmpeg, resolve_ffprobe, CircularMask, FfmpegRunner, Prober};
use tempfile::TempDir;

fn tools() -> (PathBuf, PathBuf) {
    (
        resolve_ffmpeg(None).expect("ffmpeg on PATH"),
        resolve_ffprobe(None).expect("ffprobe on PATH"),
    )
}

/// Two-second 320x240 test pattern with a sine tone.
fn synth_clip(ffmpeg: &Path, output: &Path) {
    let status = Command::new(ffmpeg)
        .args(["-y", "-hide_banner", "-v", "error"])
        .args(["-f", "lavfi", "-i", "testsrc=size=320x240:rate=30:duration=2"])
        .args(["-f", "lavfi", "-i", "sine=frequency=440:duration=2"])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac", "-shortest"])
        .arg(output)
        .status()
        .unwrap();
    assert!(status.success());
}

/// First frame as raw RGBA bytes.
fn first_frame_rgba(ffmpeg: &Path, input: &Path) -> Vec<u8> {
    let out = Command::new(ffmpeg)
        .args(["-hide_banner", "-v", "error", "-i"])
        .arg(input)
        .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "-"])
        .output()
        .unwrap();
    assert!(out.status.success());
    out.stdout
}

fn alpha_at(frame: &[u8], side: usize, x: usize, y: usize) -> u8 {
    frame[(y * side + x) * 4 + 3]
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe on PATH"]
async fn test_landscape_clip_becomes_square_circle() {
    let (ffmpeg, ffprobe) = tools();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("talking-head.mp4");
    let output = dir.path().join("mask.mov");
    synth_clip(&ffmpeg, &input);

    let prober = Prober::new(&ffprobe);
    let mask = CircularMask::new(FfmpegRunner::new(&ffmpeg), prober.clone());
    let written = mask.apply(&input, &output).await.unwrap();
    assert_eq!(written, output);

    let info = prober.probe(&output).await.unwrap();
    assert_eq!((info.width, info.height), (240, 240));
    assert!(info.has_audio);
    assert!((info.duration - 2.0).abs() < 0.2);

    let frame = first_frame_rgba(&ffmpeg, &output);
    let side = 240;
    assert_eq!(frame.len(), side * side * 4);
    assert_eq!(alpha_at(&frame, side, side / 2, side / 2), 255);
    assert_eq!(alpha_at(&frame, side, 0, 0), 0);
    assert_eq!(alpha_at(&frame, side, side - 1, 0), 0);
    assert_eq!(alpha_at(&frame, side, 0, side - 1), 0);
    assert_eq!(alpha_at(&frame, side, side - 1, side - 1), 0);
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe on PATH"]
async fn test_unreadable_input_leaves_no_output() {
    let (ffmpeg, ffprobe) = tools();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("talking-head.webm");
    std::fs::write(&input, b"not a video").unwrap();
    let output = dir.path().join("mask.mov");

    let mask = CircularMask::new(FfmpegRunner::new(&ffmpeg), Prober::new(&ffprobe));
    assert!(mask.apply(&input, &output).await.is_err());

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name())
        .filter(|name| name != "talking-head.webm")
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {:?}", leftovers);
}
