#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the scrollcast pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building, file and stdin inputs
//! - Progress parsing from `-progress pipe:2`
//! - FFprobe video information
//! - Circular masking of the talking-head clip
//! - Bottom-right overlay compositing

pub mod command;
pub mod composite;
pub mod config;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod mask;
pub mod probe;
pub mod progress;

pub use command::{resolve_ffmpeg, resolve_ffprobe, FfmpegCommand, FfmpegPipe, FfmpegRunner};
pub use composite::Compositor;
pub use config::MediaConfig;
pub use error::{MediaError, MediaResult};
pub use mask::CircularMask;
pub use probe::{Prober, VideoInfo};
pub use progress::FfmpegProgress;
