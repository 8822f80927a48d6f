//! Job orchestration for scrollcast.
//!
//! Turns one request (a talking-head clip and a URL) into one composited
//! video, owning every intermediate file for exactly the duration of the job.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod request;
pub mod stages;
pub mod workspace;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use processor::VideoPipeline;
pub use request::{JobRequest, ProcessedVideo};
pub use stages::{ClipMasker, PageCapture, VideoCompositor};
pub use workspace::JobWorkspace;
