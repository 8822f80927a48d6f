//! Shared data models for the scrollcast pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Job identity and the linear job state machine
//! - Capture viewport and overlay placement
//! - Encoding configuration and fixed defaults

pub mod encoding;
pub mod job;
pub mod layout;

// Re-export common types
pub use encoding::EncodingConfig;
pub use job::{FailedStage, JobId, JobStage};
pub use layout::{OverlayLayout, Viewport};
