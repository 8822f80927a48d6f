//! Pipeline configuration.

use std::path::PathBuf;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory job workspaces are created under
    pub work_root: PathBuf,
    /// Run capture and mask concurrently; composite still waits for both
    pub parallel_capture: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_root: std::env::temp_dir(),
            parallel_capture: false,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            work_root: std::env::var("PIPELINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            parallel_capture: std::env::var("PIPELINE_PARALLEL_CAPTURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = root.into();
        self
    }

    pub fn with_parallel_capture(mut self, enabled: bool) -> Self {
        self.parallel_capture = enabled;
        self
    }
}
