//! Job identity and lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stage of a single job.
///
/// The happy path is strictly linear:
/// `Init -> Captured -> Masked -> Composited -> Done`.
/// `Failed` can be entered from any non-terminal stage and remembers where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum JobStage {
    /// Inputs accepted, nothing produced yet
    #[default]
    Init,
    /// Page recording written
    Captured,
    /// Circular mask applied to the clip
    Masked,
    /// Final output encoded
    Composited,
    /// Output read back and workspace released
    Done,
    /// A step failed
    Failed { at: FailedStage },
}

/// Non-terminal stage a job failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    Init,
    Captured,
    Masked,
    Composited,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Init => "init",
            JobStage::Captured => "captured",
            JobStage::Masked => "masked",
            JobStage::Composited => "composited",
            JobStage::Done => "done",
            JobStage::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Done | JobStage::Failed { .. })
    }

    /// Next stage on the happy path, `None` once terminal.
    pub fn advance(self) -> Option<JobStage> {
        match self {
            JobStage::Init => Some(JobStage::Captured),
            JobStage::Captured => Some(JobStage::Masked),
            JobStage::Masked => Some(JobStage::Composited),
            JobStage::Composited => Some(JobStage::Done),
            JobStage::Done | JobStage::Failed { .. } => None,
        }
    }

    /// Transition into `Failed`, recording the current stage.
    ///
    /// Terminal stages stay as they are.
    pub fn fail(self) -> JobStage {
        let at = match self {
            JobStage::Init => FailedStage::Init,
            JobStage::Captured => FailedStage::Captured,
            JobStage::Masked => FailedStage::Masked,
            JobStage::Composited => FailedStage::Composited,
            terminal => return terminal,
        };
        JobStage::Failed { at }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Failed { at } => write!(f, "failed after {:?}", at),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_is_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_happy_path_is_linear() {
        let mut stage = JobStage::Init;
        let mut seen = vec![stage];
        while let Some(next) = stage.advance() {
            stage = next;
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                JobStage::Init,
                JobStage::Captured,
                JobStage::Masked,
                JobStage::Composited,
                JobStage::Done,
            ]
        );
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_fail_records_stage() {
        assert_eq!(
            JobStage::Captured.fail(),
            JobStage::Failed {
                at: FailedStage::Captured
            }
        );
        assert_eq!(JobStage::Done.fail(), JobStage::Done);

        let failed = JobStage::Init.fail();
        assert!(failed.is_terminal());
        assert_eq!(failed.advance(), None);
        assert_eq!(failed.fail(), failed);
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&JobStage::Masked.fail()).unwrap();
        assert_eq!(json, r#"{"stage":"failed","at":"masked"}"#);
    }
}
