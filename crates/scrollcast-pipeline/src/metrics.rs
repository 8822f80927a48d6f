//! Job metrics.
//!
//! No-ops until the host process installs a recorder.

use metrics::{counter, gauge, histogram};
use scrollcast_models::JobStage;

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_STARTED_TOTAL: &str = "scrollcast_jobs_started_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "scrollcast_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "scrollcast_jobs_failed_total";
    pub const JOBS_IN_FLIGHT: &str = "scrollcast_jobs_in_flight";
    pub const JOB_DURATION_SECONDS: &str = "scrollcast_job_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "scrollcast_stage_duration_seconds";
    pub const OUTPUT_BYTES: &str = "scrollcast_output_bytes";
}

pub fn record_job_started() {
    counter!(names::JOBS_STARTED_TOTAL).increment(1);
}

pub fn record_job_completed(duration_secs: f64, output_bytes: usize) {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS).record(duration_secs);
    histogram!(names::OUTPUT_BYTES).record(output_bytes as f64);
}

/// Record a failed job.
///
/// `step` is the step that failed (the error kind), `last_completed` the
/// last stage the job reached before it.
pub fn record_job_failed(step: &str, last_completed: JobStage) {
    counter!(names::JOBS_FAILED_TOTAL, &failure_labels(step, last_completed)).increment(1);
}

fn failure_labels(step: &str, last_completed: JobStage) -> [(&'static str, String); 2] {
    [
        ("step", step.to_string()),
        ("last_completed", last_completed.as_str().to_string()),
    ]
}

pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Count a job as in flight until the returned guard drops.
pub fn in_flight_guard() -> scopeguard::ScopeGuard<(), impl FnOnce(())> {
    gauge!(names::JOBS_IN_FLIGHT).increment(1.0);
    scopeguard::guard((), |_| {
        gauge!(names::JOBS_IN_FLIGHT).decrement(1.0);
    })
}
