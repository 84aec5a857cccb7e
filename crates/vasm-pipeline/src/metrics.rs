//! Job metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "vasm_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vasm_jobs_failed_total";
    pub const ENCODE_DURATION_SECONDS: &str = "vasm_encode_duration_seconds";
    pub const FETCH_DURATION_SECONDS: &str = "vasm_fetch_duration_seconds";
    pub const UPLOAD_DURATION_SECONDS: &str = "vasm_upload_duration_seconds";
}

pub fn record_job_completed(variant: &str) {
    let labels = [("variant", variant.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
}

pub fn record_job_failed(variant: &str, kind: &str) {
    let labels = [("variant", variant.to_string()), ("kind", kind.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_encode_duration(variant: &str, duration_secs: f64) {
    let labels = [("variant", variant.to_string())];
    histogram!(names::ENCODE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_fetch_duration(kind: &str, duration_secs: f64) {
    let labels = [("kind", kind.to_string())];
    histogram!(names::FETCH_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_upload_duration(variant: &str, duration_secs: f64) {
    let labels = [("variant", variant.to_string())];
    histogram!(names::UPLOAD_DURATION_SECONDS, &labels).record(duration_secs);
}
