//! Job result payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status string returned on success (kept from the original wire format).
pub const STATUS_SUCCESS: &str = "sucesso";

/// Metrics accumulated while a job runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobMetrics {
    /// Duration the output was timed against, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Number of visual segments in a slideshow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<usize>,
    /// Gain applied to background music
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Published artifact of a successful job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobOutput {
    pub status: String,
    /// Output key
    pub file: String,
    /// Output bucket
    pub bucket: String,
    #[serde(flatten)]
    pub metrics: JobMetrics,
}

impl JobOutput {
    pub fn new(bucket: impl Into<String>, file: impl Into<String>, metrics: JobMetrics) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            file: file.into(),
            bucket: bucket.into(),
            metrics,
        }
    }
}

/// Result of a probe-only job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProbeOutput {
    pub status: String,
    /// Container duration in seconds
    pub duration: f64,
}

impl ProbeOutput {
    pub fn new(duration: f64) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_flattens_metrics() {
        let output = JobOutput::new(
            "out",
            "video_1.mp4",
            JobMetrics {
                duration: Some(9.0),
                segment_count: Some(3),
                volume: None,
            },
        );
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["status"], "sucesso");
        assert_eq!(value["file"], "video_1.mp4");
        assert_eq!(value["bucket"], "out");
        assert_eq!(value["segment_count"], 3);
        assert!(value.get("volume").is_none());
    }
}
