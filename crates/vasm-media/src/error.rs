//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found: {0}")]
    FfmpegNotFound(PathBuf),

    #[error("FFprobe not found: {0}")]
    FfprobeNotFound(PathBuf),

    #[error("Could not read duration of {target}: {raw_output}")]
    ProbeFailed { target: String, raw_output: String },

    #[error("Invalid encode plan: {0}")]
    InvalidPlan(String),

    #[error("FFmpeg failed: {message}")]
    EncodeFailed {
        message: String,
        diagnostic: String,
        exit_code: Option<i32>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a probe failure error.
    pub fn probe_failed(target: impl Into<String>, raw_output: impl Into<String>) -> Self {
        Self::ProbeFailed {
            target: target.into(),
            raw_output: raw_output.into(),
        }
    }

    /// Create an invalid plan error.
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::InvalidPlan(message.into())
    }

    /// Create an encoder failure error.
    pub fn encode_failed(
        message: impl Into<String>,
        diagnostic: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::EncodeFailed {
            message: message.into(),
            diagnostic: diagnostic.into(),
            exit_code,
        }
    }
}
