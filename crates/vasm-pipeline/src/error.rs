//! Job error taxonomy.
//!
//! Every stage failure becomes one of these kinds. Errors that concern a
//! particular input keep its bucket, key and list position.

use std::path::{Path, PathBuf};

use thiserror::Error;
use vasm_media::MediaError;
use vasm_models::RequestError;

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Artifact not found: {bucket}/{key}{}", position(.index))]
    MissingArtifact {
        bucket: String,
        key: String,
        index: Option<usize>,
    },

    #[error("Artifact is empty: {key}{}", position(.index))]
    EmptyArtifact { key: String, index: Option<usize> },

    #[error("Could not read duration of {}: {raw_output}", .path.display())]
    Probe { path: PathBuf, raw_output: String },

    #[error("Invalid job parameters: {0}")]
    InvalidPlan(String),

    #[error("Encoding failed: {message}")]
    Encode {
        message: String,
        diagnostic: String,
        exit_code: Option<i32>,
    },

    #[error("Upload to {bucket}/{key} failed: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Workspace {} unusable: {reason}", .path.display())]
    Workspace { path: PathBuf, reason: String },

    #[error("Job cancelled")]
    Cancelled,

    #[error("Job timed out after {0} seconds")]
    Timeout(u64),
}

fn position(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" (item {})", i),
        None => String::new(),
    }
}

impl JobError {
    pub fn missing_artifact(
        bucket: impl Into<String>,
        key: impl Into<String>,
        index: Option<usize>,
    ) -> Self {
        Self::MissingArtifact {
            bucket: bucket.into(),
            key: key.into(),
            index,
        }
    }

    pub fn empty_artifact(key: impl Into<String>, index: Option<usize>) -> Self {
        Self::EmptyArtifact {
            key: key.into(),
            index,
        }
    }

    pub fn invalid_plan(msg: impl Into<String>) -> Self {
        Self::InvalidPlan(msg.into())
    }

    pub fn upload(
        bucket: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Upload {
            bucket: bucket.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn workspace(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Workspace {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Stable snake_case tag for callers to branch on.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::MissingArtifact { .. } => "missing_artifact",
            JobError::EmptyArtifact { .. } => "empty_artifact",
            JobError::Probe { .. } => "probe",
            JobError::InvalidPlan(_) => "invalid_plan",
            JobError::Encode { .. } => "encode",
            JobError::Upload { .. } => "upload",
            JobError::Workspace { .. } => "workspace",
            JobError::Cancelled => "cancelled",
            JobError::Timeout(_) => "timeout",
        }
    }

    /// Bucket of the offending object, if the error names one.
    pub fn bucket(&self) -> Option<&str> {
        match self {
            JobError::MissingArtifact { bucket, .. } | JobError::Upload { bucket, .. } => {
                Some(bucket)
            }
            _ => None,
        }
    }

    /// Key of the offending object, if the error names one.
    pub fn key(&self) -> Option<&str> {
        match self {
            JobError::MissingArtifact { key, .. }
            | JobError::EmptyArtifact { key, .. }
            | JobError::Upload { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Position of the offending item in a request list.
    pub fn index(&self) -> Option<usize> {
        match self {
            JobError::MissingArtifact { index, .. } | JobError::EmptyArtifact { index, .. } => {
                *index
            }
            _ => None,
        }
    }

    /// Captured encoder stderr, for encode failures.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            JobError::Encode { diagnostic, .. } if !diagnostic.is_empty() => Some(diagnostic),
            _ => None,
        }
    }
}

impl From<RequestError> for JobError {
    fn from(err: RequestError) -> Self {
        Self::InvalidPlan(err.to_string())
    }
}

impl From<MediaError> for JobError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::ProbeFailed { target, raw_output } => Self::Probe {
                path: PathBuf::from(target),
                raw_output,
            },
            MediaError::FfprobeNotFound(binary) => Self::Probe {
                raw_output: format!("probe binary {} not found", binary.display()),
                path: binary,
            },
            MediaError::InvalidPlan(msg) => Self::InvalidPlan(msg),
            MediaError::EncodeFailed {
                message,
                diagnostic,
                exit_code,
            } => Self::Encode {
                message,
                diagnostic,
                exit_code,
            },
            MediaError::FfmpegNotFound(binary) => Self::Encode {
                message: format!("encoder binary {} not found", binary.display()),
                diagnostic: String::new(),
                exit_code: None,
            },
            MediaError::Cancelled => Self::Cancelled,
            MediaError::Timeout(secs) => Self::Timeout(secs),
            MediaError::Io(e) => Self::Encode {
                message: format!("I/O error: {}", e),
                diagnostic: String::new(),
                exit_code: None,
            },
        }
    }
}
