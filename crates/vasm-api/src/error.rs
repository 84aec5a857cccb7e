//! API error types.
//!
//! Failures are returned as `{"erro": <message>, "kind": <kind>}` plus the
//! bucket, key and list index of the offending object when known.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use vasm_pipeline::JobError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Job(#[from] JobError),

    #[error("Invalid request body: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Job(e) => e.kind(),
            ApiError::BadRequest(_) => "invalid_request",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Job(e) => match e {
                JobError::InvalidPlan(_) => StatusCode::BAD_REQUEST,
                JobError::MissingArtifact { .. } => StatusCode::NOT_FOUND,
                JobError::EmptyArtifact { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                JobError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                JobError::Probe { .. }
                | JobError::Encode { .. }
                | JobError::Upload { .. }
                | JobError::Workspace { .. }
                | JobError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    erro: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(kind = self.kind(), "Request failed: {}", self);
        }

        let (bucket, key, index) = match &self {
            ApiError::Job(e) => (
                e.bucket().map(str::to_string),
                e.key().map(str::to_string),
                e.index(),
            ),
            _ => (None, None, None),
        };

        let body = ErrorResponse {
            erro: self.to_string(),
            kind: self.kind(),
            bucket,
            key,
            index,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing: ApiError = JobError::missing_artifact("in", "a.jpg", Some(0)).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let empty: ApiError = JobError::empty_artifact("a.mp3", None).into();
        assert_eq!(empty.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let invalid: ApiError = JobError::invalid_plan("images_list is empty").into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let timeout: ApiError = JobError::Timeout(10).into();
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let upload: ApiError = JobError::upload("out", "video_x.mp4", "denied").into();
        assert_eq!(upload.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upload.kind(), "upload");
    }
}
