//! Job handlers.
//!
//! Each request runs one job to completion and answers with the published
//! artifact. If the client disconnects the handler future is dropped, which
//! kills the encoder and removes the job workspace.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use vasm_models::{
    AudioMixRequest, JobOutput, ProbeOutput, ProbeRequest, SlideshowRequest,
    SubtitleBurnRequest, ThumbnailRequest,
};
use vasm_pipeline::JobRequest;

use crate::error::ApiResult;
use crate::state::AppState;

async fn run_job(state: &AppState, request: JobRequest) -> ApiResult<Json<JobOutput>> {
    let output = state.pipeline.run(request).await?;
    Ok(Json(output))
}

/// POST /criar-video
pub async fn create_video(
    State(state): State<AppState>,
    payload: Result<Json<SlideshowRequest>, JsonRejection>,
) -> ApiResult<Json<JobOutput>> {
    let Json(request) = payload?;
    run_job(&state, JobRequest::Slideshow(request)).await
}

/// POST /legendar-video
pub async fn burn_subtitles(
    State(state): State<AppState>,
    payload: Result<Json<SubtitleBurnRequest>, JsonRejection>,
) -> ApiResult<Json<JobOutput>> {
    let Json(request) = payload?;
    run_job(&state, JobRequest::SubtitleBurn(request)).await
}

/// POST /mixar-audio
pub async fn mix_audio(
    State(state): State<AppState>,
    payload: Result<Json<AudioMixRequest>, JsonRejection>,
) -> ApiResult<Json<JobOutput>> {
    let Json(request) = payload?;
    run_job(&state, JobRequest::AudioMix(request)).await
}

/// POST /criar-thumbnail
pub async fn create_thumbnail(
    State(state): State<AppState>,
    payload: Result<Json<ThumbnailRequest>, JsonRejection>,
) -> ApiResult<Json<JobOutput>> {
    let Json(request) = payload?;
    run_job(&state, JobRequest::Thumbnail(request)).await
}

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<ProbeRequest>, JsonRejection>,
) -> ApiResult<Json<ProbeOutput>> {
    let Json(request) = payload?;
    let output = state.pipeline.probe(request).await?;
    Ok(Json(output))
}
