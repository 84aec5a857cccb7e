//! Job orchestration.
//!
//! Each job runs its stages strictly in order inside one workspace:
//! fetch, probe, plan, encode, publish. The workspace is removed on every
//! exit path, including timeout and a dropped job future.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, Instrument};
use vasm_media::{
    build_audio_mix, build_slideshow, build_subtitle_burn, build_thumbnail, EncodePlan,
    FfmpegRunner, Prober, ThumbnailStyle,
};
use vasm_models::{
    ArtifactKind, AudioMixRequest, EncodingConfig, JobId, JobMetrics, JobOutput, ProbeOutput,
    ProbeRequest, RequestError, SlideshowRequest, SubtitleBurnRequest, ThumbnailRequest, Variant,
};
use vasm_storage::ObjectStore;

use crate::config::PipelineConfig;
use crate::error::{JobError, JobResult};
use crate::fetcher::ArtifactFetcher;
use crate::logging::JobLogger;
use crate::metrics;
use crate::publisher::ResultPublisher;
use crate::workspace::Workspace;

/// A job that produces and publishes one artifact.
#[derive(Debug, Clone)]
pub enum JobRequest {
    Slideshow(SlideshowRequest),
    SubtitleBurn(SubtitleBurnRequest),
    AudioMix(AudioMixRequest),
    Thumbnail(ThumbnailRequest),
}

impl JobRequest {
    pub fn variant(&self) -> Variant {
        match self {
            JobRequest::Slideshow(_) => Variant::Slideshow,
            JobRequest::SubtitleBurn(_) => Variant::SubtitleBurn,
            JobRequest::AudioMix(_) => Variant::AudioMix,
            JobRequest::Thumbnail(_) => Variant::Thumbnail,
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        match self {
            JobRequest::Slideshow(r) => r.validate(),
            JobRequest::SubtitleBurn(r) => r.validate(),
            JobRequest::AudioMix(r) => r.validate(),
            JobRequest::Thumbnail(r) => r.validate(),
        }
    }
}

/// Runs assembly jobs against an injected object store.
///
/// Holds no per-job state; one instance serves concurrent jobs.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn ObjectStore>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(store: Arc<dyn ObjectStore>, config: PipelineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Run a job under a fresh job id.
    pub async fn run(&self, request: JobRequest) -> JobResult<JobOutput> {
        self.run_with_cancel(JobId::new(), request, None).await
    }

    /// Run a job that stops, killing the encoder, once `cancel` turns true.
    pub async fn run_with_cancel(
        &self,
        job_id: JobId,
        request: JobRequest,
        cancel: Option<watch::Receiver<bool>>,
    ) -> JobResult<JobOutput> {
        let variant = request.variant();
        let logger = JobLogger::new(&job_id, variant);
        let span = logger.create_span();

        async {
            logger.log_start(&format!("{} job received", variant));

            let result = match request.validate() {
                Ok(()) => {
                    let job = self.execute(&job_id, request, cancel.as_ref(), &logger);
                    self.bounded(job).await
                }
                Err(e) => Err(e.into()),
            };

            record_outcome(variant, &result, &logger);
            result
        }
        .instrument(span)
        .await
    }

    /// Probe a duration, either of a remote URL or of a stored audio object.
    pub async fn probe(&self, request: ProbeRequest) -> JobResult<ProbeOutput> {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, Variant::ProbeOnly);
        let span = logger.create_span();

        async {
            logger.log_start("probe received");

            let result = match request.validate() {
                Ok(()) => self.bounded(self.probe_inner(&job_id, &request)).await,
                Err(e) => Err(e.into()),
            };

            record_outcome(Variant::ProbeOnly, &result, &logger);
            result
        }
        .instrument(span)
        .await
    }

    async fn probe_inner(&self, job_id: &JobId, request: &ProbeRequest) -> JobResult<ProbeOutput> {
        if let Some(url) = &request.url {
            let duration = self.prober().duration_of_url(url).await?;
            return Ok(ProbeOutput::new(duration));
        }

        let (Some(bucket), Some(key)) = (&request.bucket_in, &request.audio_key) else {
            return Err(JobError::invalid_plan("bucket_in and audio_key are required"));
        };

        let workspace = Workspace::open(&self.config.work_dir, job_id).await?;
        let result: JobResult<ProbeOutput> = async {
            let audio = ArtifactFetcher::new(self.store.as_ref(), &workspace)
                .fetch(bucket, key, ArtifactKind::Audio)
                .await?;
            let duration = self.prober().duration(&audio.path).await?;
            Ok(ProbeOutput::new(duration))
        }
        .await;
        workspace.close().await;
        result
    }

    /// Bound a job by the configured timeout. Dropping the job future on
    /// expiry kills the encoder and removes the workspace.
    async fn bounded<T>(
        &self,
        job: impl std::future::Future<Output = JobResult<T>>,
    ) -> JobResult<T> {
        let limit = self.config.job_timeout;
        tokio::time::timeout(limit, job)
            .await
            .unwrap_or_else(|_| Err(JobError::Timeout(limit.as_secs())))
    }

    async fn execute(
        &self,
        job_id: &JobId,
        request: JobRequest,
        cancel: Option<&watch::Receiver<bool>>,
        logger: &JobLogger,
    ) -> JobResult<JobOutput> {
        let workspace = Workspace::open(&self.config.work_dir, job_id).await?;
        let job = JobContext {
            job_id,
            workspace: &workspace,
            cancel,
            logger,
        };

        let result = match &request {
            JobRequest::Slideshow(r) => self.slideshow(&job, r).await,
            JobRequest::SubtitleBurn(r) => self.subtitle_burn(&job, r).await,
            JobRequest::AudioMix(r) => self.audio_mix(&job, r).await,
            JobRequest::Thumbnail(r) => self.thumbnail(&job, r).await,
        };

        workspace.close().await;
        result
    }

    async fn slideshow(&self, job: &JobContext<'_>, req: &SlideshowRequest) -> JobResult<JobOutput> {
        let variant = Variant::Slideshow;
        let fetcher = ArtifactFetcher::new(self.store.as_ref(), job.workspace);

        let audio = fetcher
            .fetch(&req.bucket_in, &req.audio_key, ArtifactKind::Audio)
            .await?;
        let images = fetcher.fetch_images(&req.bucket_in, &req.images_list).await?;
        job.check_cancelled()?;

        let duration = self.prober().duration(&audio.path).await?;
        job.logger.log_progress(&format!(
            "narration lasts {:.3}s across {} images",
            duration,
            images.len()
        ));

        let image_paths: Vec<PathBuf> = images.into_iter().map(|a| a.path).collect();
        let output = job.output_path(variant);
        let built = build_slideshow(
            &image_paths,
            &audio.path,
            duration,
            self.config.slideshow_timing,
            &self.encoding(),
            &output,
        )?;
        built
            .write_support_files()
            .await
            .map_err(|e| JobError::workspace(job.workspace.path(), e.to_string()))?;

        let segment_count = built.segment_count();
        self.encode(job, variant, built.plan, Some(duration)).await?;

        self.publish(
            job,
            variant,
            &req.bucket_out,
            JobMetrics {
                duration: Some(duration),
                segment_count: Some(segment_count),
                volume: None,
            },
        )
        .await
    }

    async fn subtitle_burn(
        &self,
        job: &JobContext<'_>,
        req: &SubtitleBurnRequest,
    ) -> JobResult<JobOutput> {
        let variant = Variant::SubtitleBurn;
        let fetcher = ArtifactFetcher::new(self.store.as_ref(), job.workspace);

        let video = fetcher
            .fetch(&req.bucket_in, &req.video_key, ArtifactKind::Video)
            .await?;
        let subtitle = fetcher
            .fetch(&req.bucket_in, &req.subtitle_key, ArtifactKind::Subtitle)
            .await?;
        job.check_cancelled()?;

        let output = job.output_path(variant);
        let plan = build_subtitle_burn(&video.path, &subtitle.path, &self.encoding(), &output)?;
        self.encode(job, variant, plan, None).await?;

        self.publish(job, variant, &req.bucket_out, JobMetrics::default())
            .await
    }

    async fn audio_mix(&self, job: &JobContext<'_>, req: &AudioMixRequest) -> JobResult<JobOutput> {
        let variant = Variant::AudioMix;
        let fetcher = ArtifactFetcher::new(self.store.as_ref(), job.workspace);

        let video = fetcher
            .fetch(&req.bucket_in, &req.video_key, ArtifactKind::Video)
            .await?;
        let tracks = fetcher.fetch_tracks(&req.bucket_in, &req.music_list).await?;
        job.check_cancelled()?;

        let duration = self.prober().duration(&video.path).await?;
        let volume = req.volume.unwrap_or(self.config.music_volume);
        job.logger.log_progress(&format!(
            "mixing {} tracks at gain {} under {:.3}s of video",
            tracks.len(),
            volume,
            duration
        ));

        let track_paths: Vec<PathBuf> = tracks.into_iter().map(|a| a.path).collect();
        let output = job.output_path(variant);
        let built = build_audio_mix(&video.path, &track_paths, volume, &self.encoding(), &output)?;
        built
            .write_support_files()
            .await
            .map_err(|e| JobError::workspace(job.workspace.path(), e.to_string()))?;

        self.encode(job, variant, built.plan, Some(duration)).await?;

        self.publish(
            job,
            variant,
            &req.bucket_out,
            JobMetrics {
                duration: Some(duration),
                segment_count: None,
                volume: Some(volume),
            },
        )
        .await
    }

    async fn thumbnail(&self, job: &JobContext<'_>, req: &ThumbnailRequest) -> JobResult<JobOutput> {
        let variant = Variant::Thumbnail;
        let fetcher = ArtifactFetcher::new(self.store.as_ref(), job.workspace);

        let image = fetcher
            .fetch(&req.bucket_in, &req.image_key, ArtifactKind::Image)
            .await?;
        let font = match &req.font_key {
            Some(key) => {
                fetcher
                    .fetch(&req.bucket_in, key, ArtifactKind::Font)
                    .await?
                    .path
            }
            None => self.default_font().await?,
        };
        job.check_cancelled()?;

        let output = job.output_path(variant);
        let built = build_thumbnail(
            &image.path,
            &req.text,
            &font,
            &ThumbnailStyle::default(),
            &output,
        )?;
        job.logger.log_progress(&format!(
            "{} caption lines at {}px",
            built.lines.len(),
            built.font_size
        ));

        self.encode(job, variant, built.plan, None).await?;

        self.publish(job, variant, &req.bucket_out, JobMetrics::default())
            .await
    }

    async fn default_font(&self) -> JobResult<PathBuf> {
        let font = self.config.font_path.clone();
        match tokio::fs::metadata(&font).await {
            Ok(meta) if meta.is_file() => Ok(font),
            _ => Err(JobError::invalid_plan(format!(
                "default font {} is not available, pass font_key",
                font.display()
            ))),
        }
    }

    async fn encode(
        &self,
        job: &JobContext<'_>,
        variant: Variant,
        plan: EncodePlan,
        planned_secs: Option<f64>,
    ) -> JobResult<()> {
        job.check_cancelled()?;

        let mut runner = FfmpegRunner::new()
            .with_binary(&self.config.ffmpeg_bin)
            .with_timeout(self.config.job_timeout);
        if let Some(cancel) = job.cancel {
            runner = runner.with_cancel(cancel.clone());
        }

        let start = Instant::now();
        let outcome = runner
            .run_with_progress(plan, move |progress| {
                debug!(
                    out_time_ms = progress.out_time_ms,
                    speed = progress.speed,
                    percent = planned_secs.map(|secs| progress.percentage(secs)),
                    "Encoding progress"
                );
            })
            .await?;

        metrics::record_encode_duration(variant.as_str(), start.elapsed().as_secs_f64());
        job.logger.log_progress(&format!(
            "encoded in {:.1}s",
            outcome.elapsed.as_secs_f64()
        ));
        Ok(())
    }

    async fn publish(
        &self,
        job: &JobContext<'_>,
        variant: Variant,
        bucket: &str,
        job_metrics: JobMetrics,
    ) -> JobResult<JobOutput> {
        job.check_cancelled()?;
        ResultPublisher::new(self.store.as_ref())
            .publish(
                &job.output_path(variant),
                bucket,
                job.job_id,
                variant,
                job_metrics,
            )
            .await
    }

    fn prober(&self) -> Prober {
        Prober::new().with_binary(&self.config.ffprobe_bin)
    }

    fn encoding(&self) -> EncodingConfig {
        EncodingConfig::default().with_fps(self.config.output_fps)
    }
}

/// Per-job handles passed between stages.
struct JobContext<'a> {
    job_id: &'a JobId,
    workspace: &'a Workspace,
    cancel: Option<&'a watch::Receiver<bool>>,
    logger: &'a JobLogger,
}

impl JobContext<'_> {
    fn check_cancelled(&self) -> JobResult<()> {
        match self.cancel {
            Some(rx) if *rx.borrow() => Err(JobError::Cancelled),
            _ => Ok(()),
        }
    }

    fn output_path(&self, variant: Variant) -> PathBuf {
        self.workspace
            .file(&format!("output.{}", variant.output_extension()))
    }
}

fn record_outcome<T>(variant: Variant, result: &JobResult<T>, logger: &JobLogger) {
    match result {
        Ok(_) => {
            metrics::record_job_completed(variant.as_str());
            logger.log_completion(variant.as_str());
        }
        Err(e) => {
            metrics::record_job_failed(variant.as_str(), e.kind());
            logger.log_error(e.kind(), &e.to_string());
            if let Some(diagnostic) = e.diagnostic() {
                logger.log_warning(&format!("encoder output: {}", diagnostic));
            }
        }
    }
}
