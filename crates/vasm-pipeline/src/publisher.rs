//! Result publishing.

use std::path::Path;
use std::time::Instant;

use tracing::info;
use vasm_models::{JobId, JobMetrics, JobOutput, Variant};
use vasm_storage::ObjectStore;

use crate::error::{JobError, JobResult};
use crate::metrics;

/// Uploads a job's output under its generated key.
pub struct ResultPublisher<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> ResultPublisher<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Upload `local` to `bucket` as `<prefix>_<job id>.<ext>`.
    pub async fn publish(
        &self,
        local: &Path,
        bucket: &str,
        job_id: &JobId,
        variant: Variant,
        job_metrics: JobMetrics,
    ) -> JobResult<JobOutput> {
        let key = variant.output_key(job_id);
        let start = Instant::now();

        self.store
            .upload_file(local, bucket, &key, variant.content_type())
            .await
            .map_err(|e| JobError::upload(bucket, &key, e.to_string()))?;

        metrics::record_upload_duration(variant.as_str(), start.elapsed().as_secs_f64());

        info!(job_id = %job_id, bucket = bucket, key = %key, "Published output");

        Ok(JobOutput::new(bucket, key, job_metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vasm_storage::MemoryStore;

    #[tokio::test]
    async fn test_publish_uses_variant_key() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("out.mp4");
        tokio::fs::write(&local, b"video").await.unwrap();

        let store = MemoryStore::new();
        let job_id = JobId::from_string("abc");
        let metrics = JobMetrics {
            duration: Some(9.0),
            segment_count: Some(3),
            volume: None,
        };

        let output = ResultPublisher::new(&store)
            .publish(&local, "out", &job_id, Variant::Slideshow, metrics.clone())
            .await
            .unwrap();

        assert_eq!(output.file, "video_abc.mp4");
        assert_eq!(output.bucket, "out");
        assert_eq!(output.metrics, metrics);
        assert_eq!(store.get("out", "video_abc.mp4").unwrap(), b"video");
    }

    #[tokio::test]
    async fn test_upload_failure_names_destination() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("thumb.jpg");
        tokio::fs::write(&local, b"jpg").await.unwrap();

        let store = MemoryStore::new();
        store.fail_uploads(true);

        let err = ResultPublisher::new(&store)
            .publish(
                &local,
                "out",
                &JobId::from_string("t1"),
                Variant::Thumbnail,
                JobMetrics::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "upload");
        assert_eq!(err.bucket(), Some("out"));
        assert_eq!(err.key(), Some("thumb_t1.jpg"));
    }
}
