//! Object store abstraction.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Remote object storage as consumed by the pipeline.
///
/// Buckets are passed per call because every job names its own input and
/// output buckets.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download `bucket/key` to a local file, creating or truncating it.
    async fn download_file(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()>;

    /// Upload a local file to `bucket/key`.
    async fn upload_file(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Check that the storage service is reachable.
    async fn check_connectivity(&self) -> StorageResult<()>;
}
