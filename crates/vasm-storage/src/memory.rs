//! In-memory object store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

type ObjectKey = (String, String);

/// Object store backed by a map, for tests and local runs without S3.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<ObjectKey, Vec<u8>>>,
    fail_uploads: AtomicBool,
    downloads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object.
    pub fn put(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert((bucket.to_string(), key.to_string()), data.into());
        }
    }

    /// Read an object back.
    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .ok()?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys stored in a bucket, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .map(|objects| {
                objects
                    .keys()
                    .filter(|(b, _)| b == bucket)
                    .map(|(_, k)| k.clone())
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Make every subsequent upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of download attempts so far.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn download_file(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let data = self
            .get(bucket, key)
            .ok_or_else(|| StorageError::not_found(bucket, key))?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        _content_type: &str,
    ) -> StorageResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed(format!(
                "upload to {}/{} rejected",
                bucket, key
            )));
        }
        let data = tokio::fs::read(path).await?;
        self.put(bucket, key, data);
        Ok(())
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_through_files() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        store.put("in", "a.txt", b"hello".to_vec());

        let local = dir.path().join("a.txt");
        store.download_file("in", "a.txt", &local).await.unwrap();
        assert_eq!(tokio::fs::read(&local).await.unwrap(), b"hello");

        store
            .upload_file(&local, "out", "copy.txt", "text/plain")
            .await
            .unwrap();
        assert_eq!(store.get("out", "copy.txt").unwrap(), b"hello");
        assert_eq!(store.keys("out"), vec!["copy.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        let err = store
            .download_file("in", "missing.mp3", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.download_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_uploads() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("f");
        tokio::fs::write(&local, b"x").await.unwrap();

        let store = MemoryStore::new();
        store.fail_uploads(true);
        assert!(store
            .upload_file(&local, "out", "f", "text/plain")
            .await
            .is_err());
        assert!(store.keys("out").is_empty());
    }
}
