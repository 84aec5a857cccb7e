//! Artifact fetching into a job workspace.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, warn};
use vasm_media::sequence_image_name;
use vasm_models::encoding::DEFAULT_IMAGE_EXTENSION;
use vasm_models::ArtifactKind;
use vasm_storage::ObjectStore;

use crate::error::{JobError, JobResult};
use crate::metrics;
use crate::workspace::{sanitize_component, Workspace};

/// A downloaded input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Remote key
    pub key: String,
    /// Local path inside the workspace
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

/// Downloads job inputs, attributing every failure to the object that caused it.
pub struct ArtifactFetcher<'a> {
    store: &'a dyn ObjectStore,
    workspace: &'a Workspace,
}

impl<'a> ArtifactFetcher<'a> {
    pub fn new(store: &'a dyn ObjectStore, workspace: &'a Workspace) -> Self {
        Self { store, workspace }
    }

    /// Fetch a single object, stored as `<kind>_<sanitized key>`.
    pub async fn fetch(&self, bucket: &str, key: &str, kind: ArtifactKind) -> JobResult<Artifact> {
        let local_name = local_file_name(kind, key);
        self.fetch_as(bucket, key, &local_name, kind, None).await
    }

    /// Fetch slideshow images as `img_000.<ext>`, `img_001.<ext>`, ...
    ///
    /// Every image gets the first key's extension so the files form one
    /// numbered sequence.
    pub async fn fetch_images(&self, bucket: &str, keys: &[String]) -> JobResult<Vec<Artifact>> {
        let extension = keys
            .first()
            .and_then(|key| key_extension(key))
            .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string());

        let mut artifacts = Vec::with_capacity(keys.len());
        for (index, key) in keys.iter().enumerate() {
            let local_name = sequence_image_name(index, &extension);
            artifacts.push(
                self.fetch_as(bucket, key, &local_name, ArtifactKind::Image, Some(index))
                    .await?,
            );
        }
        Ok(artifacts)
    }

    /// Fetch music tracks as `music_000.<ext>`, ... keeping each key's extension.
    pub async fn fetch_tracks(&self, bucket: &str, keys: &[String]) -> JobResult<Vec<Artifact>> {
        let mut artifacts = Vec::with_capacity(keys.len());
        for (index, key) in keys.iter().enumerate() {
            let extension = key_extension(key).unwrap_or_else(|| "mp3".to_string());
            let local_name = format!("music_{:03}.{}", index, extension);
            artifacts.push(
                self.fetch_as(bucket, key, &local_name, ArtifactKind::Music, Some(index))
                    .await?,
            );
        }
        Ok(artifacts)
    }

    async fn fetch_as(
        &self,
        bucket: &str,
        key: &str,
        local_name: &str,
        kind: ArtifactKind,
        index: Option<usize>,
    ) -> JobResult<Artifact> {
        let path = self.workspace.file(&sanitize_component(local_name));
        let start = Instant::now();

        if let Err(e) = self.store.download_file(bucket, key, &path).await {
            warn!(
                bucket = bucket,
                key = key,
                index = ?index,
                "Failed to fetch {}: {}", kind, e
            );
            return Err(JobError::missing_artifact(bucket, key, index));
        }

        metrics::record_fetch_duration(kind.as_str(), start.elapsed().as_secs_f64());

        if file_len(&path).await? == 0 {
            return Err(JobError::empty_artifact(key, index));
        }

        debug!(key = key, path = %path.display(), "Fetched {}", kind);

        Ok(Artifact {
            key: key.to_string(),
            path,
            kind,
        })
    }
}

/// Longest local file name, in bytes. Filesystems commonly cap names at 255.
const MAX_LOCAL_NAME_BYTES: usize = 128;

/// `<kind>_<sanitized key>`, keeping only the tail of very long keys so the
/// extension survives and the name fits the filesystem.
fn local_file_name(kind: ArtifactKind, key: &str) -> String {
    let prefix = format!("{}_", kind);
    let sanitized = sanitize_component(key);
    let budget = MAX_LOCAL_NAME_BYTES.saturating_sub(prefix.len());

    if sanitized.len() <= budget {
        return prefix + &sanitized;
    }

    let mut start = sanitized.len() - budget;
    while !sanitized.is_char_boundary(start) {
        start += 1;
    }
    prefix + &sanitized[start..]
}

async fn file_len(path: &Path) -> JobResult<u64> {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .map_err(|e| JobError::workspace(path, e.to_string()))
}

/// Lower-cased extension of the last path segment of `key`.
fn key_extension(key: &str) -> Option<String> {
    let name = key.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
