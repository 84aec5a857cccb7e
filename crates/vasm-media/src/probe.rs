//! FFprobe duration extraction.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Arguments asking ffprobe for the container duration only, printed bare.
pub fn duration_probe_args(target: &str) -> Vec<String> {
    [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
        target,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Parse the single duration token printed by ffprobe.
///
/// Returns `None` for missing, non-numeric (`N/A`), non-finite or
/// non-positive values.
pub fn parse_duration_output(raw: &str) -> Option<f64> {
    let token = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let duration: f64 = token.parse().ok()?;
    if duration.is_finite() && duration > 0.0 {
        Some(duration)
    } else {
        None
    }
}

/// Duration prober backed by the ffprobe binary.
#[derive(Debug, Clone)]
pub struct Prober {
    binary: PathBuf,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober {
    /// Use `ffprobe` from PATH.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
        }
    }

    /// Use a specific probe binary.
    pub fn with_binary(mut self, binary: impl AsRef<Path>) -> Self {
        self.binary = binary.as_ref().to_path_buf();
        self
    }

    /// Duration in seconds of a local media file.
    pub async fn duration(&self, path: impl AsRef<Path>) -> MediaResult<f64> {
        let path = path.as_ref();
        self.probe_target(&path.to_string_lossy()).await
    }

    /// Duration in seconds of a remote media URL.
    pub async fn duration_of_url(&self, url: &str) -> MediaResult<f64> {
        self.probe_target(url).await
    }

    /// Resolve the probe binary.
    pub fn locate(&self) -> MediaResult<PathBuf> {
        which::which(&self.binary).map_err(|_| MediaError::FfprobeNotFound(self.binary.clone()))
    }

    async fn probe_target(&self, target: &str) -> MediaResult<f64> {
        let binary = self.locate()?;

        debug!("Probing duration of {}", target);

        let output = Command::new(&binary)
            .args(duration_probe_args(target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let raw = if stderr.is_empty() { stdout } else { stderr };
            return Err(MediaError::probe_failed(target, raw));
        }

        parse_duration_output(&stdout).ok_or_else(|| MediaError::probe_failed(target, stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_output("177.532\n"), Some(177.532));
        assert_eq!(parse_duration_output("  9.000000  "), Some(9.0));
        assert_eq!(parse_duration_output("\n12.5\n"), Some(12.5));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration_output(""), None);
        assert_eq!(parse_duration_output("N/A"), None);
        assert_eq!(parse_duration_output("0.000"), None);
        assert_eq!(parse_duration_output("-3"), None);
        assert_eq!(parse_duration_output("inf"), None);
    }

    #[test]
    fn test_probe_args_request_only_duration() {
        let args = duration_probe_args("/tmp/a.mp3");
        assert!(args.contains(&"format=duration".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/a.mp3");
    }

    #[tokio::test]
    async fn test_missing_probe_binary() {
        let prober = Prober::new().with_binary("/nonexistent/vasm-ffprobe");
        let err = prober.duration("/tmp/a.mp3").await.unwrap_err();
        assert!(matches!(err, MediaError::FfprobeNotFound(_)));
    }
}
