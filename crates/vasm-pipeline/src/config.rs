//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use vasm_media::SlideshowTiming;
use vasm_models::encoding::{DEFAULT_MUSIC_VOLUME, DEFAULT_OUTPUT_FPS};

/// Font used for thumbnails when the request names none.
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root under which per-job workspaces are created
    pub work_dir: PathBuf,
    /// Encoder binary, a name on PATH or an absolute path
    pub ffmpeg_bin: PathBuf,
    /// Probe binary, a name on PATH or an absolute path
    pub ffprobe_bin: PathBuf,
    /// Bound on a whole job, encoder included
    pub job_timeout: Duration,
    /// How slideshow timing reaches the encoder
    pub slideshow_timing: SlideshowTiming,
    /// Music gain when the request gives none
    pub music_volume: f64,
    /// Thumbnail font when the request gives none
    pub font_path: PathBuf,
    /// Output frame rate for re-encoded video
    pub output_fps: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/vasm"),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            job_timeout: Duration::from_secs(1800), // 30 minutes
            slideshow_timing: SlideshowTiming::SegmentList,
            music_volume: DEFAULT_MUSIC_VOLUME,
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            output_fps: DEFAULT_OUTPUT_FPS,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            work_dir: std::env::var("VASM_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffmpeg_bin: std::env::var("VASM_FFMPEG_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: std::env::var("VASM_FFPROBE_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_bin),
            job_timeout: std::env::var("VASM_JOB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_timeout),
            slideshow_timing: std::env::var("VASM_SLIDESHOW_TIMING")
                .ok()
                .and_then(|s| SlideshowTiming::from_name(&s))
                .unwrap_or(defaults.slideshow_timing),
            music_volume: std::env::var("VASM_MUSIC_VOLUME")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite() && (0.0..=1.0).contains(v))
                .unwrap_or(defaults.music_volume),
            font_path: std::env::var("VASM_FONT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_path),
            output_fps: std::env::var("VASM_OUTPUT_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|fps| *fps > 0)
                .unwrap_or(defaults.output_fps),
        }
    }

    /// Use a different workspace root.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Use different engine binaries.
    pub fn with_binaries(mut self, ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        self.ffmpeg_bin = ffmpeg.into();
        self.ffprobe_bin = ffprobe.into();
        self
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.work_dir, PathBuf::from("/tmp/vasm"));
        assert_eq!(config.job_timeout, Duration::from_secs(1800));
        assert_eq!(config.slideshow_timing, SlideshowTiming::SegmentList);
        assert!((config.music_volume - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.output_fps, 30);
    }

    #[test]
    fn test_builders() {
        let config = PipelineConfig::default()
            .with_work_dir("/data/jobs")
            .with_binaries("/opt/ff/ffmpeg", "/opt/ff/ffprobe")
            .with_job_timeout(Duration::from_secs(5));
        assert_eq!(config.work_dir, PathBuf::from("/data/jobs"));
        assert_eq!(config.ffmpeg_bin, PathBuf::from("/opt/ff/ffmpeg"));
        assert_eq!(config.job_timeout, Duration::from_secs(5));
    }
}
