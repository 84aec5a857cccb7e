//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Progress percentage against the planned output duration in seconds.
    pub fn percentage(&self, planned_secs: f64) -> f64 {
        if planned_secs <= 0.0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / (planned_secs * 1000.0)) * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 4500,
            ..Default::default()
        };

        assert!((progress.percentage(9.0) - 50.0).abs() < 0.01);
        assert!((progress.percentage(4.5) - 100.0).abs() < 0.01);
        assert_eq!(progress.percentage(0.0), 0.0);
    }
}
