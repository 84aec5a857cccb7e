//! Job identifiers and variant tags.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
///
/// Also names the job's workspace directory, so it must stay unique across
/// concurrent jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of assembly job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Images timed against narration audio
    Slideshow,
    /// Subtitle track burned into video pixels
    SubtitleBurn,
    /// Background music ducked under the video's narration
    AudioMix,
    /// Text overlay rendered onto a still image
    Thumbnail,
    /// Duration probe only, no encode
    ProbeOnly,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Slideshow => "slideshow",
            Variant::SubtitleBurn => "subtitle_burn",
            Variant::AudioMix => "audio_mix",
            Variant::Thumbnail => "thumbnail",
            Variant::ProbeOnly => "probe_only",
        }
    }

    /// Prefix of the published output key.
    pub fn output_prefix(&self) -> &'static str {
        match self {
            Variant::Slideshow => "video",
            Variant::SubtitleBurn => "subtitled",
            Variant::AudioMix => "mixed",
            Variant::Thumbnail => "thumb",
            Variant::ProbeOnly => "probe",
        }
    }

    /// Extension of the produced artifact.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Variant::Thumbnail => "jpg",
            _ => "mp4",
        }
    }

    /// Content type used when publishing the output.
    pub fn content_type(&self) -> &'static str {
        match self {
            Variant::Thumbnail => "image/jpeg",
            _ => "video/mp4",
        }
    }

    /// Output key for a job of this variant, e.g. `video_<job>.mp4`.
    pub fn output_key(&self, job_id: &JobId) -> String {
        format!(
            "{}_{}.{}",
            self.output_prefix(),
            job_id,
            self.output_extension()
        )
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_keys() {
        let id = JobId::from_string("abc");
        assert_eq!(Variant::Slideshow.output_key(&id), "video_abc.mp4");
        assert_eq!(Variant::SubtitleBurn.output_key(&id), "subtitled_abc.mp4");
        assert_eq!(Variant::AudioMix.output_key(&id), "mixed_abc.mp4");
        assert_eq!(Variant::Thumbnail.output_key(&id), "thumb_abc.jpg");
    }

    #[test]
    fn test_variant_serde() {
        let json = serde_json::to_string(&Variant::SubtitleBurn).unwrap();
        assert_eq!(json, "\"subtitle_burn\"");
    }
}
