//! Job request payloads.
//!
//! Every field defaults to empty when absent so that a missing parameter is
//! reported by `validate()` with the field's wire name instead of a generic
//! deserialization failure.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed or incomplete job parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("List must not be empty: {0}")]
    EmptyList(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn require(field: &'static str, value: &str) -> Result<(), RequestError> {
    if value.trim().is_empty() {
        return Err(RequestError::MissingField(field));
    }
    Ok(())
}

fn require_list(field: &'static str, values: &[String]) -> Result<(), RequestError> {
    if values.is_empty() {
        return Err(RequestError::EmptyList(field));
    }
    if let Some(index) = values.iter().position(|v| v.trim().is_empty()) {
        return Err(RequestError::InvalidValue {
            field,
            reason: format!("item {} is an empty key", index),
        });
    }
    Ok(())
}

/// Slideshow: images timed against narration audio.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SlideshowRequest {
    #[serde(default)]
    pub bucket_in: String,
    #[serde(default)]
    pub audio_key: String,
    #[serde(default)]
    pub images_list: Vec<String>,
    #[serde(default)]
    pub bucket_out: String,
}

impl SlideshowRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), RequestError> {
        require_list("images_list", &self.images_list)?;
        require("bucket_in", &self.bucket_in)?;
        require("audio_key", &self.audio_key)?;
        require("bucket_out", &self.bucket_out)
    }
}

/// Subtitle burn-in onto an existing video.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SubtitleBurnRequest {
    #[serde(default)]
    pub bucket_in: String,
    #[serde(default)]
    pub video_key: String,
    #[serde(default)]
    pub subtitle_key: String,
    #[serde(default)]
    pub bucket_out: String,
}

impl SubtitleBurnRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), RequestError> {
        require("bucket_in", &self.bucket_in)?;
        require("video_key", &self.video_key)?;
        require("subtitle_key", &self.subtitle_key)?;
        require("bucket_out", &self.bucket_out)
    }
}

/// Background music mixed under a video's narration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AudioMixRequest {
    #[serde(default)]
    pub bucket_in: String,
    #[serde(default)]
    pub video_key: String,
    #[serde(default)]
    pub music_list: Vec<String>,
    /// Music gain; falls back to the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default)]
    pub bucket_out: String,
}

impl AudioMixRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), RequestError> {
        require_list("music_list", &self.music_list)?;
        require("bucket_in", &self.bucket_in)?;
        require("video_key", &self.video_key)?;
        require("bucket_out", &self.bucket_out)?;

        if let Some(volume) = self.volume {
            if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
                return Err(RequestError::InvalidValue {
                    field: "volume",
                    reason: format!("{} is outside 0.0..=1.0", volume),
                });
            }
        }
        Ok(())
    }
}

/// Text overlay rendered onto a still image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ThumbnailRequest {
    #[serde(default)]
    pub bucket_in: String,
    #[serde(default)]
    pub image_key: String,
    #[serde(default)]
    pub text: String,
    /// Optional font object; the configured default font is used otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_key: Option<String>,
    #[serde(default)]
    pub bucket_out: String,
}

impl ThumbnailRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), RequestError> {
        require("bucket_in", &self.bucket_in)?;
        require("image_key", &self.image_key)?;
        require("text", &self.text)?;
        if let Some(font_key) = &self.font_key {
            require("font_key", font_key)?;
        }
        require("bucket_out", &self.bucket_out)
    }
}

/// Duration probe of a remote URL or a stored audio object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProbeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_key: Option<String>,
}

impl ProbeRequest {
    /// Validate the request.
    ///
    /// Either `url` or both `bucket_in` and `audio_key` must be present.
    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(url) = &self.url {
            require("url", url)?;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(RequestError::InvalidValue {
                    field: "url",
                    reason: "only http(s) URLs can be probed".to_string(),
                });
            }
            return Ok(());
        }

        match (&self.bucket_in, &self.audio_key) {
            (Some(bucket), Some(key)) => {
                require("bucket_in", bucket)?;
                require("audio_key", key)
            }
            (None, _) if self.audio_key.is_none() => Err(RequestError::MissingField("url")),
            (None, _) => Err(RequestError::MissingField("bucket_in")),
            (Some(_), None) => Err(RequestError::MissingField("audio_key")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slideshow_empty_images_rejected_first() {
        let request: SlideshowRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(
            request.validate(),
            Err(RequestError::EmptyList("images_list"))
        );
    }

    #[test]
    fn test_slideshow_blank_image_key_reports_index() {
        let request = SlideshowRequest {
            bucket_in: "in".into(),
            audio_key: "a.mp3".into(),
            images_list: vec!["a.jpg".into(), " ".into()],
            bucket_out: "out".into(),
        };
        match request.validate() {
            Err(RequestError::InvalidValue { field, reason }) => {
                assert_eq!(field, "images_list");
                assert!(reason.contains("item 1"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_audio_mix_volume_bounds() {
        let mut request = AudioMixRequest {
            bucket_in: "in".into(),
            video_key: "v.mp4".into(),
            music_list: vec!["m.mp3".into()],
            volume: Some(0.15),
            bucket_out: "out".into(),
        };
        assert!(request.validate().is_ok());

        request.volume = Some(1.5);
        assert!(request.validate().is_err());

        request.volume = Some(f64::NAN);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_subtitle_missing_key() {
        let request = SubtitleBurnRequest {
            bucket_in: "in".into(),
            video_key: "v.mp4".into(),
            subtitle_key: String::new(),
            bucket_out: "out".into(),
        };
        assert_eq!(
            request.validate(),
            Err(RequestError::MissingField("subtitle_key"))
        );
    }

    #[test]
    fn test_probe_request_modes() {
        let by_url = ProbeRequest {
            url: Some("https://example.com/a.mp3".into()),
            ..Default::default()
        };
        assert!(by_url.validate().is_ok());

        let by_key = ProbeRequest {
            bucket_in: Some("in".into()),
            audio_key: Some("a.mp3".into()),
            ..Default::default()
        };
        assert!(by_key.validate().is_ok());

        let neither = ProbeRequest::default();
        assert_eq!(neither.validate(), Err(RequestError::MissingField("url")));

        let file_url = ProbeRequest {
            url: Some("file:///etc/passwd".into()),
            ..Default::default()
        };
        assert!(file_url.validate().is_err());
    }
}
