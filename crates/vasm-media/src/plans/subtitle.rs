//! Subtitle burn-in.

use std::path::Path;

use vasm_models::encoding::PLAYER_PIXEL_FORMAT;
use vasm_models::EncodingConfig;

use crate::command::{EncodePlan, MediaInput};
use crate::error::{MediaError, MediaResult};
use crate::filters::{escape_filter_value, FilterChain};

/// Render `subtitle` into the pixels of `video`.
///
/// Video is re-encoded; the audio stream is copied untouched.
pub fn build_subtitle_burn(
    video: &Path,
    subtitle: &Path,
    encoding: &EncodingConfig,
    output: &Path,
) -> MediaResult<EncodePlan> {
    let subtitle_path = subtitle.to_string_lossy();
    if subtitle_path.is_empty() {
        return Err(MediaError::invalid_plan("subtitle path is empty"));
    }

    let chain = FilterChain::new().filter(format!(
        "subtitles=filename='{}'",
        escape_filter_value(&subtitle_path)
    ));

    Ok(EncodePlan::new(output)
        .input(MediaInput::new(video))
        .input(MediaInput::new(subtitle))
        .video_filter(chain)
        .map("0:v")
        .map("0:a?")
        .video_codec(&encoding.codec)
        .preset(&encoding.preset)
        .crf(encoding.crf)
        .pixel_format(PLAYER_PIXEL_FORMAT)
        .audio_codec("copy"))
}
