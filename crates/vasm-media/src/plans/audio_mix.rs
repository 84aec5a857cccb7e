//! Background music mixed under a video's narration.

use std::path::{Path, PathBuf};

use vasm_models::EncodingConfig;

use super::{common_directory, write_concat_list};
use crate::command::{EncodePlan, MediaInput};
use crate::concat::ConcatList;
use crate::error::{MediaError, MediaResult};
use crate::filters::{FilterChain, FilterGraph};

/// File name of the music list written next to the tracks.
pub const MUSIC_LIST_NAME: &str = "music.txt";

const NARRATION_LABEL: &str = "narration";
const MUSIC_LABEL: &str = "music";
const MIXED_LABEL: &str = "mixed";

/// A built music mix plan.
#[derive(Debug, Clone)]
pub struct AudioMixPlan {
    pub plan: EncodePlan,
    pub music_list_path: PathBuf,
    pub music_list: ConcatList,
    /// Gain applied to the music
    pub volume: f64,
}

impl AudioMixPlan {
    pub async fn write_support_files(&self) -> MediaResult<()> {
        write_concat_list(&self.music_list_path, &self.music_list).await
    }
}

/// The ducking graph: both tracks to stereo, music attenuated, mixed for
/// as long as the narration lasts.
pub fn ducking_graph(volume: f64) -> FilterGraph {
    FilterGraph::new()
        .chain(
            FilterChain::new()
                .input("0:a")
                .filter("aformat=channel_layouts=stereo")
                .output(NARRATION_LABEL),
        )
        .chain(
            FilterChain::new()
                .input("1:a")
                .filter("aformat=channel_layouts=stereo")
                .filter(format!("volume={}", volume))
                .output(MUSIC_LABEL),
        )
        .chain(
            FilterChain::new()
                .input(NARRATION_LABEL)
                .input(MUSIC_LABEL)
                .filter("amix=inputs=2:duration=first:dropout_transition=0:normalize=0")
                .output(MIXED_LABEL),
        )
}

/// Mix `music` tracks, played back to back and looped, under `video`.
pub fn build_audio_mix(
    video: &Path,
    music: &[PathBuf],
    volume: f64,
    encoding: &EncodingConfig,
    output: &Path,
) -> MediaResult<AudioMixPlan> {
    if music.is_empty() {
        return Err(MediaError::invalid_plan("music_list is empty"));
    }
    if !volume.is_finite() || volume < 0.0 {
        return Err(MediaError::invalid_plan(format!(
            "music volume must be a non-negative number, got {}",
            volume
        )));
    }

    let (dir, names) = common_directory(music)?;
    let music_list_path = dir.join(MUSIC_LIST_NAME);
    let music_list = ConcatList::from_files(&names);

    let graph = ducking_graph(volume);
    graph.validate()?;

    let plan = EncodePlan::new(output)
        .input(MediaInput::new(video))
        .input(MediaInput::concat_list(&music_list_path).loop_forever())
        .filter_complex(graph)
        .map("0:v")
        .map(MIXED_LABEL)
        .video_codec("copy")
        .audio_codec(&encoding.audio_codec)
        .audio_bitrate(&encoding.audio_bitrate);

    Ok(AudioMixPlan {
        plan,
        music_list_path,
        music_list,
        volume,
    })
}
