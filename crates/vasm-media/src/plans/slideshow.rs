//! Narrated slideshow: still images timed against an audio track.

use std::path::{Path, PathBuf};

use vasm_models::encoding::PLAYER_PIXEL_FORMAT;
use vasm_models::EncodingConfig;

use super::{common_directory, write_concat_list};
use crate::command::{EncodePlan, MediaInput};
use crate::concat::ConcatList;
use crate::error::{MediaError, MediaResult};
use crate::filters::{filter_even_dimensions, FilterChain};
use crate::timing::{fixed_rate, plan_schedule, Schedule};

/// File name of the segment list written next to the images.
pub const SEGMENT_LIST_NAME: &str = "segments.txt";

/// How image timing reaches the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideshowTiming {
    /// Concat list with an explicit duration per image
    #[default]
    SegmentList,
    /// Numbered image sequence read at `count / duration` frames per second
    FixedRate,
}

impl SlideshowTiming {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideshowTiming::SegmentList => "segment_list",
            SlideshowTiming::FixedRate => "fixed_rate",
        }
    }

    /// Parse a configuration value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "segment_list" | "segments" | "concat" => Some(SlideshowTiming::SegmentList),
            "fixed_rate" | "framerate" | "pattern" => Some(SlideshowTiming::FixedRate),
            _ => None,
        }
    }
}

/// Local name of the image at `index` in a slideshow.
pub fn sequence_image_name(index: usize, extension: &str) -> String {
    format!("img_{:03}.{}", index, extension)
}

/// A built slideshow plan.
#[derive(Debug, Clone)]
pub struct SlideshowPlan {
    pub plan: EncodePlan,
    pub schedule: Schedule<String>,
    pub timing: SlideshowTiming,
    /// Segment list content and where it must be written
    pub concat_list: Option<(PathBuf, ConcatList)>,
    /// Input frame rate in fixed-rate mode
    pub framerate: Option<f64>,
}

impl SlideshowPlan {
    pub fn segment_count(&self) -> usize {
        self.schedule.len()
    }

    /// Write the segment list, if the plan reads one.
    pub async fn write_support_files(&self) -> MediaResult<()> {
        if let Some((path, list)) = &self.concat_list {
            write_concat_list(path, list).await?;
        }
        Ok(())
    }
}

/// Build the plan for `images` shown over `audio` lasting `audio_duration`.
///
/// Images must share one directory. One image is looped for the whole
/// duration regardless of `timing`.
pub fn build_slideshow(
    images: &[PathBuf],
    audio: &Path,
    audio_duration: f64,
    timing: SlideshowTiming,
    encoding: &EncodingConfig,
    output: &Path,
) -> MediaResult<SlideshowPlan> {
    if images.is_empty() {
        return Err(MediaError::invalid_plan("images_list is empty"));
    }

    let (dir, names) = common_directory(images)?;
    let schedule = plan_schedule(&names, audio_duration)?;

    match &schedule {
        Schedule::Static { item, duration } => {
            let plan = static_plan(&dir.join(item), audio, *duration, encoding, output);
            Ok(SlideshowPlan {
                plan,
                schedule,
                timing,
                concat_list: None,
                framerate: None,
            })
        }
        Schedule::Segments { segments, .. } => match timing {
            SlideshowTiming::SegmentList => {
                let list_path = dir.join(SEGMENT_LIST_NAME);
                let list = ConcatList::from_segments(segments);
                let plan = encoded_video(
                    EncodePlan::new(output)
                        .input(MediaInput::concat_list(&list_path))
                        .input(MediaInput::new(audio)),
                    encoding,
                )
                .shortest()
                .max_duration(audio_duration);

                Ok(SlideshowPlan {
                    plan,
                    schedule,
                    timing,
                    concat_list: Some((list_path, list)),
                    framerate: None,
                })
            }
            SlideshowTiming::FixedRate => {
                let extension = sequence_extension(&names)?;
                let rate = fixed_rate(names.len(), audio_duration)?;
                let pattern = dir.join(format!("img_%03d.{}", extension));
                let plan = encoded_video(
                    EncodePlan::new(output)
                        .input(MediaInput::image_sequence(
                            &pattern,
                            names.len(),
                            audio_duration,
                        ))
                        .input(MediaInput::new(audio)),
                    encoding,
                )
                .shortest()
                .max_duration(audio_duration);

                Ok(SlideshowPlan {
                    plan,
                    schedule,
                    timing,
                    concat_list: None,
                    framerate: Some(rate),
                })
            }
        },
    }
}

/// Image + audio re-encoded for broad player support.
fn encoded_video(plan: EncodePlan, encoding: &EncodingConfig) -> EncodePlan {
    plan.video_filter(FilterChain::new().filter(filter_even_dimensions()))
        .map("0:v")
        .map("1:a")
        .video_codec(&encoding.codec)
        .preset(&encoding.preset)
        .crf(encoding.crf)
        .frame_rate(encoding.fps)
        .pixel_format(PLAYER_PIXEL_FORMAT)
        .audio_codec(&encoding.audio_codec)
        .audio_bitrate(&encoding.audio_bitrate)
}

fn static_plan(
    image: &Path,
    audio: &Path,
    duration: f64,
    encoding: &EncodingConfig,
    output: &Path,
) -> EncodePlan {
    EncodePlan::new(output)
        .input(MediaInput::looped_image(image))
        .input(MediaInput::new(audio))
        .video_filter(FilterChain::new().filter(filter_even_dimensions()))
        .map("0:v")
        .map("1:a")
        .video_codec(&encoding.codec)
        .tune("stillimage")
        .frame_rate(encoding.fps)
        .pixel_format(PLAYER_PIXEL_FORMAT)
        .audio_codec(&encoding.audio_codec)
        .audio_bitrate(&encoding.audio_bitrate)
        .shortest()
        .max_duration(duration)
}

/// The sequence reader needs `img_000.ext`, `img_001.ext`, ... with one extension.
fn sequence_extension(names: &[String]) -> MediaResult<String> {
    let extension = names
        .first()
        .and_then(|n| Path::new(n).extension())
        .map(|e| e.to_string_lossy().to_string())
        .ok_or_else(|| MediaError::invalid_plan("image names have no extension"))?;

    for (index, name) in names.iter().enumerate() {
        let expected = sequence_image_name(index, &extension);
        if *name != expected {
            return Err(MediaError::invalid_plan(format!(
                "image {} is named {}, expected {}",
                index, name, expected
            )));
        }
    }

    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| PathBuf::from("/work/job").join(sequence_image_name(i, "jpg")))
            .collect()
    }

    fn build(count: usize, duration: f64, timing: SlideshowTiming) -> MediaResult<SlideshowPlan> {
        build_slideshow(
            &images(count),
            Path::new("/work/job/audio.mp3"),
            duration,
            timing,
            &EncodingConfig::default(),
            Path::new("/work/job/out.mp4"),
        )
    }

    #[test]
    fn test_segment_list_plan() {
        let built = build(3, 9.0, SlideshowTiming::SegmentList).unwrap();
        assert_eq!(built.segment_count(), 3);
        assert!(!built.schedule.is_static());

        let (list_path, list) = built.concat_list.as_ref().unwrap();
        assert_eq!(list_path, &PathBuf::from("/work/job/segments.txt"));
        let rendered = list.render();
        assert_eq!(rendered.lines().filter(|l| l.starts_with("file")).count(), 4);
        assert_eq!(rendered.matches("duration 3.0000").count(), 3);
        assert!(rendered.ends_with("file 'img_002.jpg'\n"));

        let args = built.plan.build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-f concat -safe 0 -i /work/job/segments.txt"));
        assert!(joined.contains("-i /work/job/audio.mp3"));
        assert!(joined.contains("-r 30"));
        assert!(joined.contains("-pix_fmt yuv420p"));
        assert!(joined.contains("-shortest"));
        assert!(joined.contains("-t 9.000"));
        assert!(joined.contains("-map 0:v -map 1:a"));
        assert_eq!(args.last().unwrap(), "/work/job/out.mp4");
    }

    #[test]
    fn test_single_image_is_looped() {
        let built = build(1, 42.0, SlideshowTiming::SegmentList).unwrap();
        assert!(built.schedule.is_static());
        assert!(built.concat_list.is_none());

        let joined = built.plan.build_args().join(" ");
        assert!(joined.contains("-loop 1 -i /work/job/img_000.jpg"));
        assert!(joined.contains("-tune stillimage"));
        assert!(joined.contains("-b:a 192k"));
        assert!(joined.contains("-shortest"));
        assert!(!joined.contains("concat"));
    }

    #[test]
    fn test_fixed_rate_plan() {
        let built = build(3, 9.0, SlideshowTiming::FixedRate).unwrap();
        assert!(built.concat_list.is_none());
        assert!((built.framerate.unwrap() - 1.0 / 3.0).abs() < 1e-9);

        let joined = built.plan.build_args().join(" ");
        assert!(joined.contains("-framerate 3/9 -i /work/job/img_%03d.jpg"));
        assert!(joined.contains("-r 30"));
    }

    fn rendered_framerate(plan: &EncodePlan) -> f64 {
        let args = plan.build_args();
        let position = args.iter().position(|a| a == "-framerate").unwrap();
        let (frames, seconds) = args[position + 1].split_once('/').unwrap();
        frames.parse::<f64>().unwrap() / seconds.parse::<f64>().unwrap()
    }

    #[test]
    fn test_fixed_rate_spans_long_narration() {
        for (count, duration) in [(2, 7200.0), (3, 5400.0), (2, 1799.0), (7, 177.532)] {
            let built = build(count, duration, SlideshowTiming::FixedRate).unwrap();
            let timeline = count as f64 / rendered_framerate(&built.plan);
            assert!(
                (timeline - duration).abs() < 1e-3,
                "{} images over {}s render {}s",
                count,
                duration,
                timeline
            );
        }
    }

    #[test]
    fn test_fixed_rate_requires_sequence_names() {
        let files = vec![
            PathBuf::from("/work/job/cover.jpg"),
            PathBuf::from("/work/job/img_001.jpg"),
        ];
        let result = build_slideshow(
            &files,
            Path::new("/work/job/audio.mp3"),
            5.0,
            SlideshowTiming::FixedRate,
            &EncodingConfig::default(),
            Path::new("/work/job/out.mp4"),
        );
        assert!(matches!(result, Err(MediaError::InvalidPlan(_))));
    }

    #[test]
    fn test_empty_images_rejected() {
        assert!(matches!(
            build(0, 9.0, SlideshowTiming::SegmentList),
            Err(MediaError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_timing_names() {
        assert_eq!(
            SlideshowTiming::from_name("FIXED_RATE"),
            Some(SlideshowTiming::FixedRate)
        );
        assert_eq!(
            SlideshowTiming::from_name(SlideshowTiming::SegmentList.as_str()),
            Some(SlideshowTiming::SegmentList)
        );
        assert_eq!(SlideshowTiming::from_name("other"), None);
    }

    #[tokio::test]
    async fn test_support_files_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..2)
            .map(|i| dir.path().join(sequence_image_name(i, "png")))
            .collect();
        let built = build_slideshow(
            &files,
            &dir.path().join("audio.mp3"),
            4.0,
            SlideshowTiming::SegmentList,
            &EncodingConfig::default(),
            &dir.path().join("out.mp4"),
        )
        .unwrap();

        built.write_support_files().await.unwrap();
        let written = std::fs::read_to_string(dir.path().join(SEGMENT_LIST_NAME)).unwrap();
        assert!(written.starts_with("file 'img_000.png'\nduration 2.0000\n"));
    }
}
