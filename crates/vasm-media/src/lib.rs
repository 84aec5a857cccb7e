#![deny(unreachable_patterns)]
//! FFmpeg plan building and invocation for media assembly.
//!
//! This crate provides:
//! - Duration probing through `ffprobe`
//! - Timing schedules that keep images in sync with narration
//! - Filter-graph fragments with central ordering and escaping rules
//! - Encode plans for slideshow, subtitle burn-in, music mix and thumbnails
//! - Encoder invocation with diagnostics capture, cancellation and timeout

pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod plans;
pub mod probe;
pub mod progress;
pub mod text;
pub mod timing;

pub use command::{EncodeOutcome, EncodePlan, FfmpegRunner, MediaInput};
pub use concat::ConcatList;
pub use error::{MediaError, MediaResult};
pub use filters::{escape_filter_value, FilterChain, FilterGraph, FilterSpec};
pub use plans::{
    build_audio_mix, build_slideshow, build_subtitle_burn, build_thumbnail, sequence_image_name,
    AudioMixPlan, SlideshowPlan, SlideshowTiming, ThumbnailLine, ThumbnailPlan, ThumbnailStyle,
};
pub use probe::{parse_duration_output, Prober};
pub use progress::FfmpegProgress;
pub use text::wrap_text;
pub use timing::{fixed_rate, plan_schedule, Schedule, Segment};
