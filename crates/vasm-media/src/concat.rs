//! Concat demuxer list files.
//!
//! Format: `file '<name>'` / `duration <seconds>` pairs. Timed lists end with
//! a bare `file` line repeating the last entry, otherwise the demuxer drops
//! the final frame.

use vasm_models::encoding::SEGMENT_DURATION_PRECISION;

use crate::timing::Segment;

#[derive(Debug, Clone, PartialEq)]
struct ConcatEntry {
    name: String,
    duration: Option<f64>,
}

/// Ordered list consumed through `-f concat -safe 0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcatList {
    entries: Vec<ConcatEntry>,
}

impl ConcatList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timed list for a segment schedule, with the trailing repeat.
    ///
    /// The last timed entry absorbs the rounding of the earlier ones, so the
    /// rendered durations add up to the schedule total.
    pub fn from_segments<T: AsRef<str>>(segments: &[Segment<T>]) -> Self {
        let total: f64 = segments.iter().map(|s| s.duration).sum();
        let mut rendered = 0.0;
        let mut list = Self::new();
        for (position, segment) in segments.iter().enumerate() {
            let duration = if position + 1 == segments.len() {
                (total - rendered).max(0.0)
            } else {
                round_duration(segment.duration)
            };
            rendered += duration;
            list = list.timed(segment.item.as_ref(), duration);
        }
        if let Some(last) = segments.last() {
            list = list.file(last.item.as_ref());
        }
        list
    }

    /// Untimed list that plays files back to back.
    pub fn from_files<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .fold(Self::new(), |list, name| list.file(name.as_ref()))
    }

    /// Entry shown for `duration` seconds.
    pub fn timed(mut self, name: &str, duration: f64) -> Self {
        self.entries.push(ConcatEntry {
            name: name.to_string(),
            duration: Some(duration),
        });
        self
    }

    /// Entry without a duration.
    pub fn file(mut self, name: &str) -> Self {
        self.entries.push(ConcatEntry {
            name: name.to_string(),
            duration: None,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the listed durations, as rounded in the rendered file.
    pub fn rendered_duration(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|e| e.duration)
            .map(|d| format!("{:.*}", SEGMENT_DURATION_PRECISION, d))
            .filter_map(|d| d.parse::<f64>().ok())
            .sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str("file '");
            out.push_str(&quote_name(&entry.name));
            out.push_str("'\n");
            if let Some(duration) = entry.duration {
                out.push_str(&format!(
                    "duration {:.*}\n",
                    SEGMENT_DURATION_PRECISION, duration
                ));
            }
        }
        out
    }
}

/// A duration as written to the list file.
fn round_duration(seconds: f64) -> f64 {
    let scale = 10f64.powi(SEGMENT_DURATION_PRECISION as i32);
    (seconds * scale).round() / scale
}

/// Inside single quotes a quote is written as `'\''`.
fn quote_name(name: &str) -> String {
    name.replace('\'', "'\\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::{plan_schedule, Schedule};

    #[test]
    fn test_three_images_nine_seconds() {
        let names = ["img_000.jpg", "img_001.jpg", "img_002.jpg"];
        let segments = match plan_schedule(&names, 9.0).unwrap() {
            Schedule::Segments { segments, .. } => segments,
            Schedule::Static { .. } => panic!("expected segments"),
        };

        let list = ConcatList::from_segments(&segments);
        assert_eq!(
            list.render(),
            "file 'img_000.jpg'\nduration 3.0000\n\
             file 'img_001.jpg'\nduration 3.0000\n\
             file 'img_002.jpg'\nduration 3.0000\n\
             file 'img_002.jpg'\n"
        );
        assert_eq!(list.len(), 4);
        assert!((list.rendered_duration() - 9.0).abs() < 1e-3);
    }

    #[test]
    fn test_rounding_stays_within_tolerance() {
        let names: Vec<String> = (0..7).map(|i| format!("img_{:03}.png", i)).collect();
        let segments = match plan_schedule(&names, 10.0).unwrap() {
            Schedule::Segments { segments, .. } => segments,
            Schedule::Static { .. } => panic!("expected segments"),
        };
        let list = ConcatList::from_segments(&segments);
        assert!(list.render().contains("duration 1.4286\n"));
        assert!((list.rendered_duration() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_rounding_does_not_accumulate() {
        let names: Vec<String> = (0..300).map(|i| format!("img_{:03}.jpg", i)).collect();
        let segments = match plan_schedule(&names, 177.532).unwrap() {
            Schedule::Segments { segments, .. } => segments,
            Schedule::Static { .. } => panic!("expected segments"),
        };

        let list = ConcatList::from_segments(&segments);
        let rendered = list.render();
        assert_eq!(rendered.matches("duration 0.5918\n").count(), 299);
        assert!(rendered.contains("duration 0.5838\n"));
        assert!((list.rendered_duration() - 177.532).abs() < 1e-6);
    }

    #[test]
    fn test_untimed_list_and_quoting() {
        let list = ConcatList::from_files(["music_000.mp3", "it's.mp3"]);
        assert_eq!(
            list.render(),
            "file 'music_000.mp3'\nfile 'it'\\''s.mp3'\n"
        );
        assert_eq!(list.rendered_duration(), 0.0);
    }
}
