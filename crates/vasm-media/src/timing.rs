//! Slideshow timing.
//!
//! Splits a narration duration evenly across an ordered list of visual
//! items. A single item is held for the whole duration instead of being
//! listed as a segment.

use crate::error::{MediaError, MediaResult};

/// One visual item and how long it stays on screen, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<T> {
    pub item: T,
    pub duration: f64,
}

/// Display schedule for a slideshow.
#[derive(Debug, Clone, PartialEq)]
pub enum Schedule<T> {
    /// One item held for the full duration
    Static { item: T, duration: f64 },
    /// Items shown one after another, all for the same time
    Segments {
        segments: Vec<Segment<T>>,
        per_segment: f64,
    },
}

impl<T> Schedule<T> {
    pub fn is_static(&self) -> bool {
        matches!(self, Schedule::Static { .. })
    }

    /// Number of visual items in the schedule.
    pub fn len(&self) -> usize {
        match self {
            Schedule::Static { .. } => 1,
            Schedule::Segments { segments, .. } => segments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total scheduled display time.
    pub fn total_duration(&self) -> f64 {
        match self {
            Schedule::Static { duration, .. } => *duration,
            Schedule::Segments { segments, .. } => segments.iter().map(|s| s.duration).sum(),
        }
    }
}

fn check_duration(total: f64) -> MediaResult<()> {
    if !total.is_finite() || total <= 0.0 {
        return Err(MediaError::invalid_plan(format!(
            "duration must be a positive number of seconds, got {}",
            total
        )));
    }
    Ok(())
}

/// Plan how long each item is shown so the items together cover `total` seconds.
pub fn plan_schedule<T: Clone>(items: &[T], total: f64) -> MediaResult<Schedule<T>> {
    check_duration(total)?;

    match items {
        [] => Err(MediaError::invalid_plan("no visual segments to schedule")),
        [only] => Ok(Schedule::Static {
            item: only.clone(),
            duration: total,
        }),
        _ => {
            let per_segment = total / items.len() as f64;
            let segments = items
                .iter()
                .map(|item| Segment {
                    item: item.clone(),
                    duration: per_segment,
                })
                .collect();
            Ok(Schedule::Segments {
                segments,
                per_segment,
            })
        }
    }
}

/// Frame rate at which `count` numbered images span `total` seconds.
pub fn fixed_rate(count: usize, total: f64) -> MediaResult<f64> {
    check_duration(total)?;
    if count == 0 {
        return Err(MediaError::invalid_plan("no visual segments to schedule"));
    }
    Ok(count as f64 / total)
}
