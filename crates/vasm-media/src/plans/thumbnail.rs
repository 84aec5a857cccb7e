//! Text-overlay thumbnail.

use std::path::Path;

use crate::command::{EncodePlan, MediaInput};
use crate::error::{MediaError, MediaResult};
use crate::filters::{escape_filter_value, FilterChain};
use crate::text::wrap_text;

/// Layout and colours for caption thumbnails.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailStyle {
    /// Characters per line
    pub wrap_width: usize,
    /// Font size for short captions
    pub font_size: u32,
    /// Font size once the caption exceeds `long_text_threshold` characters
    pub long_text_font_size: u32,
    pub long_text_threshold: usize,
    /// Line height as a multiple of the font size
    pub line_spacing: f64,
    pub color: String,
    pub emphasis_color: String,
    /// Index of the line drawn in `emphasis_color`
    pub emphasis_line: usize,
    pub shadow_color: String,
    pub shadow_offset: u32,
    /// Vertical centre of the text block, as a drawtext expression
    pub anchor_y: String,
    /// JPEG quality scale (2 is near lossless)
    pub jpeg_quality: u8,
}

impl Default for ThumbnailStyle {
    fn default() -> Self {
        Self {
            wrap_width: 22,
            font_size: 96,
            long_text_font_size: 72,
            long_text_threshold: 60,
            line_spacing: 1.2,
            color: "white".to_string(),
            emphasis_color: "yellow".to_string(),
            emphasis_line: 1,
            shadow_color: "black".to_string(),
            shadow_offset: 4,
            anchor_y: "h/2".to_string(),
            jpeg_quality: 2,
        }
    }
}

impl ThumbnailStyle {
    /// Font size tier for a caption.
    pub fn font_size_for(&self, text: &str) -> u32 {
        if text.chars().count() > self.long_text_threshold {
            self.long_text_font_size
        } else {
            self.font_size
        }
    }

    pub fn color_for_line(&self, index: usize) -> &str {
        if index == self.emphasis_line {
            &self.emphasis_color
        } else {
            &self.color
        }
    }

    fn line_height(&self, font_size: u32) -> u32 {
        (font_size as f64 * self.line_spacing).round() as u32
    }
}

/// One rendered caption line.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailLine {
    pub text: String,
    pub color: String,
    /// Top edge, as a drawtext expression
    pub y: String,
}

/// A built thumbnail plan.
#[derive(Debug, Clone)]
pub struct ThumbnailPlan {
    pub plan: EncodePlan,
    pub lines: Vec<ThumbnailLine>,
    pub font_size: u32,
}

/// Lay out `text` as centred lines around the style's anchor.
pub fn layout_lines(text: &str, style: &ThumbnailStyle) -> (u32, Vec<ThumbnailLine>) {
    let font_size = style.font_size_for(text);
    let line_height = style.line_height(font_size);
    let wrapped = wrap_text(text, style.wrap_width);
    let half_block = line_height * wrapped.len() as u32 / 2;

    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(index, line)| ThumbnailLine {
            color: style.color_for_line(index).to_string(),
            y: format!(
                "{}-{}+{}",
                style.anchor_y,
                half_block,
                index as u32 * line_height
            ),
            text: line,
        })
        .collect();

    (font_size, lines)
}

/// Draw `text` over `image` with `font` and write one JPEG frame.
pub fn build_thumbnail(
    image: &Path,
    text: &str,
    font: &Path,
    style: &ThumbnailStyle,
    output: &Path,
) -> MediaResult<ThumbnailPlan> {
    let (font_size, lines) = layout_lines(text, style);
    if lines.is_empty() {
        return Err(MediaError::invalid_plan("thumbnail text is empty"));
    }

    let font = escape_filter_value(&font.to_string_lossy());
    let chain = lines.iter().fold(FilterChain::new(), |chain, line| {
        chain.filter(format!(
            "drawtext=fontfile='{font}':text='{text}':expansion=none:\
             fontsize={size}:fontcolor={color}:\
             shadowcolor={shadow}:shadowx={offset}:shadowy={offset}:\
             x=(w-text_w)/2:y={y}",
            font = font,
            text = escape_filter_value(&line.text),
            size = font_size,
            color = line.color,
            shadow = style.shadow_color,
            offset = style.shadow_offset,
            y = line.y,
        ))
    });

    let plan = EncodePlan::new(output)
        .input(MediaInput::new(image))
        .video_filter(chain)
        .single_frame()
        .output_args(["-q:v".to_string(), style.jpeg_quality.to_string()]);

    Ok(ThumbnailPlan {
        plan,
        lines,
        font_size,
    })
}
