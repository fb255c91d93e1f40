//! Conversion configuration.
//!
//! [`ConvertOptions`] carries the settings every conversion needs (target
//! frame rate, GIF encoding, whether to run the size optimizer).
//! [`BackgroundOptions`] configures the optional background-removal stage.
//!
//! # Example
//!
//! ```
//! use gifmaker::{BackgroundOptions, ConvertOptions, FrameRate, SegmentationFallback};
//!
//! let options = ConvertOptions::new()
//!     .with_frame_rate(FrameRate::from_fps(10).unwrap())
//!     .with_optimize(true);
//!
//! let background = BackgroundOptions::new()
//!     .with_resolution(480, 270)
//!     .with_fallback(SegmentationFallback::AbortVideo);
//! ```

use image::Rgb;

use crate::frame_rate::FrameRate;
use crate::gif::GifOptions;

/// Settings shared by every video in a batch.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Rate the GIF is played back at. Source frames are sampled down to it.
    pub frame_rate: FrameRate,
    /// GIF encoder settings.
    pub gif: GifOptions,
    /// Run the size optimizer after each GIF is written.
    pub optimize: bool,
}

impl ConvertOptions {
    /// Defaults: 15 fps, infinite loop, no optimization pass.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    #[must_use]
    pub fn with_gif_options(mut self, gif: GifOptions) -> Self {
        self.gif = gif;
        self
    }

    #[must_use]
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}

/// What to do when segmenting a single frame fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentationFallback {
    /// Fail the whole video. The error reaches the per-video boundary and
    /// no GIF is written for it.
    AbortVideo,
    /// Log a warning and repeat the last successfully processed frame (or
    /// the resized, unsegmented frame if there is none yet). The GIF keeps
    /// its full frame count.
    #[default]
    RepeatLastFrame,
}

/// Settings for the background-removal stage.
#[derive(Debug, Clone)]
pub struct BackgroundOptions {
    /// Width every frame is resized to before segmentation.
    pub width: u32,
    /// Height every frame is resized to before segmentation.
    pub height: u32,
    /// Colour that replaces background pixels.
    pub fill: Rgb<u8>,
    /// Policy for frames whose segmentation fails.
    pub fallback: SegmentationFallback,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            fill: Rgb([255, 255, 255]),
            fallback: SegmentationFallback::default(),
        }
    }
}

impl BackgroundOptions {
    /// Defaults: 640×360, white fill, repeat the last frame on failure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output resolution. Zero dimensions are clamped to 1.
    #[must_use]
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    #[must_use]
    pub fn with_fill(mut self, fill: Rgb<u8>) -> Self {
        self.fill = fill;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: SegmentationFallback) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Parse `rrggbb` or `#rrggbb` into a colour.
pub fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("ffffff"), Some(Rgb([255, 255, 255])));
        assert_eq!(parse_hex_color("#00ff7f"), Some(Rgb([0, 255, 127])));
        assert_eq!(parse_hex_color("fff"), None);
        assert_eq!(parse_hex_color("gg0000"), None);
    }

    #[test]
    fn resolution_is_clamped() {
        let options = BackgroundOptions::new().with_resolution(0, 0);
        assert_eq!((options.width, options.height), (1, 1));
    }

    #[test]
    fn defaults() {
        let options = ConvertOptions::new();
        assert_eq!(options.frame_rate, FrameRate::from_fps(15).unwrap());
        assert!(!options.optimize);

        let background = BackgroundOptions::new();
        assert_eq!((background.width, background.height), (640, 360));
        assert_eq!(background.fallback, SegmentationFallback::RepeatLastFrame);
    }
}
