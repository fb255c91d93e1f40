//! Background removal.
//!
//! [`FrameProcessor`] normalises every sampled frame to a fixed resolution
//! and RGB8, then hands it to a [`Segmenter`] that replaces the background
//! with a flat colour. The segmenter is a loaded model in practice: it is
//! built once, injected here, and reused for every frame of every video.
//!
//! # Example
//!
//! ```
//! use gifmaker::{BackgroundOptions, FrameProcessor, GifMakerError, Segmenter};
//! use image::{DynamicImage, Rgb, RgbImage};
//!
//! /// Treats the left half of every frame as foreground.
//! struct LeftHalf;
//!
//! impl Segmenter for LeftHalf {
//!     fn segment(&mut self, frame: &RgbImage, fill: Rgb<u8>) -> Result<RgbImage, GifMakerError> {
//!         let mut out = frame.clone();
//!         for (x, _, pixel) in out.enumerate_pixels_mut() {
//!             if x >= frame.width() / 2 {
//!                 *pixel = fill;
//!             }
//!         }
//!         Ok(out)
//!     }
//! }
//!
//! let mut processor = FrameProcessor::new(Box::new(LeftHalf), BackgroundOptions::new());
//! let frame = DynamicImage::ImageRgb8(RgbImage::new(1280, 720));
//! let processed = processor.process(frame)?;
//! assert_eq!((processed.width(), processed.height()), (640, 360));
//! # Ok::<(), GifMakerError>(())
//! ```

use image::{DynamicImage, GrayImage, Rgb, RgbImage, imageops::FilterType};

use crate::config::{BackgroundOptions, SegmentationFallback};
use crate::error::GifMakerError;

/// Foreground/background segmentation.
///
/// Implementations classify each pixel and return a copy of `frame` in which
/// background pixels are replaced by `fill`. They may keep internal state
/// between calls; the processor never calls them concurrently.
pub trait Segmenter {
    fn segment(&mut self, frame: &RgbImage, fill: Rgb<u8>) -> Result<RgbImage, GifMakerError>;
}

/// Resizes, normalises and segments frames for background removal.
pub struct FrameProcessor {
    segmenter: Box<dyn Segmenter>,
    options: BackgroundOptions,
    last_good: Option<RgbImage>,
    frame_index: u64,
    failures: u64,
}

impl FrameProcessor {
    pub fn new(segmenter: Box<dyn Segmenter>, options: BackgroundOptions) -> Self {
        Self {
            segmenter,
            options,
            last_good: None,
            frame_index: 0,
            failures: 0,
        }
    }

    pub fn options(&self) -> &BackgroundOptions {
        &self.options
    }

    /// Forget per-video state. Call before the first frame of each video so
    /// a fallback never repeats a frame from a different clip.
    pub fn begin_video(&mut self) {
        self.last_good = None;
        self.frame_index = 0;
        self.failures = 0;
    }

    /// Frames of the current video whose segmentation failed.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Resize `frame` to the configured resolution as RGB8.
    pub fn normalize(&self, frame: &DynamicImage) -> RgbImage {
        let (width, height) = (self.options.width, self.options.height);
        if frame.width() == width && frame.height() == height {
            frame.to_rgb8()
        } else {
            image::imageops::resize(&frame.to_rgb8(), width, height, FilterType::Triangle)
        }
    }

    /// Normalise and segment one frame.
    ///
    /// # Errors
    ///
    /// With [`SegmentationFallback::AbortVideo`], a segmentation failure is
    /// returned as is. With [`SegmentationFallback::RepeatLastFrame`], it is
    /// logged and the previous good frame is returned instead.
    pub fn process(&mut self, frame: DynamicImage) -> Result<DynamicImage, GifMakerError> {
        let index = self.frame_index;
        self.frame_index += 1;

        let normalized = self.normalize(&frame);
        drop(frame);

        match self.segmenter.segment(&normalized, self.options.fill) {
            Ok(segmented) => {
                self.last_good = Some(segmented.clone());
                Ok(DynamicImage::ImageRgb8(segmented))
            }
            Err(error) => {
                self.failures += 1;
                match self.options.fallback {
                    SegmentationFallback::AbortVideo => Err(error),
                    SegmentationFallback::RepeatLastFrame => {
                        log::warn!(
                            "Segmentation failed on frame {index}, reusing previous frame: {error}"
                        );
                        let substitute = self.last_good.clone().unwrap_or(normalized);
                        Ok(DynamicImage::ImageRgb8(substitute))
                    }
                }
            }
        }
    }
}

/// Replace the pixels of `frame` whose mask value is below `threshold` with
/// `fill`.
///
/// `mask` holds foreground confidence (0 = background, 255 = foreground) and
/// is resized to the frame if the sizes differ.
pub fn replace_background(
    frame: &RgbImage,
    mask: &GrayImage,
    threshold: u8,
    fill: Rgb<u8>,
) -> RgbImage {
    let resized;
    let mask = if mask.dimensions() == frame.dimensions() {
        mask
    } else {
        resized =
            image::imageops::resize(mask, frame.width(), frame.height(), FilterType::Triangle);
        &resized
    };

    let mut output = frame.clone();
    for (pixel, confidence) in output.pixels_mut().zip(mask.pixels()) {
        if confidence.0[0] < threshold {
            *pixel = fill;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn replace_background_thresholds_mask() {
        let frame = RgbImage::from_pixel(2, 1, Rgb([10, 20, 30]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([200]));
        mask.put_pixel(1, 0, Luma([50]));

        let output = replace_background(&frame, &mask, 128, Rgb([0, 255, 0]));
        assert_eq!(output.get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(output.get_pixel(1, 0), &Rgb([0, 255, 0]));
    }

    #[test]
    fn replace_background_resizes_mask() {
        let frame = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let mask = GrayImage::from_pixel(2, 2, Luma([0]));
        let output = replace_background(&frame, &mask, 1, Rgb([9, 9, 9]));
        assert!(output.pixels().all(|pixel| *pixel == Rgb([9, 9, 9])));
    }

    /// Fails every call listed in `failing`, passes frames through otherwise.
    struct Scripted {
        calls: usize,
        failing: Vec<usize>,
    }

    impl Segmenter for Scripted {
        fn segment(&mut self, frame: &RgbImage, _fill: Rgb<u8>) -> Result<RgbImage, GifMakerError> {
            let call = self.calls;
            self.calls += 1;
            if self.failing.contains(&call) {
                return Err(GifMakerError::SegmentationError(format!("call {call}")));
            }
            Ok(frame.clone())
        }
    }

    fn shade(value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([value, value, value])))
    }

    fn processor(failing: Vec<usize>, fallback: SegmentationFallback) -> FrameProcessor {
        FrameProcessor::new(
            Box::new(Scripted { calls: 0, failing }),
            BackgroundOptions::new()
                .with_resolution(4, 4)
                .with_fallback(fallback),
        )
    }

    #[test]
    fn normalizes_to_configured_resolution() {
        let processor = processor(Vec::new(), SegmentationFallback::default());
        let frame = DynamicImage::ImageRgba8(image::RgbaImage::new(16, 9));
        assert_eq!(processor.normalize(&frame).dimensions(), (4, 4));
    }

    #[test]
    fn repeat_fallback_reuses_last_good_frame() {
        let mut processor = processor(vec![1], SegmentationFallback::RepeatLastFrame);
        processor.process(shade(10)).unwrap();
        let repeated = processor.process(shade(200)).unwrap();

        assert_eq!(repeated.to_rgb8().get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(processor.failures(), 1);
    }

    #[test]
    fn repeat_fallback_on_first_frame_keeps_unsegmented_frame() {
        let mut processor = processor(vec![0], SegmentationFallback::RepeatLastFrame);
        let output = processor.process(shade(77)).unwrap();
        assert_eq!(output.to_rgb8().get_pixel(0, 0), &Rgb([77, 77, 77]));
    }

    #[test]
    fn abort_fallback_returns_the_error() {
        let mut processor = processor(vec![0], SegmentationFallback::AbortVideo);
        let error = processor.process(shade(1)).unwrap_err();
        assert!(matches!(error, GifMakerError::SegmentationError(_)));
    }

    #[test]
    fn begin_video_forgets_previous_clip() {
        let mut processor = processor(vec![1], SegmentationFallback::RepeatLastFrame);
        processor.process(shade(10)).unwrap();
        processor.begin_video();
        let output = processor.process(shade(90)).unwrap();

        assert_eq!(output.to_rgb8().get_pixel(0, 0), &Rgb([90, 90, 90]));
        assert_eq!(processor.failures(), 1);
    }
}
