//! Fixed-rate frame selection.
//!
//! [`FrameSampler`] walks a [`FrameSource`] in decode order and keeps only the
//! frames needed to play the video back at a lower target rate. Output frame
//! `k` is the source frame `floor(k * fps_in / fps_out)`. The total frame
//! count is never needed, so the sampler works on sources of unknown length.
//!
//! Frames that are not selected are decoded but never converted to images.
//!
//! # Example
//!
//! ```no_run
//! use gifmaker::{FrameRate, FrameSampler, GifMakerError, VideoFile};
//!
//! let video = VideoFile::open("clip.mp4")?;
//! for sampled in FrameSampler::new(video, FrameRate::from_fps(15)?) {
//!     let sampled = sampled?;
//!     println!("gif frame {} <- source frame {}", sampled.output_index, sampled.source_index);
//! }
//! # Ok::<(), GifMakerError>(())
//! ```

use image::DynamicImage;

use crate::error::GifMakerError;
use crate::frame_rate::FrameRate;

/// A sequential source of decoded frames.
///
/// Implemented by [`VideoFile`](crate::VideoFile) for real containers. The
/// split between [`advance`](FrameSource::advance) and
/// [`current_frame`](FrameSource::current_frame) lets callers skip the pixel
/// conversion for frames they do not keep.
pub trait FrameSource {
    /// The native frame rate of the source.
    fn frame_rate(&self) -> FrameRate;

    /// Decode the next frame. Returns `Ok(false)` once the source is
    /// exhausted.
    fn advance(&mut self) -> Result<bool, GifMakerError>;

    /// Convert the most recently decoded frame into an image.
    fn current_frame(&mut self) -> Result<DynamicImage, GifMakerError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn frame_rate(&self) -> FrameRate {
        (**self).frame_rate()
    }

    fn advance(&mut self) -> Result<bool, GifMakerError> {
        (**self).advance()
    }

    fn current_frame(&mut self) -> Result<DynamicImage, GifMakerError> {
        (**self).current_frame()
    }
}

/// A frame chosen by the [`FrameSampler`].
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Position of this frame in the output sequence.
    pub output_index: u64,
    /// Position of this frame in the source's decode order.
    pub source_index: u64,
    /// The decoded image.
    pub image: DynamicImage,
}

/// Pure frame-selection state, independent of any decoder.
///
/// Feed it one call to [`select`](FrameSelector::select) per source frame, in
/// order. It answers with the output index when that frame should be kept.
#[derive(Debug, Clone)]
pub struct FrameSelector {
    source_rate: FrameRate,
    target_rate: FrameRate,
    next_source_index: u64,
    next_output_index: u64,
    next_target: u64,
}

impl FrameSelector {
    pub fn new(source_rate: FrameRate, target_rate: FrameRate) -> Self {
        Self {
            source_rate,
            target_rate,
            next_source_index: 0,
            next_output_index: 0,
            next_target: 0,
        }
    }

    /// Consume the next source frame. Returns `Some(output_index)` when it
    /// belongs in the output.
    pub fn select(&mut self) -> Option<u64> {
        let source_index = self.next_source_index;
        self.next_source_index += 1;

        if source_index < self.next_target {
            return None;
        }

        let output_index = self.next_output_index;
        self.next_output_index += 1;
        self.next_target = self.first_target_after(source_index);
        Some(output_index)
    }

    /// Number of source frames seen so far.
    pub fn source_frames(&self) -> u64 {
        self.next_source_index
    }

    /// Number of frames selected so far.
    pub fn selected_frames(&self) -> u64 {
        self.next_output_index
    }

    /// Smallest source index `floor(k * fps_in / fps_out)` that is greater
    /// than `source_index`, over all output positions `k`.
    ///
    /// With `r = fps_in / fps_out = a / b`, that is `floor(k * a / b)` for
    /// `k = ceil((source_index + 1) * b / a)`. When the target rate is above
    /// the source rate this skips the output positions that would repeat a
    /// frame, so nothing is ever duplicated.
    fn first_target_after(&self, source_index: u64) -> u64 {
        let a = self.source_rate.numerator() as u128 * self.target_rate.denominator() as u128;
        let b = self.source_rate.denominator() as u128 * self.target_rate.numerator() as u128;
        let k = ((source_index as u128 + 1) * b).div_ceil(a);
        (k * a / b) as u64
    }
}

/// Iterator adapter that yields the frames of a [`FrameSource`] selected for
/// a target frame rate.
///
/// Iteration stops after the source is exhausted or after the first error.
pub struct FrameSampler<S> {
    source: S,
    selector: FrameSelector,
    done: bool,
}

impl<S: FrameSource> FrameSampler<S> {
    /// Sample `source` down to `target_rate`.
    pub fn new(source: S, target_rate: FrameRate) -> Self {
        let selector = FrameSelector::new(source.frame_rate(), target_rate);
        log::debug!(
            "Sampling {} source down to {}",
            source.frame_rate(),
            target_rate,
        );
        Self {
            source,
            selector,
            done: false,
        }
    }

    /// Number of source frames decoded so far.
    pub fn source_frames(&self) -> u64 {
        self.selector.source_frames()
    }

    /// Give back the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: FrameSource> Iterator for FrameSampler<S> {
    type Item = Result<SampledFrame, GifMakerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.source.advance() {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
            }

            let source_index = self.selector.source_frames();
            let Some(output_index) = self.selector.select() else {
                continue;
            };

            return match self.source.current_frame() {
                Ok(image) => Some(Ok(SampledFrame {
                    output_index,
                    source_index,
                    image,
                })),
                Err(error) => {
                    self.done = true;
                    Some(Err(error))
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(source: FrameRate, target: FrameRate, frames: u64) -> Vec<u64> {
        let mut selector = FrameSelector::new(source, target);
        (0..frames).filter(|_| selector.select().is_some()).collect()
    }

    fn fps(value: u32) -> FrameRate {
        FrameRate::from_fps(value).unwrap()
    }

    #[test]
    fn thirty_to_five_keeps_every_sixth_frame() {
        let picked = selected(fps(30), fps(5), 300);
        assert_eq!(picked.len(), 50);
        for (k, index) in picked.iter().enumerate() {
            assert_eq!(*index, 6 * k as u64);
        }
    }

    #[test]
    fn thirty_to_fifteen_keeps_every_other_frame() {
        let picked = selected(fps(30), fps(15), 300);
        assert_eq!(picked.len(), 150);
        assert_eq!(&picked[..4], &[0, 2, 4, 6]);
    }

    #[test]
    fn non_integer_ratio_follows_floor_mapping() {
        // 30 -> 7 fps: frame k maps to floor(k * 30 / 7).
        let picked = selected(fps(30), fps(7), 60);
        let expected: Vec<u64> = (0..)
            .map(|k: u64| k * 30 / 7)
            .take_while(|index| *index < 60)
            .collect();
        assert_eq!(picked, expected);
    }

    #[test]
    fn ntsc_source_is_sampled_without_drift() {
        let source = FrameRate::new(30000, 1001).unwrap();
        let picked = selected(source, fps(15), 30_000);
        // 30000 frames at 29.97 fps is 1001 seconds.
        assert_eq!(picked.len(), 15_015);
        assert!(picked.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn higher_target_rate_emits_every_frame_once() {
        let picked = selected(fps(10), fps(25), 40);
        assert_eq!(picked, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn equal_rates_emit_every_frame() {
        let picked = selected(fps(24), fps(24), 48);
        assert_eq!(picked.len(), 48);
    }

    #[test]
    fn output_indices_are_gap_free() {
        let mut selector = FrameSelector::new(fps(60), fps(15));
        let outputs: Vec<u64> = (0..120).filter_map(|_| selector.select()).collect();
        assert_eq!(outputs, (0..30).collect::<Vec<_>>());
        assert_eq!(selector.source_frames(), 120);
        assert_eq!(selector.selected_frames(), 30);
    }
}
