//! Frame sampling integration tests.
//!
//! These run against a synthetic [`FrameSource`] so no video fixtures are
//! needed.

use image::{DynamicImage, Rgb, RgbImage};

use gifmaker::{FrameRate, FrameSampler, FrameSource, GifMakerError};

/// Frames whose red/green channels encode their source index.
struct CountingSource {
    rate: FrameRate,
    total: Option<u64>,
    position: u64,
    conversions: u64,
    fail_at: Option<u64>,
}

impl CountingSource {
    fn new(fps: u32, total: Option<u64>) -> Self {
        Self {
            rate: FrameRate::from_fps(fps).unwrap(),
            total,
            position: 0,
            conversions: 0,
            fail_at: None,
        }
    }
}

impl FrameSource for CountingSource {
    fn frame_rate(&self) -> FrameRate {
        self.rate
    }

    fn advance(&mut self) -> Result<bool, GifMakerError> {
        if Some(self.position) == self.fail_at {
            return Err(GifMakerError::VideoDecodeError("corrupt packet".to_string()));
        }
        if self.total.is_some_and(|total| self.position >= total) {
            return Ok(false);
        }
        self.position += 1;
        Ok(true)
    }

    fn current_frame(&mut self) -> Result<DynamicImage, GifMakerError> {
        self.conversions += 1;
        let index = self.position - 1;
        let pixel = Rgb([(index & 0xff) as u8, (index >> 8) as u8, 0]);
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, pixel)))
    }
}

fn decode_index(image: &DynamicImage) -> u64 {
    let pixel = image.to_rgb8().get_pixel(0, 0).0;
    pixel[0] as u64 | (pixel[1] as u64) << 8
}

#[test]
fn thirty_fps_to_five_selects_every_sixth_frame() {
    let sampler = FrameSampler::new(
        CountingSource::new(30, Some(300)),
        FrameRate::from_fps(5).unwrap(),
    );

    let frames: Vec<_> = sampler
        .collect::<Result<_, _>>()
        .expect("Sampling should succeed");

    assert_eq!(frames.len(), 50);
    for (k, frame) in frames.iter().enumerate() {
        assert_eq!(frame.output_index, k as u64);
        assert_eq!(frame.source_index, 6 * k as u64);
        assert_eq!(decode_index(&frame.image), 6 * k as u64);
    }
}

#[test]
fn ten_seconds_at_thirty_fps_gives_one_hundred_fifty_frames_at_fifteen() {
    let sampler = FrameSampler::new(
        CountingSource::new(30, Some(300)),
        FrameRate::from_fps(15).unwrap(),
    );
    assert_eq!(sampler.count(), 150);
}

#[test]
fn only_selected_frames_are_converted() {
    let mut source = CountingSource::new(30, Some(90));
    let selected = FrameSampler::new(&mut source, FrameRate::from_fps(10).unwrap()).count();

    assert_eq!(selected, 30);
    assert_eq!(source.conversions, 30);
    assert_eq!(source.position, 90);
}

#[test]
fn unbounded_source_can_be_sampled_lazily() {
    let sampler = FrameSampler::new(
        CountingSource::new(60, None),
        FrameRate::from_fps(12).unwrap(),
    );

    let indices: Vec<u64> = sampler
        .take(4)
        .map(|frame| frame.expect("Sampling should succeed").source_index)
        .collect();
    assert_eq!(indices, vec![0, 5, 10, 15]);
}

#[test]
fn target_above_source_rate_never_duplicates() {
    let sampler = FrameSampler::new(
        CountingSource::new(10, Some(20)),
        FrameRate::from_fps(30).unwrap(),
    );

    let indices: Vec<u64> = sampler
        .map(|frame| frame.expect("Sampling should succeed").source_index)
        .collect();
    assert_eq!(indices, (0..20).collect::<Vec<_>>());
}

#[test]
fn decode_error_stops_iteration() {
    let mut source = CountingSource::new(30, Some(300));
    source.fail_at = Some(7);
    let mut sampler = FrameSampler::new(source, FrameRate::from_fps(15).unwrap());

    let mut ok = 0;
    let mut errors = 0;
    for result in sampler.by_ref() {
        match result {
            Ok(_) => ok += 1,
            Err(_) => errors += 1,
        }
    }

    assert_eq!(errors, 1);
    assert_eq!(ok, 4);
    assert!(sampler.next().is_none(), "Sampler should stay finished");
}
