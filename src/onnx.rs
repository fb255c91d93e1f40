//! ONNX Runtime segmentation model.
//!
//! [`OnnxSegmenter`] runs a salient-object / portrait matting model (U²-Net
//! family, MODNet and similar) that takes one `1×3×H×W` float image and
//! produces a `1×1×H×W` foreground map as its first output. The map is
//! min-max normalised, scaled back to the frame and thresholded.
//!
//! # Example
//!
//! ```no_run
//! use gifmaker::{BackgroundOptions, FrameProcessor, OnnxSegmenter, SegmentationModelOptions};
//!
//! let model = OnnxSegmenter::load("models/u2netp.onnx", SegmentationModelOptions::new())?;
//! let processor = FrameProcessor::new(Box::new(model), BackgroundOptions::new());
//! # Ok::<(), gifmaker::GifMakerError>(())
//! ```

use std::path::Path;

use image::{GrayImage, Luma, Rgb, RgbImage, imageops::FilterType};
use ndarray::Array4;
use ort::{session::Session, value::TensorRef};

use crate::error::GifMakerError;
use crate::processor::{Segmenter, replace_background};

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Input geometry and mask threshold for an ONNX segmentation model.
#[derive(Debug, Clone)]
pub struct SegmentationModelOptions {
    /// Model input width.
    pub input_width: u32,
    /// Model input height.
    pub input_height: u32,
    /// Foreground confidence (0-255) below which a pixel is background.
    pub threshold: u8,
}

impl Default for SegmentationModelOptions {
    fn default() -> Self {
        Self {
            input_width: 320,
            input_height: 320,
            threshold: 128,
        }
    }
}

impl SegmentationModelOptions {
    /// Defaults: 320×320 input, threshold 128.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.input_width = width.max(1);
        self.input_height = height.max(1);
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }
}

/// A segmentation model loaded into an ONNX Runtime session.
pub struct OnnxSegmenter {
    session: Session,
    options: SegmentationModelOptions,
}

impl OnnxSegmenter {
    /// Load the model at `model_path`.
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        options: SegmentationModelOptions,
    ) -> Result<Self, GifMakerError> {
        let model_path = model_path.as_ref();
        log::info!("Loading segmentation model from {}", model_path.display());

        let session = Session::builder()
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(|e| GifMakerError::ModelLoadError(format!("{}: {e}", model_path.display())))?;

        log::debug!(
            "Segmentation model loaded (input {}x{})",
            options.input_width,
            options.input_height,
        );
        Ok(Self { session, options })
    }

    fn preprocess(&self, frame: &RgbImage) -> Array4<f32> {
        let (width, height) = (self.options.input_width, self.options.input_height);
        let resized = image::imageops::resize(frame, width, height, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                let value = pixel.0[channel] as f32 / 255.0;
                input[[0, channel, y as usize, x as usize]] =
                    (value - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel];
            }
        }
        input
    }

    fn predict_mask(&mut self, frame: &RgbImage) -> Result<GrayImage, GifMakerError> {
        let input = self.preprocess(frame);
        let tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| GifMakerError::SegmentationError(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| GifMakerError::SegmentationError(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| GifMakerError::SegmentationError(e.to_string()))?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        let (mask_height, mask_width) = match dims.as_slice() {
            [.., h, w] if *h > 0 && *w > 0 => (*h as u32, *w as u32),
            _ => {
                return Err(GifMakerError::SegmentationError(format!(
                    "Unexpected mask shape {dims:?}"
                )));
            }
        };
        let plane = (mask_width * mask_height) as usize;
        if data.len() < plane {
            return Err(GifMakerError::SegmentationError(format!(
                "Mask has {} values, expected at least {plane}",
                data.len()
            )));
        }

        let plane = &data[..plane];
        let (min, max) = plane
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        let range = if max > min { max - min } else { 1.0 };

        let mut mask = GrayImage::new(mask_width, mask_height);
        for (pixel, value) in mask.pixels_mut().zip(plane) {
            let normalized = ((value - min) / range).clamp(0.0, 1.0);
            *pixel = Luma([(normalized * 255.0).round() as u8]);
        }
        Ok(mask)
    }
}

impl Segmenter for OnnxSegmenter {
    fn segment(&mut self, frame: &RgbImage, fill: Rgb<u8>) -> Result<RgbImage, GifMakerError> {
        let mask = self.predict_mask(frame)?;
        Ok(replace_background(frame, &mask, self.options.threshold, fill))
    }
}
