//! Sequential video decoding.
//!
//! [`VideoFile`] opens a container with FFmpeg, picks the best video stream
//! and decodes it front to back. It implements [`FrameSource`], so it plugs
//! straight into a [`FrameSampler`](crate::FrameSampler).
//!
//! # Example
//!
//! ```no_run
//! use gifmaker::{FrameSource, GifMakerError, VideoFile};
//!
//! let mut video = VideoFile::open("clip.mov")?;
//! println!("{}x{} at {}", video.width(), video.height(), video.frame_rate());
//!
//! let mut frames = 0;
//! while video.advance()? {
//!     frames += 1;
//! }
//! println!("{frames} frames");
//! # Ok::<(), GifMakerError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::DynamicImage;

use crate::{
    conversion::frame_to_rgb_image, error::GifMakerError, frame_rate::FrameRate,
    sampler::FrameSource,
};

/// Geometry a scaler was built for: source pixel format, width, height.
type ScalerKey = (Pixel, u32, u32);

/// An opened video file, decoded sequentially.
///
/// The container frame rate is read once at open time. Frames come out in
/// decode order, converted to RGB on request.
pub struct VideoFile {
    input_context: Input,
    decoder: VideoDecoder,
    video_stream_index: usize,
    frame_rate: FrameRate,
    path: PathBuf,
    scaler: Option<(ScalingContext, ScalerKey)>,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
    exhausted: bool,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("path", &self.path)
            .field("frame_rate", &self.frame_rate)
            .field("video_stream_index", &self.video_stream_index)
            .field("width", &self.decoder.width())
            .field("height", &self.decoder.height())
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file for decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, selects the best
    /// video stream and reads its frame rate. Nothing is decoded yet.
    ///
    /// # Errors
    ///
    /// - [`GifMakerError::FileOpen`] if the file cannot be opened or its
    ///   decoder cannot be created.
    /// - [`GifMakerError::NoVideoStream`] if the container has no video.
    /// - [`GifMakerError::InvalidFrameRate`] if the stream declares no rate.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GifMakerError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video file: {}", path.display());

        ffmpeg_next::init().map_err(|error| GifMakerError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| GifMakerError::FileOpen {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(GifMakerError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let frame_rate = FrameRate::from_rational(stream.avg_frame_rate())
            .or_else(|| FrameRate::from_rational(stream.rate()))
            .ok_or(GifMakerError::InvalidFrameRate)?;

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| GifMakerError::FileOpen {
                path: path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        log::debug!(
            "Video stream {video_stream_index}: {}x{} at {frame_rate}",
            decoder.width(),
            decoder.height(),
        );

        Ok(Self {
            input_context,
            decoder,
            video_stream_index,
            frame_rate,
            path,
            scaler: None,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            eof_sent: false,
            exhausted: false,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Coded width of the video stream.
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /// Coded height of the video stream.
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /// Build the RGB scaler for the current decoded frame, rebuilding it if
    /// the stream changed format or size mid-way.
    fn ensure_scaler(&mut self) -> Result<(), GifMakerError> {
        let key = (
            self.decoded_frame.format(),
            self.decoded_frame.width(),
            self.decoded_frame.height(),
        );

        let stale = self
            .scaler
            .as_ref()
            .is_none_or(|(_, current)| *current != key);
        if stale {
            let (format, width, height) = key;
            log::debug!("Building {width}x{height} {format:?} -> RGB24 scaler");
            let context = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some((context, key));
            self.rgb_frame = VideoFrame::empty();
        }
        Ok(())
    }
}

impl FrameSource for VideoFile {
    fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    fn advance(&mut self) -> Result<bool, GifMakerError> {
        if self.exhausted {
            return Ok(false);
        }

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return Ok(true);
            }

            // Decoder has no buffered frames. Feed it more packets.
            if self.eof_sent {
                self.exhausted = true;
                return Ok(false);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    return Err(GifMakerError::VideoDecodeError(format!(
                        "Failed to read packet from {}: {error}",
                        self.path.display()
                    )));
                }
            }
        }
    }

    fn current_frame(&mut self) -> Result<DynamicImage, GifMakerError> {
        if self.decoded_frame.width() == 0 || self.decoded_frame.height() == 0 {
            return Err(GifMakerError::VideoDecodeError(
                "No frame has been decoded yet".to_string(),
            ));
        }

        self.ensure_scaler()?;
        if let Some((scaler, _)) = self.scaler.as_mut() {
            scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        }

        Ok(DynamicImage::ImageRgb8(frame_to_rgb_image(&self.rgb_frame)?))
    }
}
