//! Animated GIF encoding.
//!
//! [`GifWriter`] streams frames into a temporary file next to the destination
//! and renames it into place only when [`finish`](GifWriter::finish)
//! succeeds. A failed or abandoned encode never leaves a GIF behind that
//! looks complete.
//!
//! # Example
//!
//! ```no_run
//! use gifmaker::{FrameRate, GifMakerError, GifOptions, GifWriter};
//! use image::{DynamicImage, RgbImage};
//!
//! let mut writer = GifWriter::create(
//!     "pulse.gif",
//!     FrameRate::from_fps(10)?,
//!     &GifOptions::new(),
//! )?;
//! for shade in [0u8, 64, 128, 192] {
//!     let frame = RgbImage::from_pixel(32, 32, image::Rgb([shade, shade, shade]));
//!     writer.write_frame(&DynamicImage::ImageRgb8(frame))?;
//! }
//! let artifact = writer.finish()?;
//! println!("{} frames, {} bytes", artifact.frame_count, artifact.bytes);
//! # Ok::<(), GifMakerError>(())
//! ```

use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use gif::{Encoder, Frame, Repeat};
use image::{DynamicImage, imageops::FilterType};
use tempfile::NamedTempFile;

use crate::error::GifMakerError;
use crate::frame_rate::FrameRate;
use crate::optimize::OptimizeOutcome;

/// Configuration for animated GIF output.
#[derive(Debug, Clone)]
pub struct GifOptions {
    /// Palette quantiser speed, 1 (best quality) to 30 (fastest).
    pub speed: i32,
    /// How many times the GIF should repeat. `None` means loop forever.
    pub repeat: Option<u16>,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            speed: 10,
            repeat: None,
        }
    }
}

impl GifOptions {
    /// Create a new [`GifOptions`] with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantiser speed, clamped to `1..=30`.
    pub fn speed(mut self, speed: i32) -> Self {
        self.speed = speed.clamp(1, 30);
        self
    }

    /// Set the repeat count. `None` means loop forever.
    pub fn repeat(mut self, repeat: Option<u16>) -> Self {
        self.repeat = repeat;
        self
    }

    fn gif_repeat(&self) -> Repeat {
        match self.repeat {
            None => Repeat::Infinite,
            Some(n) => Repeat::Finite(n),
        }
    }
}

/// A GIF written to disk.
#[derive(Debug, Clone)]
pub struct GifArtifact {
    /// Final location of the GIF.
    pub path: PathBuf,
    /// Number of frames encoded.
    pub frame_count: u64,
    /// File size in bytes, after optimization if it ran.
    pub bytes: u64,
    /// Repeat setting; `None` means loop forever.
    pub repeat: Option<u16>,
    /// Result of the optimization pass, if one ran and succeeded.
    pub optimization: Option<OptimizeOutcome>,
}

type GifEncoder = Encoder<BufWriter<NamedTempFile>>;

/// Streaming GIF encoder with atomic placement of the output file.
///
/// The canvas size is fixed by the first frame; later frames of a different
/// size are resized to it. Frame delays follow the configured frame rate,
/// rounded per frame against the running timestamp so the average rate is
/// exact.
pub struct GifWriter {
    path: PathBuf,
    frame_rate: FrameRate,
    options: GifOptions,
    pending: Option<NamedTempFile>,
    encoder: Option<GifEncoder>,
    canvas: (u16, u16),
    frame_count: u64,
}

impl GifWriter {
    /// Prepare to write a GIF at `path`.
    ///
    /// The temporary file is created immediately in the destination folder,
    /// so an unwritable folder fails here rather than after decoding.
    pub fn create<P: AsRef<Path>>(
        path: P,
        frame_rate: FrameRate,
        options: &GifOptions,
    ) -> Result<Self, GifMakerError> {
        let path = path.as_ref().to_path_buf();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(".gifmaker-").suffix(".gif.part");
        // Temp files default to 0600; give the GIF the mode File::create would.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }

        let pending = builder
            .tempfile_in(&directory)
            .map_err(|e| {
                GifMakerError::GifEncodeError(format!(
                    "Failed to create temporary file in {}: {e}",
                    directory.display()
                ))
            })?;

        log::debug!(
            "Writing GIF {} at {frame_rate} via {}",
            path.display(),
            pending.path().display(),
        );

        Ok(Self {
            path,
            frame_rate,
            options: options.clone(),
            pending: Some(pending),
            encoder: None,
            canvas: (0, 0),
            frame_count: 0,
        })
    }

    /// Destination path of the GIF.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames written so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn start_encoder(&mut self, width: u32, height: u32) -> Result<(), GifMakerError> {
        let too_large = || GifMakerError::FrameTooLarge { width, height };
        let canvas_width = u16::try_from(width).map_err(|_| too_large())?;
        let canvas_height = u16::try_from(height).map_err(|_| too_large())?;

        let file = self.pending.take().ok_or_else(|| {
            GifMakerError::GifEncodeError("GIF writer has no output file".to_string())
        })?;

        let mut encoder = Encoder::new(BufWriter::new(file), canvas_width, canvas_height, &[])
            .map_err(|e| {
                GifMakerError::GifEncodeError(format!("Failed to create GIF encoder: {e}"))
            })?;
        encoder
            .set_repeat(self.options.gif_repeat())
            .map_err(|e| GifMakerError::GifEncodeError(format!("Failed to set GIF repeat: {e}")))?;

        self.encoder = Some(encoder);
        self.canvas = (canvas_width, canvas_height);
        Ok(())
    }

    /// Delay before the next frame, in hundredths of a second.
    fn next_delay(&self) -> u16 {
        let start = self.frame_rate.centiseconds_at(self.frame_count);
        let end = self.frame_rate.centiseconds_at(self.frame_count + 1);
        // Browsers play zero delays at 10 cs.
        u16::try_from(end - start).unwrap_or(u16::MAX).max(1)
    }

    /// Append a frame.
    pub fn write_frame(&mut self, image: &DynamicImage) -> Result<(), GifMakerError> {
        if self.encoder.is_none() {
            self.start_encoder(image.width(), image.height())?;
        }

        let (width, height) = self.canvas;
        let mut pixels = if image.width() == width as u32 && image.height() == height as u32 {
            image.to_rgba8().into_raw()
        } else {
            log::debug!(
                "Resizing {}x{} frame to the {width}x{height} canvas",
                image.width(),
                image.height(),
            );
            image
                .resize_exact(width as u32, height as u32, FilterType::Triangle)
                .to_rgba8()
                .into_raw()
        };

        let mut gif_frame = Frame::from_rgba_speed(width, height, &mut pixels, self.options.speed);
        gif_frame.delay = self.next_delay();

        let encoder = self.encoder.as_mut().ok_or_else(|| {
            GifMakerError::GifEncodeError("GIF encoder was not initialised".to_string())
        })?;
        encoder.write_frame(&gif_frame).map_err(|e| {
            GifMakerError::GifEncodeError(format!("Failed to write GIF frame: {e}"))
        })?;

        self.frame_count += 1;
        Ok(())
    }

    /// Write the trailer and move the GIF into place.
    ///
    /// # Errors
    ///
    /// Returns [`GifMakerError::EmptyVideo`] if no frame was written; nothing
    /// is created at the destination in that case.
    pub fn finish(mut self) -> Result<GifArtifact, GifMakerError> {
        let encoder = self.encoder.take().ok_or(GifMakerError::EmptyVideo)?;

        let buffered = encoder.into_inner().map_err(|e| {
            GifMakerError::GifEncodeError(format!("Failed to finish GIF stream: {e}"))
        })?;
        let file = buffered
            .into_inner()
            .map_err(|e| GifMakerError::IoError(e.into_error()))?;
        file.as_file().sync_all()?;
        file.persist(&self.path)
            .map_err(|e| GifMakerError::IoError(e.error))?;

        let bytes = fs::metadata(&self.path)?.len();
        log::debug!(
            "Wrote {} frame(s), {bytes} bytes to {}",
            self.frame_count,
            self.path.display(),
        );

        Ok(GifArtifact {
            path: self.path.clone(),
            frame_count: self.frame_count,
            bytes,
            repeat: self.options.repeat,
            optimization: None,
        })
    }
}

/// Encode a sequence of frames as an animated GIF at `path`.
pub fn encode_gif<P, I>(
    path: P,
    frames: I,
    frame_rate: FrameRate,
    options: &GifOptions,
) -> Result<GifArtifact, GifMakerError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = DynamicImage>,
{
    let mut writer = GifWriter::create(path, frame_rate, options)?;
    for frame in frames {
        writer.write_frame(&frame)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_alternate_to_keep_fifteen_fps() {
        let directory = tempfile::tempdir().unwrap();
        let mut writer = GifWriter::create(
            directory.path().join("out.gif"),
            FrameRate::from_fps(15).unwrap(),
            &GifOptions::new(),
        )
        .unwrap();

        let mut delays = Vec::new();
        for _ in 0..15 {
            delays.push(writer.next_delay());
            writer.frame_count += 1;
        }
        assert_eq!(delays.iter().map(|d| *d as u32).sum::<u32>(), 100);
        assert_eq!(&delays[..3], &[7, 6, 7]);
    }

    #[test]
    fn speed_is_clamped() {
        assert_eq!(GifOptions::new().speed(0).speed, 1);
        assert_eq!(GifOptions::new().speed(99).speed, 30);
    }
}
