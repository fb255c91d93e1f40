//! Error types for the `gifmaker` crate.
//!
//! This module defines [`GifMakerError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry the path or frame that
//! failed together with the upstream message, so a batch run can log one line
//! per failing video without extra context at the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `gifmaker` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GifMakerError {
    /// No directory with the requested name exists under the search root.
    #[error("The folder '{name}' could not be found under {root}")]
    FolderNotFound {
        /// The folder name that was searched for.
        name: String,
        /// The root the search started from.
        root: PathBuf,
    },

    /// A directory listing could not be read.
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        /// Directory that could not be listed.
        path: PathBuf,
        /// Underlying I/O error.
        source: IoError,
    },

    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The video stream does not declare a usable frame rate.
    #[error("Invalid frame rate: numerator and denominator must be positive")]
    InvalidFrameRate,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// GIF encoding failed.
    #[error("GIF encoding error: {0}")]
    GifEncodeError(String),

    /// The source produced no frames, so there is nothing to encode.
    #[error("Video produced no frames")]
    EmptyVideo,

    /// The frame exceeds the 65535×65535 limit of the GIF format.
    #[error("Frame of {width}x{height} exceeds the GIF size limit")]
    FrameTooLarge {
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
    },

    /// Background segmentation failed for a frame.
    #[error("Segmentation error: {0}")]
    SegmentationError(String),

    /// The segmentation model could not be loaded.
    #[cfg(feature = "segmentation")]
    #[error("Failed to load segmentation model: {0}")]
    ModelLoadError(String),

    /// The size-optimization pass failed. The original GIF is left intact.
    #[error("GIF optimization error: {0}")]
    OptimizeError(String),
}

impl From<FfmpegError> for GifMakerError {
    fn from(error: FfmpegError) -> Self {
        GifMakerError::FfmpegError(error.to_string())
    }
}
