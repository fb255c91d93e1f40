//! # gifmaker
//!
//! Find a folder by name and turn every video inside it into a looping GIF.
//!
//! `gifmaker` locates a folder anywhere below a search root, lists the
//! `.mov` / `.mp4` files directly inside it, and converts each one into an
//! animated GIF written next to the source. Frames are decoded with FFmpeg via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next), sampled down to a
//! fixed playback rate, optionally run through a background-removal model,
//! and encoded with the [`gif`](https://crates.io/crates/gif) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gifmaker::{ConvertOptions, FolderLocator, GifMaker, SearchRoot};
//!
//! let locator = FolderLocator::new(SearchRoot::Home.resolve()?);
//! let folder = locator.require("Screen Recordings")?;
//!
//! let mut maker = GifMaker::new(ConvertOptions::new());
//! let report = maker.convert_folder(&folder)?;
//! println!("{} GIF(s) written", report.succeeded());
//! # Ok::<(), gifmaker::GifMakerError>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Folder lookup** — pre-order walk that skips unreadable directories
//! - **Video listing** — immediate `.mov` / `.mp4` files, case-insensitive
//! - **Frame sampling** — output frame `k` is source frame
//!   `floor(k * fps_in / fps_out)`, computed with exact rationals
//! - **Background removal** — resize to a fixed resolution and segment with
//!   an injected [`Segmenter`]
//! - **GIF encoding** — streamed to a temporary file, renamed into place on
//!   success, loops forever
//! - **Optimization** — optional `gifsicle` pass that never damages the
//!   encoded GIF
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `segmentation` | [`OnnxSegmenter`] background removal via ONNX Runtime, and the `gifmaker-nobg` binary |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system. The
//! optimization pass needs `gifsicle` on `PATH`.

pub mod config;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod frame_rate;
pub mod gif;
pub mod locator;
#[cfg(feature = "segmentation")]
pub mod onnx;
pub mod optimize;
pub mod pipeline;
pub mod processor;
pub mod progress;
pub mod sampler;
pub mod video;
pub mod videos;

pub use config::{BackgroundOptions, ConvertOptions, SegmentationFallback, parse_hex_color};
pub use error::GifMakerError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame_rate::FrameRate;
pub use crate::gif::{GifArtifact, GifOptions, GifWriter, encode_gif};
pub use locator::{FolderLocator, SearchRoot, find_folder};
#[cfg(feature = "segmentation")]
pub use onnx::{OnnxSegmenter, SegmentationModelOptions};
pub use optimize::{GifOptimizer, Gifsicle, OptimizeOutcome};
pub use pipeline::{BatchReport, FailedVideo, GifMaker};
pub use processor::{FrameProcessor, Segmenter, replace_background};
pub use progress::{ProgressCallback, ProgressInfo, ProgressStage};
pub use sampler::{FrameSampler, FrameSelector, FrameSource, SampledFrame};
pub use video::VideoFile;
pub use videos::{VIDEO_EXTENSIONS, find_videos, gif_path_for, is_video_path};
