//! Progress reporting.
//!
//! Attach a [`ProgressCallback`] to a [`GifMaker`](crate::GifMaker) to observe
//! each video as its frames are written. Callbacks observe only; they cannot
//! stop a conversion.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gifmaker::{ConvertOptions, GifMaker, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}: {} frames", info.video.display(), info.frames_written);
//!     }
//! }
//!
//! let mut maker = GifMaker::new(ConvertOptions::new()).with_progress(Arc::new(PrintProgress));
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Where a conversion is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressStage {
    /// The video was opened and decoding is about to start.
    Started,
    /// Another frame was written to the GIF.
    Frame,
    /// The GIF is complete (before the optional optimization pass).
    Encoded,
}

/// A snapshot of one video's conversion.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    pub stage: ProgressStage,
    /// The source video.
    pub video: PathBuf,
    /// Frames written to the GIF so far.
    pub frames_written: u64,
    /// Source frames decoded so far.
    pub source_frames: u64,
    /// Wall-clock time since this video was opened.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates during conversion.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default when no callback is attached.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}
