//! The per-video conversion pipeline.
//!
//! [`GifMaker`] runs decode → sample → (background removal) → encode →
//! (optimize) for one video at a time. [`GifMaker::convert_folder`] applies
//! it to every video in a folder. A failing video is logged and recorded in
//! the [`BatchReport`], and the rest of the batch carries on.
//!
//! # Example
//!
//! ```no_run
//! use gifmaker::{ConvertOptions, GifMaker, Gifsicle};
//!
//! let mut maker = GifMaker::new(ConvertOptions::new().with_optimize(true))
//!     .with_optimizer(Box::new(Gifsicle::new()));
//! let report = maker.convert_folder("/Users/me/Screen Recordings")?;
//! println!("{} converted, {} failed", report.succeeded(), report.failed());
//! # Ok::<(), gifmaker::GifMakerError>(())
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use crate::{
    config::ConvertOptions,
    error::GifMakerError,
    gif::{GifArtifact, GifWriter},
    optimize::GifOptimizer,
    processor::FrameProcessor,
    progress::{NoOpProgress, ProgressCallback, ProgressInfo, ProgressStage},
    sampler::{FrameSampler, FrameSource},
    video::VideoFile,
    videos::{find_videos, gif_path_for},
};

/// A video that could not be converted.
#[derive(Debug)]
pub struct FailedVideo {
    pub path: PathBuf,
    pub error: GifMakerError,
}

/// Outcome of converting every video in a folder.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// The folder that was processed.
    pub folder: PathBuf,
    /// GIFs written, in processing order.
    pub converted: Vec<GifArtifact>,
    /// Videos that failed, in processing order.
    pub failures: Vec<FailedVideo>,
}

impl BatchReport {
    /// Number of videos converted.
    pub fn succeeded(&self) -> usize {
        self.converted.len()
    }

    /// Number of videos that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// `true` when the folder held no videos at all.
    pub fn is_empty(&self) -> bool {
        self.converted.is_empty() && self.failures.is_empty()
    }
}

/// Converts videos into looping GIFs.
///
/// Holds everything that lives for the whole run: options, the optional
/// background processor (and the model inside it), the optional optimizer and
/// the progress callback. Videos are processed strictly one after another.
pub struct GifMaker {
    options: ConvertOptions,
    processor: Option<FrameProcessor>,
    optimizer: Option<Box<dyn GifOptimizer>>,
    progress: Arc<dyn ProgressCallback>,
}

impl GifMaker {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            processor: None,
            optimizer: None,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Remove backgrounds from every sampled frame.
    #[must_use]
    pub fn with_processor(mut self, processor: FrameProcessor) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Optimizer used when [`ConvertOptions::optimize`] is set.
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: Box<dyn GifOptimizer>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert one video file into a GIF next to it.
    pub fn convert_video<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<GifArtifact, GifMakerError> {
        let path = path.as_ref();
        let video = VideoFile::open(path)?;
        log::debug!("{video:?}");
        self.convert_source(video, path, gif_path_for(path))
    }

    /// Convert any [`FrameSource`] into a GIF at `output`.
    ///
    /// `label` names the source in progress reports.
    pub fn convert_source<S: FrameSource>(
        &mut self,
        source: S,
        label: &Path,
        output: PathBuf,
    ) -> Result<GifArtifact, GifMakerError> {
        let started = Instant::now();
        let target = self.options.frame_rate;
        // Never faster than the source: above its rate every frame is kept once.
        let playback = target.capped_at(source.frame_rate());
        let mut writer = GifWriter::create(&output, playback, &self.options.gif)?;
        let mut sampler = FrameSampler::new(source, target);

        if let Some(processor) = self.processor.as_mut() {
            processor.begin_video();
        }
        self.report(ProgressStage::Started, label, 0, 0, started);

        while let Some(sampled) = sampler.next() {
            let mut image = sampled?.image;
            if let Some(processor) = self.processor.as_mut() {
                image = processor.process(image)?;
            }
            writer.write_frame(&image)?;
            self.report(
                ProgressStage::Frame,
                label,
                writer.frame_count(),
                sampler.source_frames(),
                started,
            );
        }

        if let Some(processor) = self.processor.as_ref() {
            if processor.failures() > 0 {
                log::warn!(
                    "{} frame(s) of '{}' could not be segmented",
                    processor.failures(),
                    label.display(),
                );
            }
        }

        let mut artifact = writer.finish()?;
        self.report(
            ProgressStage::Encoded,
            label,
            artifact.frame_count,
            sampler.source_frames(),
            started,
        );

        if self.options.optimize {
            self.optimize(&mut artifact);
        }
        Ok(artifact)
    }

    /// Run the optimizer. Failures are logged and leave the GIF as encoded.
    fn optimize(&self, artifact: &mut GifArtifact) {
        let Some(optimizer) = self.optimizer.as_ref() else {
            log::debug!("Optimization requested but no optimizer is configured");
            return;
        };

        match optimizer.optimize(&artifact.path) {
            Ok(outcome) => {
                if outcome.replaced {
                    log::info!(
                        "Optimized '{}': {} -> {} bytes",
                        artifact.path.display(),
                        outcome.original_bytes,
                        outcome.optimized_bytes,
                    );
                    artifact.bytes = outcome.optimized_bytes;
                }
                artifact.optimization = Some(outcome);
            }
            Err(error) => {
                log::warn!(
                    "Could not optimize '{}', keeping the original: {error}",
                    artifact.path.display(),
                );
            }
        }
    }

    fn report(
        &self,
        stage: ProgressStage,
        video: &Path,
        frames_written: u64,
        source_frames: u64,
        started: Instant,
    ) {
        self.progress.on_progress(&ProgressInfo {
            stage,
            video: video.to_path_buf(),
            frames_written,
            source_frames,
            elapsed: started.elapsed(),
        });
    }

    /// Convert every video directly inside `folder`.
    ///
    /// # Errors
    ///
    /// Only listing the folder can fail the batch. Per-video failures are
    /// logged and collected in [`BatchReport::failures`].
    pub fn convert_folder<P: AsRef<Path>>(
        &mut self,
        folder: P,
    ) -> Result<BatchReport, GifMakerError> {
        let folder = folder.as_ref();
        let videos = find_videos(folder)?;
        self.convert_all(folder, videos, |maker, video| maker.convert_video(video))
    }

    /// Drive `convert` over `videos`, isolating failures per video.
    pub(crate) fn convert_all<F>(
        &mut self,
        folder: &Path,
        videos: Vec<PathBuf>,
        mut convert: F,
    ) -> Result<BatchReport, GifMakerError>
    where
        F: FnMut(&mut Self, &Path) -> Result<GifArtifact, GifMakerError>,
    {
        let mut report = BatchReport {
            folder: folder.to_path_buf(),
            ..BatchReport::default()
        };

        if videos.is_empty() {
            log::info!("No video files found in '{}'.", folder.display());
            return Ok(report);
        }

        for video in videos {
            log::info!("Converting '{}' to GIF...", video.display());
            match convert(self, &video) {
                Ok(artifact) => {
                    log::info!(
                        "GIF '{}' created successfully ({} frames).",
                        artifact.path.display(),
                        artifact.frame_count,
                    );
                    report.converted.push(artifact);
                }
                Err(error) => {
                    log::error!("Error converting '{}' to GIF: {error}", video.display());
                    report.failures.push(FailedVideo { path: video, error });
                }
            }
        }

        log::info!(
            "Finished '{}': {} converted, {} failed.",
            folder.display(),
            report.succeeded(),
            report.failed(),
        );
        Ok(report)
    }
}
