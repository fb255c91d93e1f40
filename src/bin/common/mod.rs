//! Shared command-line plumbing for the `gifmaker` binaries.

use std::{error::Error, path::PathBuf, sync::Mutex, time::Duration};

use clap::Parser;
use colored::Colorize;
use gifmaker::{
    BatchReport, FfmpegLogLevel, FolderLocator, GifMaker, ProgressCallback, ProgressInfo,
    ProgressStage, SearchRoot,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

/// Parse arguments, exiting with status 1 on usage errors (0 for `--help`
/// and `--version`).
pub fn parse_args<T: Parser>() -> T {
    match T::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let code = if error.use_stderr() { 1 } else { 0 };
            let _ = error.print();
            std::process::exit(code);
        }
    }
}

/// Install the stderr logger. `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

pub fn apply_ffmpeg_log_level(level: Option<&str>) -> Result<(), Box<dyn Error>> {
    let level = match level {
        Some(value) => value.parse::<FfmpegLogLevel>()?,
        None => FfmpegLogLevel::Error,
    };
    gifmaker::set_ffmpeg_log_level(level);
    Ok(())
}

/// Resolve the search root and find `name` below it.
pub fn locate_folder(root: SearchRoot, name: &str) -> Result<PathBuf, Box<dyn Error>> {
    let root = root.resolve()?;
    log::info!("Looking for folder {name}");
    let folder = FolderLocator::new(root).require(name)?;
    log::info!("Found {}", folder.display());
    Ok(folder)
}

/// Find `name` below `root` and convert every video inside it.
pub fn convert_named_folder(
    maker: &mut GifMaker,
    root: SearchRoot,
    name: &str,
) -> Result<BatchReport, Box<dyn Error>> {
    let folder = locate_folder(root, name)?;
    Ok(maker.convert_folder(&folder)?)
}

/// Spinner per video, fed by conversion progress.
#[derive(Default)]
pub struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };

        match info.stage {
            ProgressStage::Started => {
                let bar = ProgressBar::new_spinner();
                let template = "{spinner:.green} {msg} [{elapsed}]";
                if let Ok(style) = ProgressStyle::with_template(template) {
                    bar.set_style(style);
                }
                bar.enable_steady_tick(Duration::from_millis(120));
                bar.set_message(format!("{}", info.video.display()));
                *slot = Some(bar);
            }
            ProgressStage::Frame => {
                if let Some(bar) = slot.as_ref() {
                    bar.set_message(format!(
                        "{}: {} frame(s) from {} decoded",
                        info.video.display(),
                        info.frames_written,
                        info.source_frames,
                    ));
                }
            }
            _ => {
                if let Some(bar) = slot.take() {
                    bar.finish_and_clear();
                }
            }
        }
    }
}

/// Print the end-of-batch summary.
pub fn print_summary(report: &BatchReport, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        let payload = json!({
            "folder": report.folder.display().to_string(),
            "converted": report.converted.iter().map(|artifact| json!({
                "path": artifact.path.display().to_string(),
                "frames": artifact.frame_count,
                "bytes": artifact.bytes,
                "optimized": artifact.optimization.is_some_and(|outcome| outcome.replaced),
            })).collect::<Vec<_>>(),
            "failed": report.failures.iter().map(|failure| json!({
                "path": failure.path.display().to_string(),
                "error": failure.error.to_string(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if report.is_empty() {
        return Ok(());
    }

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "Converted {} video(s) in {}",
            report.succeeded(),
            report.folder.display()
        )
        .green()
    );
    if report.failed() > 0 {
        println!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("{} video(s) failed", report.failed()).yellow()
        );
        for failure in &report.failures {
            println!("  {}: {}", failure.path.display(), failure.error);
        }
    }
    Ok(())
}

/// Print the outcome of a run and return the process exit status.
///
/// Anything that stops the run before the batch (bad flags, missing folder,
/// unloadable model) exits 1. A finished batch exits 0, even when it held no
/// videos or some of them failed.
pub fn finish(outcome: Result<BatchReport, Box<dyn Error>>, as_json: bool) -> i32 {
    match outcome.and_then(|report| print_summary(&report, as_json)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use gifmaker::{ConvertOptions, GifMaker, SearchRoot};

    use super::{convert_named_folder, finish};

    fn run_in(root: &std::path::Path, name: &str) -> i32 {
        let mut maker = GifMaker::new(ConvertOptions::new());
        let outcome = convert_named_folder(&mut maker, SearchRoot::Path(root.to_path_buf()), name);
        finish(outcome, true)
    }

    #[test]
    fn missing_folder_exits_one() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(run_in(root.path(), "Nowhere"), 1);
    }

    #[test]
    fn folder_without_videos_exits_zero() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("outer/Clips")).unwrap();
        fs::write(root.path().join("outer/Clips/notes.txt"), b"hi").unwrap();

        assert_eq!(run_in(root.path(), "Clips"), 0);
        assert!(!root.path().join("outer/Clips/notes.gif").exists());
    }

    #[test]
    fn failed_videos_still_exit_zero() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("Clips")).unwrap();
        fs::write(root.path().join("Clips/broken.mp4"), b"not a video").unwrap();

        assert_eq!(run_in(root.path(), "Clips"), 0);
        assert!(!root.path().join("Clips/broken.gif").exists());
    }
}
