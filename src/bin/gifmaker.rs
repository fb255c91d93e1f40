use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use gifmaker::{BatchReport, ConvertOptions, FrameRate, GifMaker, Gifsicle, SearchRoot};

mod common;

const CLI_AFTER_HELP: &str = "Examples:\n  gifmaker \"Screen Recordings\"\n  gifmaker demos --root ~/Projects --fps 10 --optimize\n  gifmaker demos --json > report.json";

/// Find a folder by name and convert every .mov/.mp4 inside it into a GIF.
#[derive(Debug, Parser)]
#[command(name = "gifmaker", version, after_help = CLI_AFTER_HELP)]
struct Cli {
    /// Name of the folder to search for (exact, case-sensitive).
    folder: String,

    /// Directory to start searching from.
    #[arg(long, default_value = "/")]
    root: PathBuf,

    /// Frame rate of the generated GIFs.
    #[arg(long, default_value_t = 15)]
    fps: u32,

    /// Shrink each GIF with gifsicle after it is written.
    #[arg(long)]
    optimize: bool,

    /// Show a spinner while each video converts.
    #[arg(long)]
    progress: bool,

    /// Show debug logging.
    #[arg(long)]
    verbose: bool,

    /// Print the batch summary as JSON.
    #[arg(long)]
    json: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

fn run(cli: Cli) -> Result<BatchReport, Box<dyn std::error::Error>> {
    common::apply_ffmpeg_log_level(cli.log_level.as_deref())?;

    let options = ConvertOptions::new()
        .with_frame_rate(FrameRate::from_fps(cli.fps)?)
        .with_optimize(cli.optimize);

    let mut maker = GifMaker::new(options).with_optimizer(Box::new(Gifsicle::new()));
    if cli.progress {
        maker = maker.with_progress(Arc::new(common::TerminalProgress::new()));
    }

    common::convert_named_folder(&mut maker, SearchRoot::Path(cli.root), &cli.folder)
}

fn main() {
    let cli: Cli = common::parse_args();
    common::init_logging(cli.verbose);

    let as_json = cli.json;
    std::process::exit(common::finish(run(cli), as_json));
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn folder_is_required() {
        assert!(Cli::try_parse_from(["gifmaker"]).is_err());
        assert!(Cli::try_parse_from(["gifmaker", "a", "b"]).is_err());
    }

    #[test]
    fn default_arguments() {
        let cli = Cli::try_parse_from(["gifmaker", "Videos"]).unwrap();
        assert_eq!(cli.folder, "Videos");
        assert_eq!(cli.fps, 15);
        assert_eq!(cli.root, std::path::PathBuf::from("/"));
        assert!(!cli.optimize);
    }
}
