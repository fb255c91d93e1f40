use std::{path::PathBuf, sync::Arc};

use clap::{Parser, ValueEnum};
use gifmaker::{
    BackgroundOptions, BatchReport, ConvertOptions, FrameProcessor, FrameRate, GifMaker, Gifsicle,
    OnnxSegmenter, SearchRoot, SegmentationFallback, SegmentationModelOptions, parse_hex_color,
};

mod common;

const CLI_AFTER_HELP: &str = "Examples:\n  gifmaker-nobg \"Screen Recordings\" --model u2netp.onnx\n  gifmaker-nobg demos --model modnet.onnx --model-input 512 --background 00ff00\n  gifmaker-nobg demos --model u2netp.onnx --on-segmentation-error abort --no-optimize";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnSegmentationError {
    /// Skip the whole video.
    Abort,
    /// Reuse the previous frame and keep going.
    Repeat,
}

impl From<OnSegmentationError> for SegmentationFallback {
    fn from(value: OnSegmentationError) -> Self {
        match value {
            OnSegmentationError::Abort => SegmentationFallback::AbortVideo,
            OnSegmentationError::Repeat => SegmentationFallback::RepeatLastFrame,
        }
    }
}

/// Find a folder by name and convert every .mov/.mp4 inside it into a GIF
/// with the background replaced by a flat colour.
#[derive(Debug, Parser)]
#[command(name = "gifmaker-nobg", version, after_help = CLI_AFTER_HELP)]
struct Cli {
    /// Name of the folder to search for (exact, case-sensitive).
    folder: String,

    /// ONNX segmentation model (1x3xHxW input, foreground map as first output).
    #[arg(long)]
    model: PathBuf,

    /// Square input size the model expects.
    #[arg(long, default_value_t = 320)]
    model_input: u32,

    /// Foreground confidence (0-255) below which a pixel becomes background.
    #[arg(long, default_value_t = 128)]
    threshold: u8,

    /// Directory to start searching from. Defaults to the home directory.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Frame rate of the generated GIFs.
    #[arg(long, default_value_t = 15)]
    fps: u32,

    /// Output width.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Output height.
    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Background fill colour as rrggbb.
    #[arg(long, default_value = "ffffff")]
    background: String,

    /// What to do when a frame cannot be segmented.
    #[arg(long, value_enum, default_value_t = OnSegmentationError::Repeat)]
    on_segmentation_error: OnSegmentationError,

    /// Skip the gifsicle size optimization.
    #[arg(long)]
    no_optimize: bool,

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

    let fill = parse_hex_color(&cli.background)
        .ok_or(format!("unsupported --background colour: {}", cli.background))?;
    let background = BackgroundOptions::new()
        .with_resolution(cli.width, cli.height)
        .with_fill(fill)
        .with_fallback(cli.on_segmentation_error.into());
    let options = ConvertOptions::new()
        .with_frame_rate(FrameRate::from_fps(cli.fps)?)
        .with_optimize(!cli.no_optimize);

    // Loaded once and shared by every frame of every video.
    let model = OnnxSegmenter::load(
        &cli.model,
        SegmentationModelOptions::new()
            .with_input_size(cli.model_input, cli.model_input)
            .with_threshold(cli.threshold),
    )?;

    let mut maker = GifMaker::new(options)
        .with_processor(FrameProcessor::new(Box::new(model), background))
        .with_optimizer(Box::new(Gifsicle::new()));
    if cli.progress {
        maker = maker.with_progress(Arc::new(common::TerminalProgress::new()));
    }

    let root = cli.root.map_or(SearchRoot::Home, SearchRoot::Path);
    common::convert_named_folder(&mut maker, root, &cli.folder)
}

fn main() {
    let cli: Cli = common::parse_args();
    common::init_logging(cli.verbose);

    let as_json = cli.json;
    std::process::exit(common::finish(run(cli), as_json));
}
