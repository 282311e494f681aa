//! raster - command-line front end for the raster image engine
//!
//! Inspect, convert, resample, align and annotate BMP/PNG/JPEG/TIFF images.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "raster")]
#[command(author, version, about = "Raster image engine CLI")]
#[command(long_about = "
Inspect, convert, resample, align and annotate raster images.

Examples:
  raster info scan.tif --stats           # Dimensions, type and statistics
  raster convert scan.tif scan.png -d 8  # Save as 8-bit greyscale
  raster resize in.png -w 640 -o out.png -f lanczos3
  raster rotate in.png 30 -o out.png --bg 255,255,255
  raster stats in.tif --json
  raster correlate left.png right.png --edge right --thickness 40
  raster blend base.png tile.png --at 480,0 -o mosaic.png
  raster draw in.png -o out.png --rect 10,10,50,30 --colour 255,0,0
")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Write log output to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display image information
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Convert format, bit depth or pixel type
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Resample to a new size
    #[command(visible_alias = "r")]
    Resize(ResizeArgs),

    /// Mirror horizontally and/or vertically
    Flip(FlipArgs),

    /// Rotate by an arbitrary angle
    Rotate(RotateArgs),

    /// Summary statistics
    Stats(StatsArgs),

    /// Value histogram
    #[command(visible_alias = "hist")]
    Histogram(HistogramArgs),

    /// Find the offset that best aligns two images
    Correlate(CorrelateArgs),

    /// Paste one image over another with a gradient or alpha blend
    Blend(BlendArgs),

    /// Draw rectangles and lines
    Draw(DrawArgs),
}

#[derive(Args)]
pub struct InfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Include statistics
    #[arg(short, long)]
    stats: bool,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    output: PathBuf,

    /// Bits per pixel: 8, 16, 24, 32, 48, 64
    #[arg(short = 'd', long)]
    depth: Option<u32>,

    /// Convert to this pixel type before saving (u8, f32, rgb16, ...)
    #[arg(short = 't', long = "type")]
    pixel_type: Option<String>,

    /// Stretch values onto the target range when converting types
    #[arg(long)]
    scale: bool,

    /// Quality (1-100, for JPEG)
    #[arg(short = 'q', long)]
    quality: Option<u8>,
}

#[derive(Args)]
pub struct ResizeArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Target width
    #[arg(short, long)]
    width: Option<u32>,

    /// Target height
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Scale factor (e.g., 0.5, 2.0)
    #[arg(short, long)]
    scale: Option<f64>,

    /// Filter: box, bilinear, bicubic, bspline, catmullrom, lanczos3
    #[arg(short, long, default_value = "bicubic")]
    filter: String,

    /// Keep aspect ratio inside width x height
    #[arg(long)]
    fit: bool,
}

#[derive(Args)]
pub struct FlipArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Mirror left to right
    #[arg(short = 'x', long)]
    horizontal: bool,

    /// Mirror top to bottom
    #[arg(short = 'y', long)]
    vertical: bool,
}

#[derive(Args)]
pub struct RotateArgs {
    /// Input image
    input: PathBuf,

    /// Angle in degrees, clockwise
    #[arg(allow_hyphen_values = true)]
    angle: f64,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Background colour "r,g,b[,a]"
    #[arg(long = "bg", default_value = "0,0,0")]
    background: String,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Input image
    input: PathBuf,

    /// Restrict to "x,y,w,h"
    #[arg(short, long)]
    region: Option<String>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct HistogramArgs {
    /// Input image
    input: PathBuf,

    /// Number of bins
    #[arg(short, long, default_value = "256")]
    bins: usize,

    /// Lower end of the range (default 0)
    #[arg(long, allow_hyphen_values = true)]
    min: Option<f64>,

    /// Upper end of the range (default: type maximum)
    #[arg(long, allow_hyphen_values = true)]
    max: Option<f64>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct CorrelateArgs {
    /// First image
    first: PathBuf,

    /// Second image
    second: PathBuf,

    /// Region of the first image "x,y,w,h" (default: whole image)
    #[arg(long)]
    rect1: Option<String>,

    /// Region of the second image "x,y,w,h" (default: whole image)
    #[arg(long)]
    rect2: Option<String>,

    /// Offsets to search "x,y,w,h" in the first region's frame
    #[arg(long, allow_hyphen_values = true)]
    search: Option<String>,

    /// Score Sobel edge magnitude instead of intensity
    #[arg(long)]
    edges: bool,

    /// Align along a shared edge: right or bottom
    #[arg(long)]
    edge: Option<String>,

    /// Strip thickness for --edge
    #[arg(long, default_value = "32")]
    thickness: u32,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct BlendArgs {
    /// Base image
    base: PathBuf,

    /// Image pasted over the base
    overlay: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Overlay position "x,y" in the base
    #[arg(long, default_value = "0,0", allow_hyphen_values = true)]
    at: String,

    /// Constant alpha 0-255 instead of a gradient seam
    #[arg(long)]
    alpha: Option<u32>,

    /// Mask image: zero pixels take the overlay unblended
    #[arg(long)]
    mask: Option<PathBuf>,
}

#[derive(Args)]
pub struct DrawArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Rectangle "x,y,w,h" (repeatable)
    #[arg(long)]
    rect: Vec<String>,

    /// Line "x1,y1,x2,y2" (repeatable)
    #[arg(long, allow_hyphen_values = true)]
    line: Vec<String>,

    /// Colour "r,g,b" (grey images use its luma)
    #[arg(long, default_value = "255,255,255")]
    colour: String,

    /// Line width in pixels
    #[arg(long, default_value = "1")]
    width: u32,

    /// Fill rectangles instead of outlining them
    #[arg(long)]
    fill: bool,
}

/// Installs the tracing subscriber.
///
/// `RUST_LOG` wins over `-v`. The returned guard flushes the file writer
/// on drop.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Convert(args) => commands::convert::run(args, cli.verbose),
        Commands::Resize(args) => commands::resize::run(args, cli.verbose),
        Commands::Flip(args) => commands::flip::run(args, cli.verbose),
        Commands::Rotate(args) => commands::rotate::run(args, cli.verbose),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Histogram(args) => commands::histogram::run(args),
        Commands::Correlate(args) => commands::correlate::run(args, cli.verbose),
        Commands::Blend(args) => commands::blend::run(args, cli.verbose),
        Commands::Draw(args) => commands::draw::run(args, cli.verbose),
    }
}
