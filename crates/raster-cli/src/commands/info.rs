//! Image info command.
//!
//! Displays format, dimensions, pixel type and, on request, statistics.

use crate::InfoArgs;
use anyhow::Result;
use raster_core::PixelBuffer;
use raster_io::Format;
use raster_ops::stats::{StatisticsReport, statistics_report};
use serde_json::json;
use std::fs;
use std::path::Path;

/// Runs the info command for every input.
pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    for path in &args.input {
        let file_size = fs::metadata(path)?.len();
        let format = Format::detect(path).unwrap_or(Format::Unknown);
        let image = super::load_image(path)?;
        let stats = args.stats.then(|| statistics_report(&image));

        if args.json {
            print_json(path, &image, format, file_size, stats.as_ref())?;
        } else {
            print_text(path, &image, format, file_size, stats.as_ref(), verbose);
        }

        if args.input.len() > 1 && !args.json {
            println!();
        }
    }
    Ok(())
}

fn print_text(
    path: &Path,
    image: &PixelBuffer,
    format: Format,
    file_size: u64,
    stats: Option<&StatisticsReport>,
    verbose: u8,
) {
    println!("{}", path.display());
    println!("  Format:     {}", format);
    println!("  Resolution: {}x{}", image.width(), image.height());
    println!("  Pixel type: {} ({} bpp)", image.pixel_type(), image.bits_per_pixel());
    println!("  Greyscale:  {}", image.is_greyscale());
    println!("  File size:  {}", super::format_size(file_size));

    if verbose > 0 {
        println!("  Stride:     {} bytes", image.stride());
        println!("  Palette:    {}", image.palette().is_some());
    }

    if let Some(s) = stats {
        println!("  Min value:  {:.6}", s.min);
        println!("  Max value:  {:.6}", s.max);
        println!("  Mean:       {:.6}", s.mean);
        println!("  Std dev:    {:.6}", s.std_deviation);
    }
}

fn print_json(
    path: &Path,
    image: &PixelBuffer,
    format: Format,
    file_size: u64,
    stats: Option<&StatisticsReport>,
) -> Result<()> {
    let info = json!({
        "path": path.display().to_string(),
        "format": format.name(),
        "width": image.width(),
        "height": image.height(),
        "pixel_type": image.pixel_type(),
        "bits_per_pixel": image.bits_per_pixel(),
        "greyscale": image.is_greyscale(),
        "file_size": file_size,
        "stats": stats,
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
