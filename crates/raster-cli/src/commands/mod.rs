//! CLI command implementations

pub mod blend;
pub mod convert;
pub mod correlate;
pub mod draw;
pub mod flip;
pub mod histogram;
pub mod info;
pub mod resize;
pub mod rotate;
pub mod stats;

use anyhow::{Context, Result, bail};
use raster_core::{PixelBuffer, Point, Rect, Rgba};
use raster_io::{BitDepth, Format, ImageIo};
use raster_ops::convert::standard_type_for;
use std::path::Path;

/// Load image from path
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    raster_io::load(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
///
/// Without an explicit depth the buffer's own type is kept when the format
/// can store it (any type for TIFF), otherwise the nearest standard depth.
pub fn save_image(io: &ImageIo, path: &Path, buf: &PixelBuffer, bits: Option<u32>) -> Result<()> {
    let result = match bits {
        Some(bits) => {
            let Some(depth) = BitDepth::from_bits(bits) else {
                bail!("Unsupported bit depth: {bits} (use 8, 16, 24, 32, 48 or 64)");
            };
            io.save(buf, path, depth)
        }
        None => match BitDepth::for_pixel_type(buf.pixel_type()) {
            Some(depth) => io.save(buf, path, depth),
            None if Format::from_extension(path) == Format::Tiff => io.save_native(buf, path),
            None => {
                let standard = standard_type_for(buf.pixel_type());
                let depth = BitDepth::for_pixel_type(standard).unwrap_or(BitDepth::Bit8);
                io.save(buf, path, depth)
            }
        },
    };
    result.with_context(|| format!("Failed to save: {}", path.display()))
}

fn parse_numbers<T: std::str::FromStr>(s: &str, count: usize, what: &str) -> Result<Vec<T>> {
    let values: Vec<T> = s
        .split(',')
        .map(|p| p.trim().parse::<T>())
        .collect::<Result<_, _>>()
        .map_err(|_| anyhow::anyhow!("Invalid {what}: {s}"))?;
    if values.len() != count {
        bail!("Invalid {what}: {s} (expected {count} comma-separated values)");
    }
    Ok(values)
}

/// Parse "x,y,w,h" into an inclusive rectangle
pub fn parse_rect(s: &str) -> Result<Rect> {
    let v: Vec<i64> = parse_numbers(s, 4, "rectangle")?;
    if v[2] <= 0 || v[3] <= 0 {
        bail!("Rectangle needs a positive size: {s}");
    }
    Ok(Rect::from_origin_size(v[0] as i32, v[1] as i32, v[2] as u32, v[3] as u32))
}

/// Parse "x,y"
pub fn parse_point(s: &str) -> Result<Point> {
    let v: Vec<i32> = parse_numbers(s, 2, "point")?;
    Ok(Point::new(v[0], v[1]))
}

/// Parse "x1,y1,x2,y2"
pub fn parse_line(s: &str) -> Result<(Point, Point)> {
    let v: Vec<i32> = parse_numbers(s, 4, "line")?;
    Ok((Point::new(v[0], v[1]), Point::new(v[2], v[3])))
}

/// Parse colour string like "255,0,0" or "255,0,0,128"
pub fn parse_colour(s: &str) -> Result<Rgba> {
    let parts: Vec<u8> = s
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|_| anyhow::anyhow!("Invalid colour format: {s}"))?;
    match parts.as_slice() {
        [r, g, b] => Ok(Rgba::rgb(*r, *g, *b)),
        [r, g, b, a] => Ok(Rgba::new(*r, *g, *b, *a)),
        [g] => Ok(Rgba::grey(*g)),
        _ => bail!("Invalid colour format: {s}"),
    }
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
