//! Resize command.

use crate::ResizeArgs;
use anyhow::{Context, Result, bail};
use raster_io::ImageIo;
use raster_ops::resize::{fit_dimensions, rescale};
use raster_ops::{Filter, Unstoppable};

/// Runs the resize command.
pub fn run(args: ResizeArgs, verbose: u8) -> Result<()> {
    let image = super::load_image(&args.input)?;
    let (w, h) = image.dimensions();
    let filter: Filter = args.filter.parse()?;

    let (new_w, new_h) = match (args.width, args.height, args.scale) {
        (_, _, Some(s)) if s > 0.0 => (
            ((w as f64 * s).round() as u32).max(1),
            ((h as f64 * s).round() as u32).max(1),
        ),
        (_, _, Some(s)) => bail!("Scale must be positive, got {s}"),
        (Some(tw), Some(th), None) if args.fit => fit_dimensions(w, h, tw, th),
        (Some(tw), Some(th), None) => (tw, th),
        (Some(tw), None, None) => (tw, ((h as u64 * tw as u64) / w as u64).max(1) as u32),
        (None, Some(th), None) => (((w as u64 * th as u64) / h as u64).max(1) as u32, th),
        (None, None, None) => bail!("Specify --width, --height or --scale"),
    };

    if verbose > 0 {
        println!("Resizing {}x{} -> {}x{} ({:?})", w, h, new_w, new_h, filter);
    }

    let result = rescale(&image, new_w, new_h, filter, &Unstoppable)
        .with_context(|| format!("Failed to resize {}", args.input.display()))?;
    super::save_image(&ImageIo::default(), &args.output, &result, None)
}
