//! Convert command: format, bit depth and pixel type.

use crate::ConvertArgs;
use anyhow::{Context, Result};
use raster_core::PixelType;
use raster_io::{ImageIo, IoConfig};
use raster_ops::convert::convert_to_type;
use tracing::info;

/// Runs the convert command.
pub fn run(args: ConvertArgs, verbose: u8) -> Result<()> {
    let mut image = super::load_image(&args.input)?;

    if let Some(name) = &args.pixel_type {
        let target: PixelType = name
            .parse()
            .with_context(|| format!("Unknown pixel type: {name}"))?;
        image = convert_to_type(&image, target, args.scale)
            .with_context(|| format!("Cannot convert {} to {target}", image.pixel_type()))?;
    }

    let mut config = IoConfig::default();
    if let Some(q) = args.quality {
        config = config.with_jpeg_quality(q);
    }
    let io = ImageIo::new(config);
    super::save_image(&io, &args.output, &image, args.depth)?;

    info!(input = %args.input.display(), output = %args.output.display(), "converted");
    if verbose > 0 {
        println!("{} -> {}", args.input.display(), args.output.display());
    }
    Ok(())
}
