//! Blend command - paste with a gradient seam or constant alpha

use crate::BlendArgs;
use anyhow::{Context, Result};
use raster_io::ImageIo;
use raster_ops::composite::{gradient_blend_paste_from_top_left, paste};
use raster_ops::convert::convert_to_type;

/// Runs the blend command.
pub fn run(args: BlendArgs, verbose: u8) -> Result<()> {
    let mut base = super::load_image(&args.base)?;
    let mut overlay = super::load_image(&args.overlay)?;
    let at = super::parse_point(&args.at)?;

    if overlay.pixel_type() != base.pixel_type() {
        overlay = convert_to_type(&overlay, base.pixel_type(), true)
            .with_context(|| format!("Overlay cannot be converted to {}", base.pixel_type()))?;
    }

    match args.alpha {
        Some(alpha) => paste(&mut base, &overlay, at.x, at.y, alpha)?,
        None => {
            let mask = args.mask.as_deref().map(super::load_image).transpose()?;
            gradient_blend_paste_from_top_left(&mut base, &overlay, at.x, at.y, mask.as_ref())
                .context("Gradient blend failed")?;
        }
    }

    if verbose > 0 {
        println!(
            "Blended {} at ({}, {}) into {}",
            args.overlay.display(),
            at.x,
            at.y,
            args.base.display()
        );
    }
    super::save_image(&ImageIo::default(), &args.output, &base, None)
}
