//! Flip command.

use crate::FlipArgs;
use anyhow::{Result, bail};
use raster_io::ImageIo;
use raster_ops::transform::{flip_horizontal, flip_vertical};

/// Runs the flip command.
pub fn run(args: FlipArgs, verbose: u8) -> Result<()> {
    if !args.horizontal && !args.vertical {
        bail!("Nothing to do: pass --horizontal and/or --vertical");
    }
    let mut image = super::load_image(&args.input)?;
    if args.horizontal {
        flip_horizontal(&mut image);
    }
    if args.vertical {
        flip_vertical(&mut image);
    }
    if verbose > 0 {
        println!("Flipped {}", args.input.display());
    }
    super::save_image(&ImageIo::default(), &args.output, &image, None)
}
