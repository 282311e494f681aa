//! Rotate command - arbitrary angle rotation

use crate::RotateArgs;
use crate::commands::{load_image, parse_colour, save_image};
use anyhow::Result;
use raster_io::ImageIo;
use raster_ops::affine::rotate;

/// Runs the rotate command.
pub fn run(args: RotateArgs, verbose: u8) -> Result<()> {
    let input = load_image(&args.input)?;
    let background = parse_colour(&args.background)?;

    if verbose > 0 {
        println!("Size: {}x{} ({})", input.width(), input.height(), input.pixel_type());
        println!("Rotation: {}°", args.angle);
    }

    let result = rotate(&input, args.angle, background)?;

    if verbose > 0 {
        println!("New size: {}x{}", result.width(), result.height());
    }
    save_image(&ImageIo::default(), &args.output, &result, None)
}
