//! Draw command - rectangles and lines

use crate::DrawArgs;
use anyhow::{Result, bail};
use raster_io::ImageIo;
use raster_ops::draw::{
    colour_samples, draw_colour_line, draw_colour_rect, draw_colour_solid_rect, draw_greyscale_rect,
    draw_line, draw_solid_rectangle,
};

/// Runs the draw command.
pub fn run(args: DrawArgs, verbose: u8) -> Result<()> {
    if args.rect.is_empty() && args.line.is_empty() {
        bail!("Nothing to draw: pass --rect and/or --line");
    }
    let mut image = super::load_image(&args.input)?;
    let colour = super::parse_colour(&args.colour)?;
    let pixel_type = image.pixel_type();
    let is_colour = pixel_type.is_colour();
    let grey = colour_samples(pixel_type, colour)[0];

    for arg in &args.rect {
        let rect = super::parse_rect(arg)?;
        match (is_colour, args.fill) {
            (true, true) => draw_colour_solid_rect(&mut image, &rect, colour)?,
            (true, false) => draw_colour_rect(&mut image, &rect, colour, args.width)?,
            (false, true) => draw_solid_rectangle(&mut image, &rect, grey)?,
            (false, false) => draw_greyscale_rect(&mut image, &rect, grey, args.width)?,
        }
    }
    for arg in &args.line {
        let (p1, p2) = super::parse_line(arg)?;
        if is_colour {
            draw_colour_line(&mut image, p1, p2, colour, args.width)?;
        } else {
            draw_line(&mut image, p1, p2, grey, args.width)?;
        }
    }

    if verbose > 0 {
        println!("Drew {} rect(s), {} line(s)", args.rect.len(), args.line.len());
    }
    super::save_image(&ImageIo::default(), &args.output, &image, None)
}
