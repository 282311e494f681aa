//! Correlate command.
//!
//! Reports the offset of the second image's region in the first image's
//! frame and the normalized cross-correlation score.

use crate::CorrelateArgs;
use anyhow::{Context, Result, bail};
use raster_core::Rect;
use raster_ops::Unstoppable;
use raster_ops::correlate::{
    Correlation, EdgeDetect, Identity, Prefilter, correlate_along_bottom_edge,
    correlate_along_right_edge, kernel_correlate_regions,
};
use serde_json::json;

/// Runs the correlate command.
pub fn run(args: CorrelateArgs, verbose: u8) -> Result<()> {
    let first = super::load_image(&args.first)?;
    let second = super::load_image(&args.second)?;

    let found = match args.edge.as_deref() {
        Some("right") => correlate_along_right_edge(&first, &second, args.thickness, &Unstoppable)?,
        Some("bottom") => correlate_along_bottom_edge(&first, &second, args.thickness, &Unstoppable)?,
        Some(other) => bail!("Unknown edge '{other}' (use right or bottom)"),
        None => {
            let rect1 = optional_rect(args.rect1.as_deref(), first.bounds())?;
            let rect2 = optional_rect(args.rect2.as_deref(), second.bounds())?;
            let search = args.search.as_deref().map(super::parse_rect).transpose()?;
            let prefilter: &dyn Prefilter = if args.edges { &EdgeDetect } else { &Identity };
            if verbose > 0 {
                println!("Region 1: {:?}", rect1);
                println!("Region 2: {:?}", rect2);
            }
            kernel_correlate_regions(
                &first,
                &rect1,
                &second,
                &rect2,
                search.as_ref(),
                None,
                prefilter,
                &Unstoppable,
            )
            .context("Correlation failed")?
        }
    };

    report(&found, args.json)
}

fn optional_rect(arg: Option<&str>, default: Rect) -> Result<Rect> {
    arg.map_or(Ok(default), super::parse_rect)
}

fn report(found: &Correlation, as_json: bool) -> Result<()> {
    if as_json {
        let out = json!({
            "x": found.offset.x,
            "y": found.offset.y,
            "score": found.score,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Offset: ({}, {})", found.offset.x, found.offset.y);
        println!("Score:  {:.6}", found.score);
    }
    Ok(())
}
