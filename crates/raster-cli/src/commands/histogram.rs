//! Histogram command.
//!
//! Colour images get one histogram per channel.

use crate::HistogramArgs;
use anyhow::{Context, Result};
use raster_ops::stats::{Histogram, histogram_range, max_possible_value, rgb_histogram};

/// Runs the histogram command.
pub fn run(args: HistogramArgs) -> Result<()> {
    let image = super::load_image(&args.input)?;
    let pixel_type = image.pixel_type();
    let min = args.min.unwrap_or(0.0);
    let max = match args.max {
        Some(m) => m,
        None => max_possible_value(pixel_type)
            .with_context(|| format!("{pixel_type} has no maximum; pass --max"))?,
    };

    if pixel_type.is_colour() {
        let h = rgb_histogram(&image, min, max, args.bins)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&h)?);
        } else {
            print_table(&[("red", &h.red), ("green", &h.green), ("blue", &h.blue)]);
        }
    } else {
        let h = histogram_range(&image, min, max, args.bins)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&h)?);
        } else {
            print_table(&[("value", &h)]);
        }
    }
    Ok(())
}

fn print_table(columns: &[(&str, &Histogram)]) {
    let first = columns[0].1;
    print!("{:>12}", "bin start");
    for (name, _) in columns {
        print!("{name:>10}");
    }
    println!();
    for bin in 0..first.bins() {
        print!("{:>12.4}", first.min + bin as f64 * first.range_per_bin());
        for (_, h) in columns {
            print!("{:>10}", h.counts[bin]);
        }
        println!();
    }
}
