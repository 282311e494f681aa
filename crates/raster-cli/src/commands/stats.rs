//! Statistics command.

use crate::StatsArgs;
use anyhow::Result;
use raster_ops::stats::statistics_report;
use raster_ops::transform::copy;

/// Runs the stats command.
pub fn run(args: StatsArgs) -> Result<()> {
    let mut image = super::load_image(&args.input)?;
    if let Some(region) = &args.region {
        image = copy(&image, &super::parse_rect(region)?)?;
    }
    let report = statistics_report(&image);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("{}", args.input.display());
    println!("  Area:        {}", report.area);
    println!("  Min:         {:.6}", report.min);
    println!("  Max:         {:.6}", report.max);
    println!("  Mean:        {:.6}", report.mean);
    println!("  Std dev:     {:.6}", report.std_deviation);
    println!("  Overloaded:  {:.3}%", report.percentage_overloaded);
    println!("  Underloaded: {:.3}%", report.percentage_underloaded);
    Ok(())
}
