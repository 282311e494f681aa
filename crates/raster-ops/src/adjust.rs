//! Point-wise tone adjustments.
//!
//! Every adjustment works in place on the colour samples of a buffer,
//! relative to the type's natural range (`0..=255` for 8-bit, `0..=1` for
//! float). Alpha is never touched. Complex buffers are rejected.
//!
//! - [`adjust_gamma`] - power curve, `gamma > 1` brightens midtones
//! - [`adjust_brightness`] - shift by a percentage of the range
//! - [`adjust_contrast`] - stretch about the middle of the range
//! - [`invert`] - mirror within the range
//! - [`threshold`] - replace a band of values
//! - [`histogram_equalize`] - flatten the histogram of a `U8` image

use crate::parallel::for_each_row;
use crate::{OpsError, OpsResult};
use raster_core::{Error, PixelBuffer, PixelType, decode_row, encode_row};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Range and colour-channel count the adjustments operate on.
fn tone_range(buf: &PixelBuffer, operation: &'static str) -> OpsResult<(f64, f64, usize)> {
    let t = buf.pixel_type();
    let (lo, hi) = t
        .natural_range()
        .ok_or_else(|| Error::unsupported_pixel_type(t, operation))?;
    let colour = if t.has_alpha() { t.channels() - 1 } else { t.channels() };
    Ok((lo, hi, colour))
}

/// Applies `f` to every colour sample.
fn map_samples<F>(buf: &mut PixelBuffer, colour: usize, f: F)
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    let pixel_type = buf.pixel_type();
    let channels = pixel_type.channels();
    let n = buf.width() as usize * channels;
    for_each_row(buf, |_, row| {
        let mut values = vec![0.0; n];
        decode_row(pixel_type, row, &mut values);
        for px in values.chunks_exact_mut(channels) {
            for v in &mut px[..colour] {
                *v = f(*v);
            }
        }
        encode_row(pixel_type, &values, row);
    });
}

/// Power-law curve: `v = lo + (hi - lo) * t^(1 / gamma)`.
///
/// # Errors
///
/// `gamma` must be positive and finite.
pub fn adjust_gamma(buf: &mut PixelBuffer, gamma: f64) -> OpsResult<()> {
    if !(gamma > 0.0 && gamma.is_finite()) {
        return Err(OpsError::invalid_parameter(format!("gamma must be positive, got {gamma}")));
    }
    let (lo, hi, colour) = tone_range(buf, "gamma")?;
    debug!(gamma, "adjust gamma");
    let exp = 1.0 / gamma;
    let span = hi - lo;
    map_samples(buf, colour, move |v| {
        let t = ((v - lo) / span).clamp(0.0, 1.0);
        lo + span * t.powf(exp)
    });
    Ok(())
}

/// Adds `percent` (-100..=100) of the range to every sample.
pub fn adjust_brightness(buf: &mut PixelBuffer, percent: f64) -> OpsResult<()> {
    if !(-100.0..=100.0).contains(&percent) {
        return Err(OpsError::invalid_parameter(format!("brightness {percent}% outside -100..=100")));
    }
    let (lo, hi, colour) = tone_range(buf, "brightness")?;
    let shift = (hi - lo) * percent / 100.0;
    let float = buf.pixel_type().is_float();
    map_samples(buf, colour, move |v| {
        let v = v + shift;
        if float { v } else { v.clamp(lo, hi) }
    });
    Ok(())
}

/// Scales the distance from mid-range by `1 + percent / 100`.
///
/// `percent` runs from -100 (flat grey) upwards.
pub fn adjust_contrast(buf: &mut PixelBuffer, percent: f64) -> OpsResult<()> {
    if !(percent >= -100.0 && percent.is_finite()) {
        return Err(OpsError::invalid_parameter(format!("contrast {percent}% below -100")));
    }
    let (lo, hi, colour) = tone_range(buf, "contrast")?;
    let mid = (lo + hi) / 2.0;
    let k = 1.0 + percent / 100.0;
    let float = buf.pixel_type().is_float();
    map_samples(buf, colour, move |v| {
        let v = mid + (v - mid) * k;
        if float { v } else { v.clamp(lo, hi) }
    });
    Ok(())
}

/// Mirrors samples within the natural range (`lo + hi - v`).
pub fn invert(buf: &mut PixelBuffer) -> OpsResult<()> {
    let (lo, hi, colour) = tone_range(buf, "invert")?;
    map_samples(buf, colour, move |v| lo + hi - v);
    Ok(())
}

/// Sets every sample within `min..=max` to `new_value`.
///
/// # Errors
///
/// Single-channel, non-complex buffers only.
pub fn threshold(buf: &mut PixelBuffer, min: f64, max: f64, new_value: f64) -> OpsResult<()> {
    let t = buf.pixel_type();
    if t.channels() != 1 {
        return Err(Error::unsupported_pixel_type(t, "threshold").into());
    }
    trace!(min, max, new_value, "threshold");
    map_samples(buf, 1, move |v| if v >= min && v <= max { new_value } else { v });
    Ok(())
}

/// Histogram equalization of an 8-bit greyscale image.
///
/// Each level maps to its cumulative count divided by `area / 255`,
/// rounded. The result carries a grey palette.
pub fn histogram_equalize(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    if src.pixel_type() != PixelType::U8 {
        return Err(Error::unsupported_pixel_type(src.pixel_type(), "histogram equalization").into());
    }
    let mut counts = [0u64; 256];
    for row in src.rows() {
        for &v in row {
            counts[v as usize] += 1;
        }
    }
    let per_level = src.width() as f64 * src.height() as f64 / 255.0;
    let mut mapping = [0u8; 256];
    let mut running = 0u64;
    for (m, &c) in mapping.iter_mut().zip(&counts) {
        running += c;
        *m = (running as f64 / per_level).round().min(255.0) as u8;
    }

    let mut dst = PixelBuffer::allocate(src.width(), src.height(), PixelType::U8)?;
    for y in 0..src.height() {
        for (d, &s) in dst.row_mut(y).iter_mut().zip(src.row(y)) {
            *d = mapping[s as usize];
        }
    }
    Ok(dst)
}
