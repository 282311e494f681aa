//! Pixel type conversion.
//!
//! # Overview
//!
//! Every conversion goes through [`conversion_route`], a table keyed by
//! `(source, target)` that names how pixels are carried across:
//!
//! | source \ target | single-channel | colour   | complex   |
//! |-----------------|----------------|----------|-----------|
//! | single-channel  | `Scalar`       | `Expand` | `ToComplex` |
//! | colour          | `Luma`         | `Channels` | -       |
//! | complex         | `Magnitude`    | -        | `Copy`    |
//!
//! Pairs marked `-` fail with [`Error::UnsupportedConversion`].
//!
//! # Scaling
//!
//! Without scaling, values are carried as-is and saturate at the target's
//! limits. With scaling, the source's natural range (full integer range,
//! `[0, 1]` for floats) maps linearly onto the target's. Complex sources have
//! no natural range; their magnitude range found in the image is used.
//!
//! # Example
//!
//! ```rust
//! use raster_core::{PixelBuffer, PixelType};
//! use raster_ops::convert::convert_to_type;
//!
//! let mut src = PixelBuffer::allocate(4, 4, PixelType::U8)?;
//! src.set_sample(1, 1, 0, 255.0);
//! let f = convert_to_type(&src, PixelType::F32, true)?;
//! assert_eq!(f.sample(1, 1, 0), 1.0);
//! let back = convert_to_type(&f, PixelType::U8, true)?;
//! assert_eq!(back, src);
//! # Ok::<(), raster_ops::OpsError>(())
//! ```

use crate::parallel::for_each_row;
use crate::stats::find_min_max;
use crate::{OpsError, OpsResult};
use raster_core::{Error, Palette, PixelBuffer, PixelType, decode_row, encode_row, luminance_rec709};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// How pixels travel between two pixel types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionRoute {
    /// Same type, bytes are copied.
    Copy,
    /// Single channel to single channel.
    Scalar,
    /// Single channel replicated to R, G, B (through the palette for `U8`).
    Expand,
    /// Colour reduced to Rec. 709 luminance.
    Luma,
    /// Colour to colour, channel by channel; alpha added opaque or dropped.
    Channels,
    /// Complex reduced to its magnitude.
    Magnitude,
    /// Single channel stored as the real part.
    ToComplex,
}

/// Looks up the conversion table.
///
/// Returns `None` for pairs that have no meaningful conversion.
pub fn conversion_route(from: PixelType, to: PixelType) -> Option<ConversionRoute> {
    use ConversionRoute::*;
    let route = match (from, to) {
        (f, t) if f == t => Copy,
        (PixelType::Complex, t) if t.is_colour() => return None,
        (f, PixelType::Complex) if f.is_colour() => return None,
        (PixelType::Complex, _) => Magnitude,
        (_, PixelType::Complex) => ToComplex,
        (f, t) if f.is_colour() && t.is_colour() => Channels,
        (f, _) if f.is_colour() => Luma,
        (_, t) if t.is_colour() => Expand,
        _ => Scalar,
    };
    Some(route)
}

/// Returns true if [`convert_to_type`] accepts the pair.
#[inline]
pub fn can_convert(from: PixelType, to: PixelType) -> bool {
    conversion_route(from, to).is_some()
}

/// `v * gain + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Linear {
    pub(crate) gain: f64,
    pub(crate) offset: f64,
}

impl Linear {
    pub(crate) const IDENTITY: Self = Self {
        gain: 1.0,
        offset: 0.0,
    };

    /// Maps `[src_lo, src_hi]` onto `[dst_lo, dst_hi]`.
    pub(crate) fn between(src: (f64, f64), dst: (f64, f64)) -> Self {
        let span = src.1 - src.0;
        if span.abs() < f64::EPSILON {
            return Self::IDENTITY;
        }
        let gain = (dst.1 - dst.0) / span;
        Self {
            gain,
            offset: dst.0 - src.0 * gain,
        }
    }

    #[inline]
    pub(crate) fn apply(&self, v: f64) -> f64 {
        v * self.gain + self.offset
    }
}

/// Value map used by a scaled conversion.
fn scaling_for(src: &PixelBuffer, target: PixelType) -> Linear {
    let src_range = match src.pixel_type().natural_range() {
        Some(r) => r,
        None => find_min_max(src),
    };
    match target.natural_range() {
        Some(dst_range) => Linear::between(src_range, dst_range),
        None => Linear::IDENTITY,
    }
}

/// Converts to `target`, optionally rescaling values.
///
/// # Errors
///
/// [`Error::UnsupportedConversion`] for pairs missing from the conversion
/// table, allocation errors for the new buffer.
pub fn convert_to_type(src: &PixelBuffer, target: PixelType, scale: bool) -> OpsResult<PixelBuffer> {
    let map = if scale {
        scaling_for(src, target)
    } else {
        Linear::IDENTITY
    };
    convert_with(src, target, map)
}

/// Core conversion with an explicit value map.
pub(crate) fn convert_with(src: &PixelBuffer, target: PixelType, map: Linear) -> OpsResult<PixelBuffer> {
    let from = src.pixel_type();
    let route = conversion_route(from, target).ok_or(Error::unsupported_conversion(from, target))?;
    debug!(%from, %target, ?route, width = src.width(), height = src.height(), "convert");

    if route == ConversionRoute::Copy && map == Linear::IDENTITY {
        return Ok(src.try_clone()?);
    }

    let mut dst = PixelBuffer::allocate(src.width(), src.height(), target)?;
    let width = src.width() as usize;
    let sc = from.channels();
    let dc = target.channels();
    // Palette lookup only matters when it is not the identity ramp
    let palette: Option<Palette> = src.palette().filter(|p| !p.is_linear_greyscale()).cloned();
    let opaque = target.natural_range().map_or(1.0, |r| r.1);

    for_each_row(&mut dst, |y, out_bytes| {
        let mut input = vec![0.0; width * sc];
        let mut output = vec![0.0; width * dc];
        decode_row(from, src.row(y), &mut input);

        for (px, out) in input.chunks_exact(sc).zip(output.chunks_exact_mut(dc)) {
            match route {
                ConversionRoute::Copy => {
                    for (o, &v) in out.iter_mut().zip(px) {
                        *o = map.apply(v);
                    }
                }
                ConversionRoute::Scalar => out[0] = map.apply(px[0]),
                ConversionRoute::Magnitude => out[0] = map.apply(px[0].hypot(px[1])),
                ConversionRoute::ToComplex => {
                    out[0] = map.apply(px[0]);
                    out[1] = 0.0;
                }
                ConversionRoute::Luma => out[0] = map.apply(luminance_rec709(px[0], px[1], px[2])),
                ConversionRoute::Expand => {
                    let (rgb, alpha) = match &palette {
                        Some(p) => {
                            let c = p.get(px[0].clamp(0.0, 255.0) as u8);
                            (
                                [c.r as f64, c.g as f64, c.b as f64],
                                Some(map.apply(c.a as f64)),
                            )
                        }
                        None => ([px[0]; 3], None),
                    };
                    for c in 0..3 {
                        out[c] = map.apply(rgb[c]);
                    }
                    if dc == 4 {
                        out[3] = alpha.unwrap_or(opaque);
                    }
                }
                ConversionRoute::Channels => {
                    for c in 0..3 {
                        out[c] = map.apply(px[c]);
                    }
                    if dc == 4 {
                        out[3] = if sc == 4 { map.apply(px[3]) } else { opaque };
                    }
                }
            }
        }
        encode_row(target, &output, out_bytes);
    });

    Ok(dst)
}

/// Display type closest to `pixel_type`.
///
/// Single-channel and complex map to `U8`, colour to `Rgb8` or `Rgba8`.
pub fn standard_type_for(pixel_type: PixelType) -> PixelType {
    match pixel_type {
        t if t.is_colour() && t.has_alpha() => PixelType::Rgba8,
        t if t.is_colour() => PixelType::Rgb8,
        _ => PixelType::U8,
    }
}

/// Converts to the nearest display type.
///
/// Standard buffers are copied. Colour always maps natural range to natural
/// range (16-bit drops the low byte, float multiplies by 255). Single-channel
/// data with `scale` stretches the min/max found in the image onto `0..=255`;
/// without it values are clamped.
pub fn convert_to_standard_type(src: &PixelBuffer, scale: bool) -> OpsResult<PixelBuffer> {
    let from = src.pixel_type();
    if from.is_standard() {
        return Ok(src.try_clone()?);
    }
    let target = standard_type_for(from);
    let map = if from.is_colour() {
        scaling_for(src, target)
    } else if scale {
        Linear::between(find_min_max(src), (0.0, 255.0))
    } else {
        Linear::IDENTITY
    };
    convert_with(src, target, map)
}

/// Standard buffer plus the range found in the source.
#[derive(Debug, Clone)]
pub struct ScaledConversion {
    /// Converted buffer.
    pub buffer: PixelBuffer,
    /// Smallest value found in the source.
    pub min_found: f64,
    /// Largest value found in the source.
    pub max_found: f64,
}

/// Maps the window `[min, max]` onto `0..=255`.
///
/// Values below `min` become 0, values above `max` become 255. When both
/// `min` and `max` are (nearly) zero, the range found in the image is used.
/// A degenerate window falls back to a clamped conversion.
pub fn linear_scale_to_standard_type(src: &PixelBuffer, min: f64, max: f64) -> OpsResult<ScaledConversion> {
    let (min_found, max_found) = find_min_max(src);
    let (lo, hi) = if min.abs() < 1e-4 && max.abs() < 1e-4 {
        (min_found, max_found)
    } else {
        (min, max)
    };
    if hi < lo {
        return Err(OpsError::invalid_parameter(format!(
            "window max {hi} is below min {lo}"
        )));
    }
    debug!(lo, hi, min_found, max_found, "linear scale to standard type");

    let target = standard_type_for(src.pixel_type());
    let map = if hi > lo {
        Linear::between((lo, hi), (0.0, 255.0))
    } else {
        Linear::IDENTITY
    };
    // Standard sources go through the same path so the window still applies
    let buffer = convert_with(src, target, map)?;
    Ok(ScaledConversion {
        buffer,
        min_found,
        max_found,
    })
}

/// Converts to 8-bit greyscale, scaling from the natural range.
pub fn convert_to_8bits(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    convert_to_type(src, PixelType::U8, true)
}

/// Converts to 24-bit RGB, scaling from the natural range.
pub fn convert_to_24bits(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    convert_to_type(src, PixelType::Rgb8, true)
}

/// Converts to 32-bit RGBA, scaling from the natural range.
pub fn convert_to_32bits(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    convert_to_type(src, PixelType::Rgba8, true)
}

/// Reduces colour to Rec. 709 luminance with the same sample encoding.
///
/// Single-channel buffers are copied unchanged.
pub fn convert_to_greyscale(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    let target = src.pixel_type().greyscale_equivalent();
    convert_to_type(src, target, false)
}

/// Shifts signed 16-bit data by 32768 into `U16`.
///
/// # Errors
///
/// [`Error::UnsupportedPixelType`] unless the source is `I16`.
pub fn convert_int16_to_uint16(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    if src.pixel_type() != PixelType::I16 {
        return Err(Error::unsupported_pixel_type(src.pixel_type(), "int16 to uint16").into());
    }
    convert_with(
        src,
        PixelType::U16,
        Linear {
            gain: 1.0,
            offset: 32768.0,
        },
    )
}
