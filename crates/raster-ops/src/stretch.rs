//! Linear stretches of greyscale data.

use crate::convert::{Linear, convert_with};
use crate::stats::{find_min_max, max_possible_value};
use crate::{OpsError, OpsResult};
use raster_core::{Error, PixelBuffer, PixelType};
#[allow(unused_imports)]
use tracing::{debug, trace};

fn ensure_greyscale(t: PixelType, operation: &'static str) -> OpsResult<()> {
    if t.channels() != 1 {
        return Err(Error::unsupported_pixel_type(t, operation).into());
    }
    Ok(())
}

/// Converts to `target`, scaling so the brightest pixel lands on `max`.
///
/// Every sample is multiplied by `max / brightest`. A `max` of zero uses
/// the largest value `target` can hold. An all-zero image stays zero.
///
/// # Errors
///
/// Both the source and `target` must be single-channel, non-complex types.
pub fn stretch_to_type(src: &PixelBuffer, target: PixelType, max: f64) -> OpsResult<PixelBuffer> {
    ensure_greyscale(src.pixel_type(), "stretch")?;
    ensure_greyscale(target, "stretch")?;
    let max = if max == 0.0 {
        max_possible_value(target).ok_or_else(|| Error::unsupported_pixel_type(target, "stretch"))?
    } else {
        max
    };
    let (_, brightest) = find_min_max(src);
    let gain = if brightest == 0.0 { 0.0 } else { max / brightest };
    debug!(%target, max, gain, "stretch to type");
    convert_with(src, target, Linear { gain, offset: 0.0 })
}

/// Maps the found `[min, max]` of `src` onto `[dst_min, dst_max]`, keeping
/// the pixel type.
///
/// A flat image maps entirely to `dst_min`.
pub fn stretch_across_range(src: &PixelBuffer, dst_min: f64, dst_max: f64) -> OpsResult<PixelBuffer> {
    ensure_greyscale(src.pixel_type(), "stretch")?;
    if dst_min >= dst_max {
        return Err(OpsError::invalid_parameter(format!(
            "empty target range {dst_min}..{dst_max}"
        )));
    }
    let (lo, hi) = find_min_max(src);
    let map = if hi > lo {
        Linear::between((lo, hi), (dst_min, dst_max))
    } else {
        Linear { gain: 0.0, offset: dst_min }
    };
    convert_with(src, src.pixel_type(), map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn row(pixel_type: PixelType, values: &[f64]) -> PixelBuffer {
        let mut buf = PixelBuffer::allocate(values.len() as u32, 1, pixel_type).unwrap();
        buf.write_row(0, values);
        buf
    }

    #[test]
    fn test_stretch_to_type_default_max() {
        let src = row(PixelType::U8, &[0.0, 50.0, 100.0]);
        let out = stretch_to_type(&src, PixelType::U16, 0.0).unwrap();
        assert_eq!(out.pixel_type(), PixelType::U16);
        assert_eq!(out.sample(2, 0, 0), 65535.0);
        assert_abs_diff_eq!(out.sample(1, 0, 0), 32768.0, epsilon = 1.0);
    }

    #[test]
    fn test_stretch_to_type_explicit_max() {
        let src = row(PixelType::F32, &[1.0, 4.0]);
        let out = stretch_to_type(&src, PixelType::F64, 2.0).unwrap();
        assert_abs_diff_eq!(out.sample(0, 0, 0), 0.5);
        assert_abs_diff_eq!(out.sample(1, 0, 0), 2.0);
        assert!(stretch_to_type(&src, PixelType::Rgb8, 1.0).is_err());
    }

    #[test]
    fn test_stretch_across_range() {
        let src = row(PixelType::I16, &[-10.0, 0.0, 10.0]);
        let out = stretch_across_range(&src, 0.0, 100.0).unwrap();
        assert_eq!(out.pixel_type(), PixelType::I16);
        let mut v = [0.0; 3];
        out.read_row(0, &mut v);
        assert_eq!(v, [0.0, 50.0, 100.0]);
        assert!(stretch_across_range(&src, 5.0, 5.0).is_err());
    }

    #[test]
    fn test_stretch_flat() {
        let src = row(PixelType::U8, &[7.0, 7.0]);
        let out = stretch_across_range(&src, 20.0, 40.0).unwrap();
        assert_eq!(out.row(0), &[20, 20]);
    }
}
