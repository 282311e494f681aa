//! Buffer rescaling with separable filters.
//!
//! # Filters
//!
//! | Filter | Support | Notes |
//! |--------|---------|-------|
//! | [`Filter::Box`] | 0.5 | Pixel averaging, exact copy at 1:1 |
//! | [`Filter::BiLinear`] | 1.0 | Triangle |
//! | [`Filter::BiCubic`] | 2.0 | Mitchell-Netravali, B = C = 1/3 |
//! | [`Filter::BSpline`] | 2.0 | Cubic B-spline, B = 1, C = 0 (smoothest) |
//! | [`Filter::CatmullRom`] | 2.0 | B = 0, C = 1/2 (interpolating) |
//! | [`Filter::Lanczos3`] | 3.0 | Windowed sinc, sharpest |
//!
//! Support is in source pixels at 1:1 and widens with the reduction factor
//! when downscaling.
//!
//! # Example
//!
//! ```rust
//! use enough::Unstoppable;
//! use raster_core::{PixelBuffer, PixelType};
//! use raster_ops::resize::{rescale, Filter};
//!
//! let src = PixelBuffer::allocate(64, 64, PixelType::Rgb8)?;
//! let dst = rescale(&src, 128, 32, Filter::Lanczos3, &Unstoppable)?;
//! assert_eq!(dst.dimensions(), (128, 32));
//! # Ok::<(), raster_ops::OpsError>(())
//! ```

use crate::parallel::{ROW_BLOCK, for_each_row_checked};
use crate::{OpsError, OpsResult};
use enough::Stop;
use raster_core::{PixelBuffer, decode_row, encode_row};
use std::fmt;
use std::str::FromStr;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Resampling filter for [`rescale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Filter {
    /// Box (pixel averaging).
    Box,
    /// Bilinear (triangle).
    BiLinear,
    /// Mitchell-Netravali bicubic.
    #[default]
    BiCubic,
    /// Cubic B-spline.
    BSpline,
    /// Catmull-Rom spline.
    CatmullRom,
    /// Lanczos with three lobes.
    Lanczos3,
}

impl Filter {
    /// All filters in declaration order.
    pub const ALL: [Filter; 6] = [
        Filter::Box,
        Filter::BiLinear,
        Filter::BiCubic,
        Filter::BSpline,
        Filter::CatmullRom,
        Filter::Lanczos3,
    ];

    /// Returns the support radius for this filter.
    #[inline]
    pub fn support(&self) -> f64 {
        match self {
            Filter::Box => 0.5,
            Filter::BiLinear => 1.0,
            Filter::BiCubic | Filter::BSpline | Filter::CatmullRom => 2.0,
            Filter::Lanczos3 => 3.0,
        }
    }

    /// Evaluates the filter kernel at position x.
    #[inline]
    pub fn weight(&self, x: f64) -> f64 {
        match self {
            Filter::Box => box_weight(x),
            Filter::BiLinear => bilinear_weight(x),
            Filter::BiCubic => cubic_weight(x, 1.0 / 3.0, 1.0 / 3.0),
            Filter::BSpline => cubic_weight(x, 1.0, 0.0),
            Filter::CatmullRom => cubic_weight(x, 0.0, 0.5),
            Filter::Lanczos3 => lanczos_weight(x, 3.0),
        }
    }

    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Box => "box",
            Filter::BiLinear => "bilinear",
            Filter::BiCubic => "bicubic",
            Filter::BSpline => "bspline",
            Filter::CatmullRom => "catmullrom",
            Filter::Lanczos3 => "lanczos3",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "box" | "nearest" => Ok(Filter::Box),
            "bilinear" | "linear" | "triangle" => Ok(Filter::BiLinear),
            "bicubic" | "cubic" | "mitchell" => Ok(Filter::BiCubic),
            "bspline" | "b-spline" => Ok(Filter::BSpline),
            "catmullrom" | "catmull-rom" => Ok(Filter::CatmullRom),
            "lanczos3" | "lanczos" => Ok(Filter::Lanczos3),
            _ => Err(OpsError::invalid_parameter(format!("unknown filter '{s}'"))),
        }
    }
}

/// Box weight function, half-open on the right.
#[inline]
fn box_weight(x: f64) -> f64 {
    if (-0.5..0.5).contains(&x) { 1.0 } else { 0.0 }
}

/// Bilinear (triangle) weight function.
#[inline]
fn bilinear_weight(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 1.0 { 1.0 - ax } else { 0.0 }
}

/// Mitchell-Netravali family of cubics.
#[inline]
fn cubic_weight(x: f64, b: f64, c: f64) -> f64 {
    let ax = x.abs();
    if ax < 1.0 {
        ((12.0 - 9.0 * b - 6.0 * c) * ax * ax * ax
            + (-18.0 + 12.0 * b + 6.0 * c) * ax * ax
            + (6.0 - 2.0 * b))
            / 6.0
    } else if ax < 2.0 {
        ((-b - 6.0 * c) * ax * ax * ax
            + (6.0 * b + 30.0 * c) * ax * ax
            + (-12.0 * b - 48.0 * c) * ax
            + (8.0 * b + 24.0 * c))
            / 6.0
    } else {
        0.0
    }
}

/// Lanczos weight function.
#[inline]
fn lanczos_weight(x: f64, a: f64) -> f64 {
    let ax = x.abs();
    if ax < 1e-8 {
        1.0
    } else if ax < a {
        let pi_x = std::f64::consts::PI * ax;
        let pi_x_a = pi_x / a;
        (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
    } else {
        0.0
    }
}

/// Normalized weights of one destination sample.
#[derive(Debug, Clone)]
struct Contribution {
    first: usize,
    weights: Vec<f64>,
}

/// Builds the weight table mapping `dst_len` samples onto `src_len`.
fn contributions(src_len: usize, dst_len: usize, filter: Filter) -> Vec<Contribution> {
    let scale = src_len as f64 / dst_len as f64;
    let widen = scale.max(1.0);
    let support = filter.support() * widen;

    (0..dst_len)
        .map(|x| {
            // Map destination x to source x
            let center = (x as f64 + 0.5) * scale - 0.5;
            let left = ((center - support).floor().max(0.0)) as usize;
            let right = ((center + support).ceil() as usize).min(src_len - 1);

            let mut weights: Vec<f64> = (left..=right)
                .map(|sx| filter.weight((sx as f64 - center) / widen))
                .collect();
            let sum: f64 = weights.iter().sum();
            if sum.abs() > 1e-12 {
                weights.iter_mut().for_each(|w| *w /= sum);
                Contribution { first: left, weights }
            } else {
                // Kernel missed every sample; fall back to the nearest one
                let nearest = (center.round().max(0.0) as usize).min(src_len - 1);
                Contribution {
                    first: nearest,
                    weights: vec![1.0],
                }
            }
        })
        .collect()
}

/// Rescales to `width` x `height`.
///
/// Works on every pixel type; channels are filtered independently and the
/// result is rounded and saturated for integer types. A `U8` palette is
/// carried over unchanged. The stop token is checked between row blocks of
/// both passes.
///
/// # Errors
///
/// [`OpsError::InvalidParameter`] for a zero target size,
/// [`OpsError::Cancelled`] when `stop` fires.
pub fn rescale(
    src: &PixelBuffer,
    width: u32,
    height: u32,
    filter: Filter,
    stop: &dyn Stop,
) -> OpsResult<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(OpsError::invalid_parameter(format!(
            "target size {width}x{height} must be > 0"
        )));
    }
    debug!(
        from_w = src.width(),
        from_h = src.height(),
        width,
        height,
        %filter,
        "rescale"
    );

    let pixel_type = src.pixel_type();
    let channels = src.channels();
    let (src_w, src_h) = (src.width() as usize, src.height() as usize);
    let (dst_w, dst_h) = (width as usize, height as usize);

    // Horizontal pass into an f64 intermediate of dst_w x src_h
    let columns = contributions(src_w, dst_w, filter);
    let mut temp = vec![0.0f64; dst_w * src_h * channels];
    let mut row = vec![0.0f64; src_w * channels];
    for (y, out) in temp.chunks_exact_mut(dst_w * channels).enumerate() {
        if y as u32 % ROW_BLOCK == 0 {
            stop.check()?;
        }
        decode_row(pixel_type, src.row(y as u32), &mut row);
        for (x, contrib) in columns.iter().enumerate() {
            let dst_px = &mut out[x * channels..(x + 1) * channels];
            for (k, &w) in contrib.weights.iter().enumerate() {
                let src_px = &row[(contrib.first + k) * channels..][..channels];
                for c in 0..channels {
                    dst_px[c] += src_px[c] * w;
                }
            }
        }
    }

    // Vertical pass straight into the destination rows
    let rows = contributions(src_h, dst_h, filter);
    let mut dst = PixelBuffer::allocate(width, height, pixel_type)?;
    if let Some(palette) = src.palette() {
        dst.set_palette(palette.clone())?;
    }
    let line = dst_w * channels;
    for_each_row_checked(&mut dst, stop, |y, out_bytes| {
        let contrib = &rows[y as usize];
        let mut acc = vec![0.0f64; line];
        for (k, &w) in contrib.weights.iter().enumerate() {
            let src_row = &temp[(contrib.first + k) * line..][..line];
            for (a, &v) in acc.iter_mut().zip(src_row) {
                *a += v * w;
            }
        }
        encode_row(pixel_type, &acc, out_bytes);
    })?;

    Ok(dst)
}

/// Calculates the aspect-preserving dimensions for a target size.
///
/// # Example
///
/// ```rust
/// use raster_ops::resize::fit_dimensions;
///
/// // Fit 1920x1080 into 640x480 box
/// let (w, h) = fit_dimensions(1920, 1080, 640, 480);
/// assert_eq!((w, h), (640, 360));
/// ```
pub fn fit_dimensions(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let scale_w = max_w as f64 / src_w as f64;
    let scale_h = max_h as f64 / src_h as f64;
    let scale = scale_w.min(scale_h);

    let new_w = ((src_w as f64 * scale).round() as u32).max(1);
    let new_h = ((src_h as f64 * scale).round() as u32).max(1);

    (new_w, new_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use enough::{StopReason, Unstoppable};
    use raster_core::PixelType;

    struct AlwaysStop;

    impl Stop for AlwaysStop {
        fn check(&self) -> Result<(), StopReason> {
            Err(StopReason::Cancelled)
        }
    }

    #[test]
    fn test_filter_weights() {
        for f in Filter::ALL {
            assert_abs_diff_eq!(f.weight(0.0), if f == Filter::BSpline { 2.0 / 3.0 } else { 1.0 }, epsilon = 1e-9);
            assert_eq!(f.weight(f.support() + 0.01), 0.0);
        }
        assert_abs_diff_eq!(Filter::BiLinear.weight(0.5), 0.5);
        // Interpolating cubics vanish at integer offsets
        assert_abs_diff_eq!(Filter::CatmullRom.weight(1.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(Filter::Lanczos3.weight(2.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("Lanczos3".parse::<Filter>().unwrap(), Filter::Lanczos3);
        assert_eq!("catmull-rom".parse::<Filter>().unwrap(), Filter::CatmullRom);
        assert!("sinc".parse::<Filter>().is_err());
    }

    #[test]
    fn test_same_size_is_identity() {
        let mut src = PixelBuffer::allocate(7, 5, PixelType::U8).unwrap();
        for y in 0..5 {
            for x in 0..7 {
                src.set_sample(x, y, 0, (x * 30 + y) as f64);
            }
        }
        for f in [Filter::Box, Filter::BiLinear, Filter::CatmullRom, Filter::Lanczos3] {
            let out = rescale(&src, 7, 5, f, &Unstoppable).unwrap();
            assert_eq!(out.raw_bytes(), src.raw_bytes(), "filter {f}");
        }
    }

    #[test]
    fn test_constant_stays_constant() {
        let mut src = PixelBuffer::allocate(16, 16, PixelType::Rgb16).unwrap();
        src.raw_bytes_mut()
            .chunks_exact_mut(2)
            .for_each(|s| s.copy_from_slice(&1000u16.to_ne_bytes()));
        for f in Filter::ALL {
            let out = rescale(&src, 9, 23, f, &Unstoppable).unwrap();
            for y in 0..23 {
                for x in 0..9 {
                    assert_eq!(out.sample(x, y, 2), 1000.0);
                }
            }
        }
    }

    #[test]
    fn test_box_downscale_averages() {
        let mut src = PixelBuffer::allocate(4, 1, PixelType::F32).unwrap();
        for (x, v) in [0.0, 1.0, 2.0, 3.0].into_iter().enumerate() {
            src.set_sample(x as u32, 0, 0, v);
        }
        let out = rescale(&src, 2, 1, Filter::Box, &Unstoppable).unwrap();
        assert_abs_diff_eq!(out.sample(0, 0, 0), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out.sample(1, 0, 0), 2.5, epsilon = 1e-6);
    }

    #[test]
    fn test_palette_kept_and_zero_size_rejected() {
        let src = PixelBuffer::allocate(4, 4, PixelType::U8).unwrap();
        let out = rescale(&src, 8, 8, Filter::BiLinear, &Unstoppable).unwrap();
        assert!(out.palette().is_some());
        assert!(rescale(&src, 0, 8, Filter::BiLinear, &Unstoppable).is_err());
    }

    #[test]
    fn test_cancelled() {
        let src = PixelBuffer::allocate(32, 32, PixelType::U8).unwrap();
        let err = rescale(&src, 16, 16, Filter::BiCubic, &AlwaysStop).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_fit_dimensions() {
        assert_eq!(fit_dimensions(1920, 1080, 640, 640), (640, 360));
        assert_eq!(fit_dimensions(1080, 1920, 640, 640), (360, 640));
    }
}
