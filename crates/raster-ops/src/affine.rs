//! Affine resampling.
//!
//! The matrix maps **source** coordinates to **destination** coordinates.
//! Each destination pixel centre is mapped back through the inverse and
//! sampled from the source:
//!
//! - nearest neighbour for integer single-channel data and palette images
//!   (values stay exact, indices stay valid)
//! - bilinear for float, complex and colour data
//!
//! A destination pixel whose preimage falls outside the source gets the
//! background colour, or keeps its current value when no background is given
//! to [`affine_transform_into`].
//!
//! [`draw_image`] composes a fit-to-rectangle scale with a caller matrix and
//! writes only inside a destination sub-rectangle.

use crate::draw::colour_samples;
use crate::parallel::for_each_row;
use crate::transform::copy;
use crate::OpsResult;
use raster_core::{Error, PixelBuffer, PixelType, Rect, Rgba, encode_row};
use raster_math::{AffineMatrix, MatrixOrder};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Sampling used for a pixel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Nearest source pixel.
    Nearest,
    /// Bilinear blend of the four surrounding pixels.
    Bilinear,
}

impl Sampling {
    /// Sampling chosen for `pixel_type`.
    pub fn for_type(pixel_type: PixelType) -> Self {
        if pixel_type.is_colour() || pixel_type.is_float() || pixel_type.is_complex() {
            Sampling::Bilinear
        } else {
            Sampling::Nearest
        }
    }
}

/// Samples `src` at continuous `(sx, sy)` into `out`.
///
/// Returns false when the point lies outside the source.
fn sample_at(src: &PixelBuffer, sx: f64, sy: f64, sampling: Sampling, out: &mut [f64]) -> bool {
    let (w, h) = (src.width() as f64, src.height() as f64);
    if !(sx >= -0.5 && sy >= -0.5 && sx < w - 0.5 && sy < h - 0.5) {
        return false;
    }
    let channels = out.len();
    match sampling {
        Sampling::Nearest => {
            let x = (sx.round().max(0.0) as u32).min(src.width() - 1);
            let y = (sy.round().max(0.0) as u32).min(src.height() - 1);
            for (c, o) in out.iter_mut().enumerate() {
                *o = src.sample(x, y, c);
            }
        }
        Sampling::Bilinear => {
            let max_x = src.width() - 1;
            let max_y = src.height() - 1;
            let fx = sx.floor();
            let fy = sy.floor();
            let (tx, ty) = (sx - fx, sy - fy);
            let x0 = (fx.max(0.0) as u32).min(max_x);
            let y0 = (fy.max(0.0) as u32).min(max_y);
            let x1 = ((fx + 1.0).max(0.0) as u32).min(max_x);
            let y1 = ((fy + 1.0).max(0.0) as u32).min(max_y);
            for c in 0..channels {
                let top = src.sample(x0, y0, c) * (1.0 - tx) + src.sample(x1, y0, c) * tx;
                let bottom = src.sample(x0, y1, c) * (1.0 - tx) + src.sample(x1, y1, c) * tx;
                out[c] = top * (1.0 - ty) + bottom * ty;
            }
        }
    }
    true
}

/// Resamples `src` into a new `width` x `height` buffer filled with `background`.
///
/// # Errors
///
/// [`OpsError::Singular`](crate::OpsError::Singular) when `matrix` cannot be
/// inverted; allocation errors.
pub fn affine_transform(
    src: &PixelBuffer,
    width: u32,
    height: u32,
    matrix: &AffineMatrix,
    background: Rgba,
) -> OpsResult<PixelBuffer> {
    let mut dst = PixelBuffer::allocate(width, height, src.pixel_type())?;
    if let Some(p) = src.palette() {
        dst.set_palette(p.clone())?;
    }
    affine_transform_into(src, &mut dst, matrix, Some(background))?;
    Ok(dst)
}

/// Resamples `src` into an existing buffer.
///
/// With `background` of `None`, destination pixels outside the mapped
/// source keep their content.
///
/// # Errors
///
/// Format mismatch if the two buffers differ in pixel type, singular matrix.
pub fn affine_transform_into(
    src: &PixelBuffer,
    dst: &mut PixelBuffer,
    matrix: &AffineMatrix,
    background: Option<Rgba>,
) -> OpsResult<()> {
    src.ensure_same_format(dst)?;
    let clip = dst.bounds();
    resample(src, dst, matrix, background, clip)
}

/// Maps `src` through `matrix` into the `clip` area of `dst`.
fn resample(
    src: &PixelBuffer,
    dst: &mut PixelBuffer,
    matrix: &AffineMatrix,
    background: Option<Rgba>,
    clip: Rect,
) -> OpsResult<()> {
    let mut inverse = *matrix;
    inverse.invert()?;

    let pixel_type = src.pixel_type();
    let sampling = Sampling::for_type(pixel_type);
    let channels = src.channels();
    let width = dst.width();
    let fill = background.map(|c| colour_samples(pixel_type, c));
    debug!(?sampling, ?clip, retain = fill.is_none(), "affine transform");

    let (x0, x1) = (clip.left as u32, clip.right as u32);
    let (y0, y1) = (clip.top as u32, clip.bottom as u32);
    for_each_row(dst, |y, row| {
        if y < y0 || y > y1 {
            return;
        }
        let mut values = vec![0.0; width as usize * channels];
        raster_core::decode_row(pixel_type, row, &mut values);
        let mut px = vec![0.0; channels];
        for x in x0..=x1 {
            let (sx, sy) = inverse.transform_point(x as f64, y as f64);
            let out = &mut values[x as usize * channels..][..channels];
            if sample_at(src, sx, sy, sampling, &mut px) {
                out.copy_from_slice(&px);
            } else if let Some(fill) = &fill {
                out.copy_from_slice(fill);
            }
        }
        encode_row(pixel_type, &values, row);
    });
    Ok(())
}

/// Draws `src_rect` of `src` (all of it when `None`) into `dst_rect` of `dst`.
///
/// The source region is stretched to fill `dst_rect`, then `matrix` is
/// applied in the rectangle's own frame (origin at its top-left corner).
/// Only pixels inside `dst_rect` are written, and `dst_rect` is clipped to
/// the destination. Inside it, pixels whose preimage misses the source get
/// `background`, or keep their content when `background` is `None`.
///
/// # Errors
///
/// Format mismatch, a `src_rect` outside `src`, a `dst_rect` entirely
/// outside `dst`, or a singular `matrix`.
pub fn draw_image(
    dst: &mut PixelBuffer,
    src: &PixelBuffer,
    matrix: &AffineMatrix,
    dst_rect: &Rect,
    src_rect: Option<&Rect>,
    background: Option<Rgba>,
) -> OpsResult<()> {
    src.ensure_same_format(dst)?;
    let clip = dst_rect
        .clamp_to(dst.width(), dst.height())
        .ok_or_else(|| Error::invalid_region(*dst_rect, dst.width(), dst.height()))?;
    let region = match src_rect {
        Some(r) => copy(src, r)?,
        None => src.try_clone()?,
    };

    let kx = dst_rect.width() as f64 / region.width() as f64;
    let ky = dst_rect.height() as f64 / region.height() as f64;
    let mut m = AffineMatrix::identity();
    // Scale about pixel centres so edges line up with the rectangle
    m.translate(0.5, 0.5, MatrixOrder::Append)
        .scale(kx, ky, MatrixOrder::Append)
        .translate(-0.5, -0.5, MatrixOrder::Append)
        .multiply(matrix, MatrixOrder::Append)
        .translate(dst_rect.left as f64, dst_rect.top as f64, MatrixOrder::Append);
    trace!(kx, ky, ?dst_rect, "draw image");
    resample(&region, dst, &m, background, clip)
}

/// Rotates by `degrees` about the image centre, growing the canvas to fit.
///
/// Positive angles turn clockwise on screen (+X towards +Y with rows
/// running downwards).
pub fn rotate(src: &PixelBuffer, degrees: f64, background: Rgba) -> OpsResult<PixelBuffer> {
    let mut m = AffineMatrix::identity();
    m.rotate(degrees.to_radians(), MatrixOrder::Append);
    let bounds = m.bounding_rect(&src.bounds());
    m.translate(-bounds.left as f64, -bounds.top as f64, MatrixOrder::Append);
    debug!(degrees, width = bounds.width(), height = bounds.height(), "rotate");
    affine_transform(src, bounds.width(), bounds.height(), &m, background)
}
