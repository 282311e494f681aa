//! Pasting and gradient-blended compositing.
//!
//! # Overview
//!
//! All positions are top-left origins in the destination's pixel grid.
//! Both buffers must share a pixel type; the overlap is clipped to the
//! destination.
//!
//! - [`paste`] - copy or blend with a constant alpha
//! - [`paste_from_top_left`] - clipped copy
//! - [`simple_paste`] - unclipped copy, source must fit
//! - [`gradient_blend_paste_from_top_left`] - feathered seam
//!
//! # Gradient weights
//!
//! Where two placed images overlap, the weight of the image laid on top
//! grows with the distance from its *seam edges*: the edges of the overlap
//! that are edges of the top image lying strictly inside the bottom one.
//! The weight is the distance to the nearest seam edge divided by the
//! largest such distance in the overlap, so it runs from near 0 at a seam to
//! 1 at the far side. An image that covers the other entirely has no seam
//! edges and weight 1.
//!
//! ```text
//!   base  +-----------------+
//!         |        over +---|-------+
//!         |             |0 .|. 1    |
//!         |             |0 .|. 1    |
//!         +-------------|---+       |
//!                       +-----------+
//! ```

use crate::convert::convert_to_32bits;
use crate::{OpsError, OpsResult};
use raster_core::{Error, PixelBuffer, Point, Rect};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Alpha values above this copy instead of blending.
pub const OPAQUE_ALPHA: u32 = 255;

/// Placement of `src` at `(left, top)` clipped to `dst`, in dst coordinates.
fn placement(dst: &PixelBuffer, src: &PixelBuffer, left: i32, top: i32) -> OpsResult<Rect> {
    let placed = Rect::from_origin_size(left, top, src.width(), src.height());
    placed
        .clamp_to(dst.width(), dst.height())
        .ok_or_else(|| Error::invalid_region(placed, dst.width(), dst.height()).into())
}

/// Runs `f(dst_row_bytes, src_row_bytes)` over the clipped overlap.
fn for_overlap<F>(dst: &mut PixelBuffer, src: &PixelBuffer, left: i32, top: i32, mut f: F) -> OpsResult<()>
where
    F: FnMut(&mut [u8], &[u8]),
{
    dst.ensure_same_format(src)?;
    let area = placement(dst, src, left, top)?;
    let bpp = dst.bytes_per_pixel();
    let (dx0, dx1) = (area.left as usize * bpp, (area.right as usize + 1) * bpp);
    let sx0 = (area.left - left) as usize * bpp;
    let len = dx1 - dx0;
    for y in area.top..=area.bottom {
        let src_row = &src.row((y - top) as u32)[sx0..sx0 + len];
        f(&mut dst.row_mut(y as u32)[dx0..dx1], src_row);
    }
    Ok(())
}

/// Pastes `src` at `(left, top)`.
///
/// `alpha` in `0..=255` blends `alpha/255` of the source over the
/// destination; larger values copy the source bytes.
///
/// # Errors
///
/// Format mismatch, or [`Error::InvalidRegion`] when the source lands
/// entirely outside the destination.
pub fn paste(dst: &mut PixelBuffer, src: &PixelBuffer, left: i32, top: i32, alpha: u32) -> OpsResult<()> {
    if alpha > OPAQUE_ALPHA {
        return paste_from_top_left(dst, src, left, top);
    }
    let pixel_type = dst.pixel_type();
    let a = alpha as f64 / 255.0;
    trace!(left, top, alpha, "paste with alpha");
    for_overlap(dst, src, left, top, |d, s| {
        let n = d.len() / pixel_type.sample().bytes();
        let mut dv = vec![0.0; n];
        let mut sv = vec![0.0; n];
        raster_core::decode_row(pixel_type, d, &mut dv);
        raster_core::decode_row(pixel_type, s, &mut sv);
        for (dv, sv) in dv.iter_mut().zip(&sv) {
            *dv = sv * a + *dv * (1.0 - a);
        }
        raster_core::encode_row(pixel_type, &dv, d);
    })
}

/// Copies `src` to `(left, top)`, clipping at the destination edges.
pub fn paste_from_top_left(dst: &mut PixelBuffer, src: &PixelBuffer, left: i32, top: i32) -> OpsResult<()> {
    for_overlap(dst, src, left, top, |d, s| d.copy_from_slice(s))
}

/// Copies `src` to `(left, top)` without clipping.
///
/// # Errors
///
/// [`Error::InvalidRegion`] unless the whole source fits inside `dst`.
pub fn simple_paste(dst: &mut PixelBuffer, src: &PixelBuffer, left: i32, top: i32) -> OpsResult<()> {
    let placed = Rect::from_origin_size(left, top, src.width(), src.height());
    dst.check_rect(&placed)?;
    paste_from_top_left(dst, src, left, top)
}

// ============================================================================
// Gradient weights
// ============================================================================

/// Weights of `over` inside its overlap with `base`, row-major.
///
/// Both rectangles are placements in one coordinate frame. Returns the
/// overlap and one weight per overlap pixel.
pub fn gradient_weights(base: &Rect, over: &Rect) -> Option<(Rect, Vec<f64>)> {
    let overlap = base.intersect(over)?;
    let seam_left = over.left > base.left;
    let seam_right = over.right < base.right;
    let seam_top = over.top > base.top;
    let seam_bottom = over.bottom < base.bottom;

    let (w, h) = (overlap.width() as usize, overlap.height() as usize);
    let mut dist = Vec::with_capacity(w * h);
    for j in 0..h {
        for i in 0..w {
            // Half-pixel offset keeps the seam pixel itself above zero
            let mut d = f64::INFINITY;
            if seam_left {
                d = d.min(i as f64 + 0.5);
            }
            if seam_right {
                d = d.min((w - 1 - i) as f64 + 0.5);
            }
            if seam_top {
                d = d.min(j as f64 + 0.5);
            }
            if seam_bottom {
                d = d.min((h - 1 - j) as f64 + 0.5);
            }
            dist.push(d);
        }
    }

    let d_max = dist.iter().copied().filter(|d| d.is_finite()).fold(0.0, f64::max);
    let weights = dist
        .into_iter()
        .map(|d| if d.is_finite() && d_max > 0.0 { d / d_max } else { 1.0 })
        .collect();
    Some((overlap, weights))
}

fn ensure_mask(mask: &PixelBuffer, width: u32, height: u32) -> OpsResult<()> {
    if mask.dimensions() != (width, height) {
        return Err(OpsError::SizeMismatch(format!(
            "mask is {}x{}, expected {width}x{height}",
            mask.width(),
            mask.height()
        )));
    }
    if mask.pixel_type().is_colour() {
        return Err(Error::unsupported_pixel_type(mask.pixel_type(), "blend mask").into());
    }
    Ok(())
}

/// Blended overlap of two placed images.
///
/// `origin1`/`origin2` place `src1` and `src2` in a shared frame; `src2` is
/// laid over `src1`. `mask`, if given, has `src1`'s size: only pixels with a
/// non-zero mask value are blended, the others take `src2` unchanged.
///
/// Returns the blended overlap and its rectangle relative to `src1`.
///
/// # Errors
///
/// Format mismatch, [`Error::InvalidRegion`] when the images do not overlap,
/// [`OpsError::SizeMismatch`] for a mask of the wrong size.
pub fn gradient_blended_intersection_image(
    src1: &PixelBuffer,
    origin1: Point,
    src2: &PixelBuffer,
    origin2: Point,
    mask: Option<&PixelBuffer>,
) -> OpsResult<(PixelBuffer, Rect)> {
    src1.ensure_same_format(src2)?;
    if let Some(m) = mask {
        ensure_mask(m, src1.width(), src1.height())?;
    }
    let rect1 = Rect::from_origin_size(origin1.x, origin1.y, src1.width(), src1.height());
    let rect2 = Rect::from_origin_size(origin2.x, origin2.y, src2.width(), src2.height());
    let (overlap, weights) =
        gradient_weights(&rect1, &rect2).ok_or(Error::invalid_region(rect2, src1.width(), src1.height()))?;
    let in1 = overlap.relative_to(origin1);
    let in2 = overlap.relative_to(origin2);
    debug!(?overlap, masked = mask.is_some(), "gradient blend");

    let pixel_type = src1.pixel_type();
    let channels = src1.channels();
    let (w, h) = (overlap.width(), overlap.height());
    let mut out = PixelBuffer::allocate(w, h, pixel_type)?;
    if let Some(p) = src1.palette() {
        out.set_palette(p.clone())?;
    }

    let mut r1 = vec![0.0; src1.width() as usize * channels];
    let mut r2 = vec![0.0; src2.width() as usize * channels];
    let mut rm = vec![0.0; src1.width() as usize * mask.map_or(1, |m| m.channels())];
    let mut row = vec![0.0; w as usize * channels];
    for j in 0..h {
        src1.read_row(in1.top as u32 + j, &mut r1);
        src2.read_row(in2.top as u32 + j, &mut r2);
        if let Some(m) = mask {
            m.read_row(in1.top as u32 + j, &mut rm);
        }
        for i in 0..w as usize {
            let x1 = in1.left as usize + i;
            let x2 = in2.left as usize + i;
            let blend = mask.is_none_or(|m| rm[x1 * m.channels()] != 0.0);
            let wgt = if blend { weights[j as usize * w as usize + i] } else { 1.0 };
            for c in 0..channels {
                let a = r1[x1 * channels + c];
                let b = r2[x2 * channels + c];
                row[i * channels + c] = b * wgt + a * (1.0 - wgt);
            }
        }
        out.write_row(j, &row);
    }
    Ok((out, in1))
}

/// `src` converted to RGBA with gradient weights in the overlap's alpha.
///
/// `base_origin` and `base_size` place the image `src` will be laid over;
/// `src` sits at `origin`. Outside the overlap alpha is 255. Returns the
/// image and the overlap relative to `src`.
pub fn gradient_blend_alpha_image(
    src: &PixelBuffer,
    origin: Point,
    base_origin: Point,
    base_size: (u32, u32),
) -> OpsResult<(PixelBuffer, Rect)> {
    let base = Rect::from_origin_size(base_origin.x, base_origin.y, base_size.0, base_size.1);
    let over = Rect::from_origin_size(origin.x, origin.y, src.width(), src.height());
    let (overlap, weights) =
        gradient_weights(&base, &over).ok_or(Error::invalid_region(over, base_size.0, base_size.1))?;
    let local = overlap.relative_to(origin);

    let mut out = convert_to_32bits(src)?;
    let w = overlap.width() as usize;
    for j in 0..overlap.height() {
        for i in 0..overlap.width() {
            let a = (weights[j as usize * w + i as usize] * 255.0).round();
            out.set_sample(local.left as u32 + i, local.top as u32 + j, 3, a);
        }
    }
    Ok((out, local))
}

/// Lays `src` over `dst` at `(left, top)` with a feathered seam.
///
/// Inside the overlap each pixel is `w * src + (1 - w) * dst` with `w` from
/// [`gradient_weights`]. `mask` has `dst`'s size; where it is zero `src` is
/// copied without blending.
pub fn gradient_blend_paste_from_top_left(
    dst: &mut PixelBuffer,
    src: &PixelBuffer,
    left: i32,
    top: i32,
    mask: Option<&PixelBuffer>,
) -> OpsResult<()> {
    let (blended, rect) = gradient_blended_intersection_image(dst, Point::ZERO, src, Point::new(left, top), mask)?;
    paste_from_top_left(dst, &blended, rect.left, rect.top)
}

/// Pastes `src1`, then `src2`, then their blended overlap onto `background`.
pub fn gradient_blend_paste_pair(
    background: &mut PixelBuffer,
    src1: &PixelBuffer,
    origin1: Point,
    src2: &PixelBuffer,
    origin2: Point,
) -> OpsResult<()> {
    let (blended, rect) = gradient_blended_intersection_image(src1, origin1, src2, origin2, None)?;
    paste_from_top_left(background, src1, origin1.x, origin1.y)?;
    paste_from_top_left(background, src2, origin2.x, origin2.y)?;
    paste_from_top_left(background, &blended, origin1.x + rect.left, origin1.y + rect.top)
}
