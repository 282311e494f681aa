//! Geometric transforms that move whole pixels.
//!
//! # Operations
//!
//! - [`flip_horizontal`] / [`flip_vertical`] - in-place mirrors
//! - [`copy`] - extract an inclusive region
//! - [`rotate_90_cw`] / [`rotate_90_ccw`] - exact quarter turns
//!
//! Arbitrary angles go through [`affine::rotate`](crate::affine::rotate).
//!
//! # Example
//!
//! ```rust
//! use raster_core::{PixelBuffer, PixelType, Rect};
//! use raster_ops::transform::{copy, flip_vertical};
//!
//! let mut buf = PixelBuffer::allocate(64, 64, PixelType::U16)?;
//! flip_vertical(&mut buf);
//! let region = copy(&buf, &Rect::new(16, 16, 47, 47))?;
//! assert_eq!(region.dimensions(), (32, 32));
//! # Ok::<(), raster_ops::OpsError>(())
//! ```

use crate::OpsResult;
use crate::parallel::for_each_row;
use raster_core::PixelBuffer;
use raster_core::Rect;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Mirrors left-right in place.
pub fn flip_horizontal(buf: &mut PixelBuffer) {
    let bpp = buf.bytes_per_pixel();
    let width = buf.width() as usize;
    for_each_row(buf, |_, row| {
        for x in 0..width / 2 {
            let (left, right) = row.split_at_mut((width - 1 - x) * bpp);
            left[x * bpp..(x + 1) * bpp].swap_with_slice(&mut right[..bpp]);
        }
    });
}

/// Mirrors top-bottom in place.
pub fn flip_vertical(buf: &mut PixelBuffer) {
    let h = buf.height();
    for y in 0..h / 2 {
        buf.swap_rows(y, h - 1 - y);
    }
}

/// Copies an inclusive region into a new buffer.
///
/// The palette is carried over.
///
/// # Errors
///
/// [`raster_core::Error::InvalidRegion`] if `rect` is empty or not inside.
pub fn copy(src: &PixelBuffer, rect: &Rect) -> OpsResult<PixelBuffer> {
    src.check_rect(rect)?;
    let mut dst = PixelBuffer::allocate(rect.width(), rect.height(), src.pixel_type())?;
    if let Some(p) = src.palette() {
        dst.set_palette(p.clone())?;
    }
    let bpp = src.bytes_per_pixel();
    let x0 = rect.left as usize * bpp;
    let len = dst.line_bytes();
    for y in 0..rect.height() {
        dst.row_mut(y)
            .copy_from_slice(&src.row(rect.top as u32 + y)[x0..x0 + len]);
    }
    trace!(?rect, "copied region");
    Ok(dst)
}

fn quarter_turn(src: &PixelBuffer, clockwise: bool) -> OpsResult<PixelBuffer> {
    let (w, h) = src.dimensions();
    let mut dst = PixelBuffer::allocate(h, w, src.pixel_type())?;
    if let Some(p) = src.palette() {
        dst.set_palette(p.clone())?;
    }
    let bpp = src.bytes_per_pixel();
    for_each_row(&mut dst, |ny, row| {
        for nx in 0..h {
            // Inverse of (x, y) -> (h-1-y, x) or (y, w-1-x)
            let (x, y) = if clockwise { (ny, h - 1 - nx) } else { (w - 1 - ny, nx) };
            let s = &src.row(y)[x as usize * bpp..][..bpp];
            row[nx as usize * bpp..][..bpp].copy_from_slice(s);
        }
    });
    Ok(dst)
}

/// Rotates 90 degrees clockwise (exact, no resampling).
pub fn rotate_90_cw(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    quarter_turn(src, true)
}

/// Rotates 90 degrees counter-clockwise (exact, no resampling).
pub fn rotate_90_ccw(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    quarter_turn(src, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_core::{PixelType, Rgba};

    fn numbered(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::allocate(w, h, PixelType::U8).unwrap();
        for y in 0..h {
            for x in 0..w {
                buf.set_sample(x, y, 0, (y * w + x) as f64);
            }
        }
        buf
    }

    #[test]
    fn test_flip_vertical_twice_identity() {
        let src = numbered(5, 7);
        let mut buf = src.clone();
        flip_vertical(&mut buf);
        assert_eq!(buf.row(0), src.row(6));
        flip_vertical(&mut buf);
        assert_eq!(buf, src);
    }

    #[test]
    fn test_flip_horizontal_colour() {
        let mut buf = PixelBuffer::allocate(3, 1, PixelType::Rgb8).unwrap();
        buf.row_mut(0).copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        flip_horizontal(&mut buf);
        assert_eq!(buf.row(0), &[7, 8, 9, 4, 5, 6, 1, 2, 3]);
        assert_eq!(buf.colour_at(0, 0), Some(Rgba::rgb(7, 8, 9)));
    }

    #[test]
    fn test_copy_region() {
        let src = numbered(6, 6);
        let out = copy(&src, &Rect::new(1, 2, 3, 4)).unwrap();
        assert_eq!(out.dimensions(), (3, 3));
        assert_eq!(out.sample(0, 0, 0), src.sample(1, 2, 0));
        assert_eq!(out.sample(2, 2, 0), src.sample(3, 4, 0));
        assert!(copy(&src, &Rect::new(4, 4, 6, 6)).is_err());
        assert!(copy(&src, &Rect::new(3, 3, 2, 2)).is_err());
    }

    #[test]
    fn test_quarter_turns() {
        let src = numbered(4, 2);
        let cw = rotate_90_cw(&src).unwrap();
        assert_eq!(cw.dimensions(), (2, 4));
        // Top-left of a clockwise turn is the old bottom-left
        assert_eq!(cw.sample(0, 0, 0), src.sample(0, 1, 0));
        let back = rotate_90_ccw(&cw).unwrap();
        assert_eq!(back, src);
    }
}
