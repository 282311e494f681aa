//! Drawing primitives.
//!
//! Greyscale primitives take a raw sample value and work on every
//! single-channel type. Colour primitives take an 8-bit [`Rgba`] and work on
//! every colour type; channel values are scaled from `0..=255` onto the
//! type's natural range (`*257` for 16-bit, `/255` for float).
//!
//! Rectangles are inclusive and clipped to the buffer. A rectangle or line
//! that misses the buffer entirely is an error.
//!
//! ```rust
//! use raster_core::{PixelBuffer, PixelType, Rect, Rgba};
//! use raster_ops::draw::draw_colour_solid_rect;
//!
//! let mut buf = PixelBuffer::allocate(4, 4, PixelType::Rgb8)?;
//! let bounds = buf.bounds();
//! draw_colour_solid_rect(&mut buf, &bounds, Rgba::rgb(255, 0, 0))?;
//! assert_eq!(buf.colour_at(3, 3), Some(Rgba::rgb(255, 0, 0)));
//! # Ok::<(), raster_ops::OpsError>(())
//! ```

use crate::convert::Linear;
use crate::stats::line_points;
use crate::{OpsError, OpsResult};
use raster_core::{Error, PixelBuffer, PixelType, Point, Rect, Rgba};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Channel values of `colour` in the units of `pixel_type`.
///
/// Colour types get R, G, B (and A); single-channel types get the Rec. 709
/// luminance; complex gets the luminance as the real part. Zero always maps
/// to zero, so black stays 0 on signed types.
pub fn colour_samples(pixel_type: PixelType, colour: Rgba) -> Vec<f64> {
    let map = pixel_type
        .natural_range()
        .map_or(Linear::IDENTITY, |(_, hi)| Linear::between((0.0, 255.0), (0.0, hi)));
    let rgba = colour.to_array().map(|c| map.apply(c as f64));
    match pixel_type {
        PixelType::Complex => vec![colour.luma(), 0.0],
        t if t.is_colour() => rgba[..t.channels()].to_vec(),
        _ => vec![map.apply(colour.luma())],
    }
}

fn clip(buf: &PixelBuffer, rect: &Rect) -> OpsResult<Rect> {
    rect.clamp_to(buf.width(), buf.height())
        .ok_or_else(|| Error::invalid_region(*rect, buf.width(), buf.height()).into())
}

fn require_greyscale(buf: &PixelBuffer, operation: &'static str) -> OpsResult<()> {
    if buf.pixel_type().is_colour() {
        return Err(Error::unsupported_pixel_type(buf.pixel_type(), operation).into());
    }
    Ok(())
}

fn require_colour(buf: &PixelBuffer, operation: &'static str) -> OpsResult<()> {
    if !buf.pixel_type().is_colour() {
        return Err(Error::unsupported_pixel_type(buf.pixel_type(), operation).into());
    }
    Ok(())
}

/// Writes `pixel` (already encoded) over the clipped rectangle.
fn fill_encoded(buf: &mut PixelBuffer, rect: &Rect, pixel: &[u8]) {
    let bpp = pixel.len();
    let (x0, x1) = (rect.left as usize * bpp, (rect.right as usize + 1) * bpp);
    for y in rect.top..=rect.bottom {
        for dst in buf.row_mut(y as u32)[x0..x1].chunks_exact_mut(bpp) {
            dst.copy_from_slice(pixel);
        }
    }
}

fn encode_pixel(pixel_type: PixelType, values: &[f64]) -> Vec<u8> {
    let mut pixel = vec![0u8; pixel_type.bytes_per_pixel()];
    raster_core::encode_row(pixel_type, values, &mut pixel);
    pixel
}

/// Fills `rect` with one greyscale value.
///
/// # Errors
///
/// [`Error::UnsupportedPixelType`] for colour buffers,
/// [`Error::InvalidRegion`] if `rect` misses the buffer.
pub fn draw_solid_rectangle(buf: &mut PixelBuffer, rect: &Rect, value: f64) -> OpsResult<()> {
    require_greyscale(buf, "greyscale rectangle")?;
    let r = clip(buf, rect)?;
    let mut values = vec![0.0; buf.channels()];
    values[0] = value;
    let pixel = encode_pixel(buf.pixel_type(), &values);
    fill_encoded(buf, &r, &pixel);
    Ok(())
}

/// Fills `rect` with a colour.
pub fn draw_colour_solid_rect(buf: &mut PixelBuffer, rect: &Rect, colour: Rgba) -> OpsResult<()> {
    require_colour(buf, "colour rectangle")?;
    let r = clip(buf, rect)?;
    let pixel = encode_pixel(buf.pixel_type(), &colour_samples(buf.pixel_type(), colour));
    fill_encoded(buf, &r, &pixel);
    Ok(())
}

/// The four edge strips of `rect` for `line_width` perimeters drawn inward.
fn outline_strips(rect: &Rect, line_width: u32) -> [Rect; 4] {
    let lw = line_width.min(rect.width().max(rect.height())) as i32;
    let inner = lw - 1;
    [
        Rect::new(rect.left, rect.top, rect.right, rect.top + inner),
        Rect::new(rect.left, rect.bottom - inner, rect.right, rect.bottom),
        Rect::new(rect.left, rect.top, rect.left + inner, rect.bottom),
        Rect::new(rect.right - inner, rect.top, rect.right, rect.bottom),
    ]
}

fn draw_outline(buf: &mut PixelBuffer, rect: &Rect, line_width: u32, pixel: &[u8]) -> OpsResult<()> {
    if line_width == 0 {
        return Err(OpsError::invalid_parameter("line width must be > 0"));
    }
    if rect.is_empty() {
        return Err(Error::invalid_region(*rect, buf.width(), buf.height()).into());
    }
    clip(buf, rect)?;
    for strip in outline_strips(rect, line_width) {
        // Strips are clamped to the rect, so an empty overlap just means off-buffer
        if let Some(s) = strip.intersect(rect).and_then(|s| s.clamp_to(buf.width(), buf.height())) {
            fill_encoded(buf, &s, pixel);
        }
    }
    Ok(())
}

/// Draws `line_width` greyscale perimeters inward from the edge of `rect`.
pub fn draw_greyscale_rect(buf: &mut PixelBuffer, rect: &Rect, value: f64, line_width: u32) -> OpsResult<()> {
    require_greyscale(buf, "greyscale outline")?;
    let mut values = vec![0.0; buf.channels()];
    values[0] = value;
    let pixel = encode_pixel(buf.pixel_type(), &values);
    draw_outline(buf, rect, line_width, &pixel)
}

/// Draws `line_width` colour perimeters inward from the edge of `rect`.
pub fn draw_colour_rect(buf: &mut PixelBuffer, rect: &Rect, colour: Rgba, line_width: u32) -> OpsResult<()> {
    require_colour(buf, "colour outline")?;
    let pixel = encode_pixel(buf.pixel_type(), &colour_samples(buf.pixel_type(), colour));
    draw_outline(buf, rect, line_width, &pixel)
}

/// Plots a line of the given width from `p1` to `p2`.
///
/// Width 1 is a Bresenham line; wider lines cover every pixel whose centre
/// lies within `line_width / 2` of the segment.
fn plot_line(buf: &mut PixelBuffer, p1: Point, p2: Point, line_width: u32, pixel: &[u8]) -> OpsResult<()> {
    if line_width == 0 {
        return Err(OpsError::invalid_parameter("line width must be > 0"));
    }
    let bounds = Rect::new(p1.x.min(p2.x), p1.y.min(p2.y), p1.x.max(p2.x), p1.y.max(p2.y));
    let bpp = pixel.len();
    let (w, h) = (buf.width() as i64, buf.height() as i64);
    let mut put = |x: i32, y: i32| {
        if (x as i64) < w && (y as i64) < h && x >= 0 && y >= 0 {
            let off = x as usize * bpp;
            buf.row_mut(y as u32)[off..off + bpp].copy_from_slice(pixel);
        }
    };

    if line_width == 1 {
        if bounds.clamp_to(w as u32, h as u32).is_none() {
            return Err(Error::invalid_region(bounds, w as u32, h as u32).into());
        }
        for p in line_points(p1, p2) {
            put(p.x, p.y);
        }
        return Ok(());
    }

    let half = line_width as f64 / 2.0;
    let grow = half.ceil() as i32;
    let area = Rect::new(bounds.left - grow, bounds.top - grow, bounds.right + grow, bounds.bottom + grow);
    let area = area
        .clamp_to(w as u32, h as u32)
        .ok_or_else(|| Error::invalid_region(bounds, w as u32, h as u32))?;

    let (ax, ay) = (p1.x as f64, p1.y as f64);
    let (dx, dy) = ((p2.x - p1.x) as f64, (p2.y - p1.y) as f64);
    let len_sq = dx * dx + dy * dy;
    for y in area.top..=area.bottom {
        for x in area.left..=area.right {
            let (px, py) = (x as f64 - ax, y as f64 - ay);
            let t = if len_sq > 0.0 {
                ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (ex, ey) = (px - t * dx, py - t * dy);
            if ex * ex + ey * ey <= half * half {
                put(x, y);
            }
        }
    }
    Ok(())
}

/// Draws a greyscale line.
pub fn draw_line(buf: &mut PixelBuffer, p1: Point, p2: Point, value: f64, line_width: u32) -> OpsResult<()> {
    require_greyscale(buf, "greyscale line")?;
    let mut values = vec![0.0; buf.channels()];
    values[0] = value;
    let pixel = encode_pixel(buf.pixel_type(), &values);
    plot_line(buf, p1, p2, line_width, &pixel)
}

/// Draws a colour line.
pub fn draw_colour_line(buf: &mut PixelBuffer, p1: Point, p2: Point, colour: Rgba, line_width: u32) -> OpsResult<()> {
    require_colour(buf, "colour line")?;
    let pixel = encode_pixel(buf.pixel_type(), &colour_samples(buf.pixel_type(), colour));
    plot_line(buf, p1, p2, line_width, &pixel)
}

/// Clears to 0 (greyscale) or opaque black (colour).
pub fn clear(buf: &mut PixelBuffer) -> OpsResult<()> {
    let bounds = buf.bounds();
    if buf.pixel_type().is_colour() {
        draw_colour_solid_rect(buf, &bounds, Rgba::BLACK)
    } else {
        draw_solid_rectangle(buf, &bounds, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::statistics_report;

    #[test]
    fn test_fill_full_extent_stats() {
        let mut buf = PixelBuffer::allocate(100, 100, PixelType::U8).unwrap();
        let bounds = buf.bounds();
        draw_solid_rectangle(&mut buf, &bounds, 128.0).unwrap();
        let r = statistics_report(&buf);
        assert_eq!((r.min, r.max, r.mean, r.std_deviation), (128.0, 128.0, 128.0, 0.0));
        assert_eq!(r.area, 10_000);
    }

    #[test]
    fn test_colour_fill_reads_back() {
        let mut buf = PixelBuffer::allocate(4, 4, PixelType::Rgb8).unwrap();
        let bounds = buf.bounds();
        draw_colour_solid_rect(&mut buf, &bounds, Rgba::rgb(255, 0, 0)).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(buf.colour_at(x, y), Some(Rgba::rgb(255, 0, 0)));
            }
        }
    }

    #[test]
    fn test_colour_scaling() {
        assert_eq!(colour_samples(PixelType::Rgb16, Rgba::rgb(255, 0, 1)), vec![65535.0, 0.0, 257.0]);
        assert_eq!(colour_samples(PixelType::RgbaF, Rgba::WHITE), vec![1.0; 4]);
    }

    #[test]
    fn test_outline_inward() {
        let mut buf = PixelBuffer::allocate(10, 10, PixelType::Rgba8).unwrap();
        let rect = Rect::new(2, 2, 7, 7);
        draw_colour_rect(&mut buf, &rect, Rgba::WHITE, 2).unwrap();
        // Two perimeters: rows/cols 2,3 and 6,7 inside the rect
        assert_eq!(buf.colour_at(2, 2), Some(Rgba::WHITE));
        assert_eq!(buf.colour_at(3, 5), Some(Rgba::WHITE));
        assert_eq!(buf.colour_at(7, 6), Some(Rgba::WHITE));
        assert_eq!(buf.colour_at(4, 4), Some(Rgba::new(0, 0, 0, 0)));
        // Nothing outside the rect
        assert_eq!(buf.colour_at(1, 2), Some(Rgba::new(0, 0, 0, 0)));
        assert_eq!(buf.colour_at(8, 8), Some(Rgba::new(0, 0, 0, 0)));
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let mut grey = PixelBuffer::allocate(4, 4, PixelType::U16).unwrap();
        assert!(draw_colour_solid_rect(&mut grey, &Rect::new(0, 0, 1, 1), Rgba::WHITE).is_err());
        let mut rgb = PixelBuffer::allocate(4, 4, PixelType::Rgb8).unwrap();
        assert!(draw_solid_rectangle(&mut rgb, &Rect::new(0, 0, 1, 1), 1.0).is_err());
        assert!(draw_solid_rectangle(&mut grey, &Rect::new(10, 10, 12, 12), 1.0).is_err());
    }

    #[test]
    fn test_clipped_rect() {
        let mut buf = PixelBuffer::allocate(4, 4, PixelType::F32).unwrap();
        draw_solid_rectangle(&mut buf, &Rect::new(-2, -2, 1, 1), 0.5).unwrap();
        assert_eq!(buf.sample(1, 1, 0), 0.5);
        assert_eq!(buf.sample(2, 2, 0), 0.0);
    }

    #[test]
    fn test_lines() {
        let mut buf = PixelBuffer::allocate(8, 8, PixelType::U8).unwrap();
        draw_line(&mut buf, Point::new(0, 0), Point::new(7, 7), 200.0, 1).unwrap();
        for i in 0..8 {
            assert_eq!(buf.sample(i, i, 0), 200.0);
        }
        assert_eq!(buf.sample(1, 0, 0), 0.0);

        let mut thick = PixelBuffer::allocate(9, 9, PixelType::Rgb8).unwrap();
        draw_colour_line(&mut thick, Point::new(0, 4), Point::new(8, 4), Rgba::WHITE, 3).unwrap();
        assert_eq!(thick.colour_at(4, 3), Some(Rgba::WHITE));
        assert_eq!(thick.colour_at(4, 5), Some(Rgba::WHITE));
        assert_eq!(thick.colour_at(4, 6), Some(Rgba::BLACK));
    }

    #[test]
    fn test_clear() {
        let mut buf = PixelBuffer::allocate(3, 3, PixelType::Rgba8).unwrap();
        buf.raw_bytes_mut().fill(77);
        clear(&mut buf).unwrap();
        assert_eq!(buf.colour_at(2, 2), Some(Rgba::BLACK));

        let mut grey = PixelBuffer::allocate(3, 3, PixelType::I32).unwrap();
        grey.set_sample(1, 1, 0, -9.0);
        clear(&mut grey).unwrap();
        assert_eq!(grey.sample(1, 1, 0), 0.0);
    }
}
