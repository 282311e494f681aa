//! Owned pixel storage with an explicit row stride and pixel type tag.
//!
//! # Overview
//!
//! [`PixelBuffer`] is the unit every operation in the workspace consumes and
//! produces. It owns a single `Vec<u8>`; rows are stored top-down, each padded
//! to a multiple of four bytes:
//!
//! ```text
//! row 0: [ p0 | p1 | ... | p(w-1) | pad ]  <- stride bytes
//! row 1: [ p0 | p1 | ... | p(w-1) | pad ]
//! ...
//! ```
//!
//! Invariants held by every constructor:
//! - `stride >= width * bytes_per_pixel`
//! - `data.len() == stride * height`
//! - a palette is only ever attached to `U8` buffers
//!
//! Buffers are never shared. Operations that change type or geometry return a
//! new buffer; the old one is dropped by its owner exactly once.
//!
//! # Raw pixel contract
//!
//! Hosts that render or produce pixels exchange `(bytes, stride, width, height,
//! type)` through [`PixelBuffer::from_raw`] and [`PixelBuffer::raw_bytes`] /
//! [`PixelBuffer::to_raw`], without the buffer knowing the host surface type.
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{PixelBuffer, PixelType};
//!
//! let mut buf = PixelBuffer::allocate(100, 100, PixelType::U8).unwrap();
//! buf.set_sample(3, 4, 0, 200.0);
//! assert_eq!(buf.sample(3, 4, 0), 200.0);
//! assert_eq!(buf.stride(), 100);
//! assert!(buf.is_greyscale());
//! ```

use crate::error::{Error, Result};
use crate::pixel::{Palette, PixelType, Rgba, luminance_rec709};
use crate::rect::Rect;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Row padding in bytes.
pub const ROW_ALIGNMENT: usize = 4;

/// Vertical order of rows in external raw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// First row in memory is the top of the image.
    #[default]
    TopDown,
    /// First row in memory is the bottom of the image.
    BottomUp,
}

/// Owned image storage.
#[derive(Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: usize,
    pixel_type: PixelType,
    palette: Option<Palette>,
    data: Vec<u8>,
}

impl PixelBuffer {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Computes `(stride, total_bytes)` for a buffer shape.
    fn layout(width: u32, height: u32, pixel_type: PixelType) -> Result<(usize, usize)> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_dimensions(
                width,
                height,
                "width and height must be > 0",
            ));
        }
        let line = (width as usize)
            .checked_mul(pixel_type.bytes_per_pixel())
            .ok_or_else(|| Error::invalid_dimensions(width, height, "row size overflows"))?;
        let stride = line
            .checked_next_multiple_of(ROW_ALIGNMENT)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "row size overflows"))?;
        let total = stride
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "buffer size overflows"))?;
        Ok((stride, total))
    }

    /// Allocates a zero-filled buffer.
    ///
    /// `U8` buffers get a linear greyscale palette.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] for a zero dimension or size overflow,
    /// [`Error::AllocationFailed`] when memory cannot be reserved.
    pub fn allocate(width: u32, height: u32, pixel_type: PixelType) -> Result<Self> {
        let (stride, total) = Self::layout(width, height, pixel_type)?;
        let mut data = Vec::new();
        data.try_reserve_exact(total)
            .map_err(|e| Error::allocation_failed(total, e.to_string()))?;
        data.resize(total, 0);

        trace!(width, height, %pixel_type, stride, "allocated pixel buffer");

        Ok(Self {
            width,
            height,
            stride,
            pixel_type,
            palette: (pixel_type == PixelType::U8).then(Palette::greyscale),
            data,
        })
    }

    /// Allocates using the default type for a bit depth.
    ///
    /// See [`PixelType::from_bits_per_pixel`] for the mapping.
    ///
    /// ```rust
    /// use raster_core::PixelBuffer;
    ///
    /// let buf = PixelBuffer::allocate_bpp(16, 8, 24).unwrap();
    /// assert_eq!(buf.bits_per_pixel(), 24);
    /// assert!(PixelBuffer::allocate_bpp(16, 8, 12).is_err());
    /// ```
    pub fn allocate_bpp(width: u32, height: u32, bits_per_pixel: u32) -> Result<Self> {
        let pixel_type = PixelType::from_bits_per_pixel(bits_per_pixel).ok_or_else(|| {
            Error::invalid_dimensions(
                width,
                height,
                format!("no pixel type with {bits_per_pixel} bits per pixel"),
            )
        })?;
        Self::allocate(width, height, pixel_type)
    }

    /// Allocates a buffer with the same shape and type as `self`, zero-filled.
    ///
    /// The palette is carried over.
    pub fn allocate_like(&self) -> Result<Self> {
        let mut out = Self::allocate(self.width, self.height, self.pixel_type)?;
        out.palette = self.palette.clone();
        Ok(out)
    }

    /// Imports external pixel rows.
    ///
    /// `stride` of `None` means rows are tightly packed. With
    /// [`RowOrder::BottomUp`] the first row in `data` becomes the bottom row.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStride`] if `stride` is shorter than one row,
    /// [`Error::InvalidDimensions`] if `data` does not hold `height` rows.
    pub fn from_raw(
        data: &[u8],
        width: u32,
        height: u32,
        stride: Option<usize>,
        pixel_type: PixelType,
        order: RowOrder,
    ) -> Result<Self> {
        let mut buf = Self::allocate(width, height, pixel_type)?;
        let line = buf.line_bytes();
        let src_stride = stride.unwrap_or(line);
        if src_stride < line {
            return Err(Error::InvalidStride {
                stride: src_stride,
                min_stride: line,
                width,
            });
        }
        let needed = src_stride * (height as usize - 1) + line;
        if data.len() < needed {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("raw data has {} bytes, need {needed}", data.len()),
            ));
        }

        for y in 0..height as usize {
            let src_y = match order {
                RowOrder::TopDown => y,
                RowOrder::BottomUp => height as usize - 1 - y,
            };
            let src = &data[src_y * src_stride..src_y * src_stride + line];
            buf.row_mut(y as u32).copy_from_slice(src);
        }
        Ok(buf)
    }

    /// Deep copy that reports allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(self.data.len())
            .map_err(|e| Error::allocation_failed(self.data.len(), e.to_string()))?;
        data.extend_from_slice(&self.data);
        Ok(Self {
            width: self.width,
            height: self.height,
            stride: self.stride,
            pixel_type: self.pixel_type,
            palette: self.palette.clone(),
            data,
        })
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes per row including padding.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Alias for [`stride`](Self::stride).
    #[inline]
    pub fn pitch(&self) -> usize {
        self.stride
    }

    /// Bytes per row excluding padding.
    #[inline]
    pub fn line_bytes(&self) -> usize {
        self.width as usize * self.pixel_type.bytes_per_pixel()
    }

    /// Pixel type tag.
    #[inline]
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Bits per pixel.
    #[inline]
    pub fn bits_per_pixel(&self) -> u32 {
        self.pixel_type.bits_per_pixel()
    }

    /// Bytes per pixel.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.pixel_type.bytes_per_pixel()
    }

    /// Samples per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.pixel_type.channels()
    }

    /// Size of the pixel storage in bytes.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
    }

    /// Rectangle covering the whole buffer.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Palette of a `U8` buffer.
    #[inline]
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Mutable palette of a `U8` buffer.
    #[inline]
    pub fn palette_mut(&mut self) -> Option<&mut Palette> {
        self.palette.as_mut()
    }

    /// Attaches a palette.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedPixelType`] unless the buffer is `U8`.
    pub fn set_palette(&mut self, palette: Palette) -> Result<()> {
        if self.pixel_type != PixelType::U8 {
            return Err(Error::unsupported_pixel_type(self.pixel_type, "palette"));
        }
        self.palette = Some(palette);
        Ok(())
    }

    /// Resets a `U8` buffer's palette to the linear grey ramp.
    pub fn set_grey_level_palette(&mut self) -> Result<()> {
        self.set_palette(Palette::greyscale())
    }

    /// Returns true when both buffers have the same pixel type.
    #[inline]
    pub fn same_format(&self, other: &PixelBuffer) -> bool {
        self.pixel_type == other.pixel_type
    }

    /// Fails with [`Error::FormatMismatch`] unless types match.
    pub fn ensure_same_format(&self, other: &PixelBuffer) -> Result<()> {
        if self.same_format(other) {
            Ok(())
        } else {
            Err(Error::format_mismatch(self.pixel_type, other.pixel_type))
        }
    }

    /// Fails with [`Error::InvalidRegion`] unless `rect` is non-empty and inside.
    pub fn check_rect(&self, rect: &Rect) -> Result<()> {
        if rect.is_empty() || !self.bounds().contains_rect(rect) {
            return Err(Error::invalid_region(*rect, self.width, self.height));
        }
        Ok(())
    }

    /// Returns true if `(x, y)` is a pixel of this buffer.
    #[inline]
    pub fn is_inside(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    // ========================================================================
    // Raw access
    // ========================================================================

    /// Entire storage including row padding.
    #[inline]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable storage including row padding.
    #[inline]
    pub fn raw_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel bytes of row `y`, padding excluded.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.line_bytes()]
    }

    /// Mutable pixel bytes of row `y`, padding excluded.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let line = self.line_bytes();
        &mut self.data[start..start + line]
    }

    /// Iterator over rows, padding excluded.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let line = self.line_bytes();
        self.data.chunks_exact(self.stride).map(move |r| &r[..line])
    }

    /// Mutable iterator over rows, padding excluded.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let line = self.line_bytes();
        self.data
            .chunks_exact_mut(self.stride)
            .map(move |r| &mut r[..line])
    }

    /// Swaps the pixel bytes of two rows.
    ///
    /// # Panics
    ///
    /// Panics if `a == b`.
    pub fn swap_rows(&mut self, a: u32, b: u32) {
        assert_ne!(a, b, "cannot swap a row with itself");
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let line = self.line_bytes();
        let (head, tail) = self.data.split_at_mut(hi as usize * self.stride);
        let lo_start = lo as usize * self.stride;
        head[lo_start..lo_start + line].swap_with_slice(&mut tail[..line]);
    }

    /// Exports rows to a fresh vector.
    ///
    /// With `padded` the export keeps this buffer's stride, otherwise rows are
    /// packed.
    pub fn to_raw(&self, padded: bool, order: RowOrder) -> Vec<u8> {
        let out_stride = if padded { self.stride } else { self.line_bytes() };
        let mut out = vec![0u8; out_stride * self.height as usize];
        for (y, dst) in out.chunks_exact_mut(out_stride).enumerate() {
            let src_y = match order {
                RowOrder::TopDown => y as u32,
                RowOrder::BottomUp => self.height - 1 - y as u32,
            };
            dst[..self.line_bytes()].copy_from_slice(self.row(src_y));
        }
        out
    }

    // ========================================================================
    // Sample access
    // ========================================================================

    #[inline]
    fn sample_offset(&self, x: u32, y: u32, channel: usize) -> usize {
        y as usize * self.stride
            + x as usize * self.pixel_type.bytes_per_pixel()
            + channel * self.pixel_type.sample().bytes()
    }

    /// Reads one channel as f64.
    ///
    /// # Panics
    ///
    /// Panics on out-of-range coordinates or channel.
    #[inline]
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> f64 {
        debug_assert!(x < self.width && y < self.height && channel < self.channels());
        let off = self.sample_offset(x, y, channel);
        self.pixel_type.sample().read(&self.data[off..])
    }

    /// Writes one channel, rounding and saturating for integer types.
    #[inline]
    pub fn set_sample(&mut self, x: u32, y: u32, channel: usize, value: f64) {
        debug_assert!(x < self.width && y < self.height && channel < self.channels());
        let off = self.sample_offset(x, y, channel);
        self.pixel_type.sample().write(value, &mut self.data[off..]);
    }

    /// Decodes row `y` into `out` (`width * channels` values).
    pub fn read_row(&self, y: u32, out: &mut [f64]) {
        decode_row(self.pixel_type, self.row(y), out);
    }

    /// Encodes `values` (`width * channels`) into row `y`.
    pub fn write_row(&mut self, y: u32, values: &[f64]) {
        let pixel_type = self.pixel_type;
        encode_row(pixel_type, values, self.row_mut(y));
    }

    /// Single intensity for a pixel.
    ///
    /// Greyscale types return the sample, complex returns the magnitude and
    /// colour types return Rec. 709 luminance of R, G, B.
    pub fn intensity(&self, x: u32, y: u32) -> f64 {
        match self.pixel_type {
            PixelType::Complex => {
                let re = self.sample(x, y, 0);
                let im = self.sample(x, y, 1);
                re.hypot(im)
            }
            t if t.is_colour() => luminance_rec709(
                self.sample(x, y, 0),
                self.sample(x, y, 1),
                self.sample(x, y, 2),
            ),
            _ => self.sample(x, y, 0),
        }
    }

    /// 8-bit colour of a pixel in a standard buffer.
    ///
    /// `U8` resolves through the palette; colour types return channels as
    /// stored. Other types return `None`.
    pub fn colour_at(&self, x: u32, y: u32) -> Option<Rgba> {
        match self.pixel_type {
            PixelType::U8 => {
                let index = self.sample(x, y, 0) as u8;
                Some(
                    self.palette
                        .as_ref()
                        .map_or(Rgba::grey(index), |p| p.get(index)),
                )
            }
            PixelType::Rgb8 => {
                let off = self.sample_offset(x, y, 0);
                let p = &self.data[off..off + 3];
                Some(Rgba::rgb(p[0], p[1], p[2]))
            }
            PixelType::Rgba8 => {
                let off = self.sample_offset(x, y, 0);
                let p = &self.data[off..off + 4];
                Some(Rgba::new(p[0], p[1], p[2], p[3]))
            }
            _ => None,
        }
    }

    /// Scans the pixels to decide whether the image carries any colour.
    ///
    /// Single-channel types are greyscale unless a palette maps a used index
    /// to a non-grey entry. Colour types are greyscale only if R, G and B are
    /// equal at every pixel. Alpha is ignored. The result is not cached.
    pub fn is_greyscale(&self) -> bool {
        match self.pixel_type {
            PixelType::U8 => match &self.palette {
                Some(p) if !p.is_greyscale() => self
                    .rows()
                    .all(|row| row.iter().all(|&i| p.get(i).is_grey())),
                _ => true,
            },
            t if t.is_colour() => {
                let bpp = t.bytes_per_pixel();
                let sb = t.sample().bytes();
                self.rows().all(|row| {
                    row.chunks_exact(bpp).all(|px| {
                        px[..sb] == px[sb..2 * sb] && px[sb..2 * sb] == px[2 * sb..3 * sb]
                    })
                })
            }
            _ => true,
        }
    }
}

/// Decodes packed samples of one row into f64 values.
pub fn decode_row(pixel_type: PixelType, row: &[u8], out: &mut [f64]) {
    let kind = pixel_type.sample();
    let sb = kind.bytes();
    for (v, bytes) in out.iter_mut().zip(row.chunks_exact(sb)) {
        *v = kind.read(bytes);
    }
}

/// Encodes f64 values into packed samples of one row.
pub fn encode_row(pixel_type: PixelType, values: &[f64], row: &mut [u8]) {
    let kind = pixel_type.sample();
    let sb = kind.bytes();
    for (v, bytes) in values.iter().zip(row.chunks_exact_mut(sb)) {
        kind.write(*v, bytes);
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("pixel_type", &self.pixel_type)
            .field("palette", &self.palette.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_query_round_trip() {
        for bpp in [8, 16, 24, 32] {
            let buf = PixelBuffer::allocate_bpp(37, 11, bpp).unwrap();
            assert_eq!(buf.width(), 37);
            assert_eq!(buf.height(), 11);
            assert_eq!(buf.bits_per_pixel(), bpp);
            assert!(buf.stride() >= 37 * (bpp as usize / 8));
            assert_eq!(buf.stride() % ROW_ALIGNMENT, 0);
            assert_eq!(buf.size_in_bytes(), buf.stride() * 11);
        }
    }

    #[test]
    fn test_allocate_rejects_zero() {
        assert!(PixelBuffer::allocate(0, 5, PixelType::U8).is_err());
        assert!(PixelBuffer::allocate(5, 0, PixelType::F64).is_err());
        let err = PixelBuffer::allocate(u32::MAX, u32::MAX, PixelType::RgbaF).unwrap_err();
        assert!(err.is_allocation_error());
    }

    #[test]
    fn test_stride_padding() {
        let buf = PixelBuffer::allocate(3, 2, PixelType::Rgb8).unwrap();
        assert_eq!(buf.line_bytes(), 9);
        assert_eq!(buf.stride(), 12);
        assert_eq!(buf.row(1).len(), 9);
    }

    #[test]
    fn test_samples_round_trip() {
        let mut buf = PixelBuffer::allocate(4, 4, PixelType::I16).unwrap();
        buf.set_sample(1, 2, 0, -1234.0);
        assert_eq!(buf.sample(1, 2, 0), -1234.0);

        let mut c = PixelBuffer::allocate(2, 2, PixelType::Complex).unwrap();
        c.set_sample(0, 0, 0, 3.0);
        c.set_sample(0, 0, 1, 4.0);
        assert_eq!(c.intensity(0, 0), 5.0);
    }

    #[test]
    fn test_row_codec() {
        let mut buf = PixelBuffer::allocate(3, 1, PixelType::RgbF).unwrap();
        let values = [0.1, 0.2, 0.3, 1.0, 2.0, 3.0, -1.0, -2.0, -3.0];
        buf.write_row(0, &values);
        let mut out = [0.0; 9];
        buf.read_row(0, &mut out);
        for (a, b) in values.iter().zip(out.iter()) {
            approx::assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_from_raw_bottom_up() {
        // 2x2 U8, packed, bottom row first
        let data = [1u8, 2, 3, 4];
        let buf = PixelBuffer::from_raw(&data, 2, 2, None, PixelType::U8, RowOrder::BottomUp)
            .unwrap();
        assert_eq!(buf.row(0), &[3, 4]);
        assert_eq!(buf.row(1), &[1, 2]);
        assert_eq!(buf.to_raw(false, RowOrder::BottomUp), data.to_vec());
    }

    #[test]
    fn test_from_raw_validation() {
        let data = [0u8; 10];
        let err = PixelBuffer::from_raw(&data, 4, 2, Some(3), PixelType::U8, RowOrder::TopDown)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStride { .. }));
        assert!(
            PixelBuffer::from_raw(&data, 4, 3, None, PixelType::U8, RowOrder::TopDown).is_err()
        );
    }

    #[test]
    fn test_is_greyscale_scan() {
        let mut rgb = PixelBuffer::allocate(4, 4, PixelType::Rgb8).unwrap();
        for y in 0..4 {
            for c in 0..3 {
                rgb.set_sample(y, y, c, 90.0);
            }
        }
        assert!(rgb.is_greyscale());
        rgb.set_sample(2, 3, 1, 91.0);
        assert!(!rgb.is_greyscale());

        let mut idx = PixelBuffer::allocate(2, 2, PixelType::U8).unwrap();
        let mut pal = Palette::greyscale();
        pal.set(7, Rgba::rgb(10, 20, 30));
        idx.set_palette(pal).unwrap();
        // Colour entry exists but is unused
        assert!(idx.is_greyscale());
        idx.set_sample(1, 1, 0, 7.0);
        assert!(!idx.is_greyscale());
    }

    #[test]
    fn test_palette_only_on_u8() {
        let mut buf = PixelBuffer::allocate(2, 2, PixelType::U16).unwrap();
        assert!(buf.palette().is_none());
        assert!(buf.set_grey_level_palette().is_err());
    }

    #[test]
    fn test_swap_rows() {
        let mut buf = PixelBuffer::allocate(2, 3, PixelType::U8).unwrap();
        buf.row_mut(0).copy_from_slice(&[1, 1]);
        buf.row_mut(2).copy_from_slice(&[9, 9]);
        buf.swap_rows(2, 0);
        assert_eq!(buf.row(0), &[9, 9]);
        assert_eq!(buf.row(2), &[1, 1]);
    }

    #[test]
    fn test_format_mismatch() {
        let a = PixelBuffer::allocate(2, 2, PixelType::U8).unwrap();
        let b = PixelBuffer::allocate(2, 2, PixelType::Rgb8).unwrap();
        assert!(a.ensure_same_format(&b).unwrap_err().is_format_mismatch());
        assert!(a.check_rect(&Rect::new(0, 0, 1, 1)).is_ok());
        assert!(a.check_rect(&Rect::new(0, 0, 2, 1)).is_err());
    }
}
