//! Capability predicates.
//!
//! Answers reflect the codecs compiled in through the `bmp`, `png`, `jpeg`,
//! `tiff`, `gif` and `psd` features. GIF and PSD are read only.
//!
//! | Format | Depths (bits per pixel)     |
//! |--------|-----------------------------|
//! | BMP    | 8, 24, 32                   |
//! | PNG    | 8, 16, 24, 32, 48, 64       |
//! | JPEG   | 8, 24                       |
//! | TIFF   | 8, 16, 24, 32, 48, 64       |
//! | GIF    | - (read only)               |
//! | PSD    | - (read only)               |
//!
//! ```rust
//! use raster_io::{BitDepth, Format, supports_bit_depth};
//!
//! if supports_bit_depth(Format::Png, BitDepth::Bit16) {
//!     // safe to save 16-bit greyscale PNG
//! }
//! ```

use crate::detect::Format;
use raster_core::PixelType;
use std::fmt;

/// Storage depth requested when saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// 8-bit greyscale.
    Bit8,
    /// 16-bit greyscale.
    Bit16,
    /// 8-bit RGB.
    Bit24,
    /// 8-bit RGBA.
    Bit32,
    /// 16-bit RGB.
    Bit48,
    /// 16-bit RGBA.
    Bit64,
}

impl BitDepth {
    /// Bits per pixel.
    pub const fn bits(&self) -> u32 {
        match self {
            BitDepth::Bit8 => 8,
            BitDepth::Bit16 => 16,
            BitDepth::Bit24 => 24,
            BitDepth::Bit32 => 32,
            BitDepth::Bit48 => 48,
            BitDepth::Bit64 => 64,
        }
    }

    /// Depth for a bit count.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(BitDepth::Bit8),
            16 => Some(BitDepth::Bit16),
            24 => Some(BitDepth::Bit24),
            32 => Some(BitDepth::Bit32),
            48 => Some(BitDepth::Bit48),
            64 => Some(BitDepth::Bit64),
            _ => None,
        }
    }

    /// Pixel type stored at this depth.
    pub const fn pixel_type(&self) -> PixelType {
        match self {
            BitDepth::Bit8 => PixelType::U8,
            BitDepth::Bit16 => PixelType::U16,
            BitDepth::Bit24 => PixelType::Rgb8,
            BitDepth::Bit32 => PixelType::Rgba8,
            BitDepth::Bit48 => PixelType::Rgb16,
            BitDepth::Bit64 => PixelType::Rgba16,
        }
    }

    /// Depth that stores `pixel_type` without conversion, if any.
    pub fn for_pixel_type(pixel_type: PixelType) -> Option<Self> {
        [
            BitDepth::Bit8,
            BitDepth::Bit16,
            BitDepth::Bit24,
            BitDepth::Bit32,
            BitDepth::Bit48,
            BitDepth::Bit64,
        ]
        .into_iter()
        .find(|d| d.pixel_type() == pixel_type)
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Returns true if files of `format` can be loaded.
pub fn supports_reading(format: Format) -> bool {
    match format {
        Format::Bmp => cfg!(feature = "bmp"),
        Format::Png => cfg!(feature = "png"),
        Format::Jpeg => cfg!(feature = "jpeg"),
        Format::Tiff => cfg!(feature = "tiff"),
        Format::Gif => cfg!(feature = "gif"),
        Format::Psd => cfg!(feature = "psd"),
        Format::Unknown => false,
    }
}

/// Returns true if buffers can be saved as `format`.
pub fn supports_writing(format: Format) -> bool {
    match format {
        Format::Bmp | Format::Png | Format::Jpeg | Format::Tiff => supports_reading(format),
        Format::Gif | Format::Psd | Format::Unknown => false,
    }
}

/// Returns true if `format` can be written at `depth`.
pub fn supports_bit_depth(format: Format, depth: BitDepth) -> bool {
    if !supports_writing(format) {
        return false;
    }
    match format {
        Format::Bmp => matches!(depth, BitDepth::Bit8 | BitDepth::Bit24 | BitDepth::Bit32),
        Format::Jpeg => matches!(depth, BitDepth::Bit8 | BitDepth::Bit24),
        Format::Png | Format::Tiff => true,
        Format::Gif | Format::Psd | Format::Unknown => false,
    }
}

/// All formats that can currently be read.
pub fn readable_formats() -> impl Iterator<Item = Format> {
    Format::ALL.into_iter().filter(|&f| supports_reading(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_formats() {
        assert_eq!(supports_reading(Format::Gif), cfg!(feature = "gif"));
        assert_eq!(supports_reading(Format::Psd), cfg!(feature = "psd"));
        assert!(!supports_reading(Format::Unknown));
        for f in [Format::Gif, Format::Psd, Format::Unknown] {
            assert!(!supports_writing(f));
            assert!(!supports_bit_depth(f, BitDepth::Bit8));
        }
    }

    #[test]
    fn test_depth_table() {
        assert_eq!(supports_bit_depth(Format::Jpeg, BitDepth::Bit32), false);
        assert_eq!(supports_bit_depth(Format::Jpeg, BitDepth::Bit24), cfg!(feature = "jpeg"));
        assert_eq!(supports_bit_depth(Format::Png, BitDepth::Bit64), cfg!(feature = "png"));
        assert_eq!(supports_bit_depth(Format::Bmp, BitDepth::Bit16), false);
    }

    #[test]
    fn test_bit_depth_mapping() {
        for bits in [8, 16, 24, 32, 48, 64] {
            let d = BitDepth::from_bits(bits).unwrap();
            assert_eq!(d.bits(), bits);
            assert_eq!(d.pixel_type().bits_per_pixel(), bits);
            assert_eq!(BitDepth::for_pixel_type(d.pixel_type()), Some(d));
        }
        assert_eq!(BitDepth::from_bits(12), None);
        assert_eq!(BitDepth::for_pixel_type(PixelType::F32), None);
    }
}
