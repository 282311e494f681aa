//! Pixel type tags, sample encodings and palette entries.
//!
//! # Overview
//!
//! A [`PixelBuffer`](crate::PixelBuffer) stores untyped bytes; the [`PixelType`]
//! tag says how to read them. Every type is a fixed number of samples of one
//! [`SampleKind`]:
//!
//! | Type | Samples | Sample | Bits per pixel |
//! |------|---------|--------|----------------|
//! | `U8` / `I8` | 1 | 8-bit | 8 |
//! | `U16` / `I16` | 1 | 16-bit | 16 |
//! | `U32` / `I32` / `F32` | 1 | 32-bit | 32 |
//! | `F64` | 1 | f64 | 64 |
//! | `Complex` | 2 (re, im) | f64 | 128 |
//! | `Rgb8` / `Rgba8` | 3 / 4 | u8 | 24 / 32 |
//! | `Rgb16` / `Rgba16` | 3 / 4 | u16 | 48 / 64 |
//! | `RgbF` / `RgbaF` | 3 / 4 | f32 | 96 / 128 |
//!
//! Samples are stored in native byte order. Colour channels are stored R, G, B, A.
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{PixelType, SampleKind};
//!
//! assert_eq!(PixelType::Rgb8.bits_per_pixel(), 24);
//! assert_eq!(PixelType::from_bits_per_pixel(16), Some(PixelType::U16));
//! assert_eq!(PixelType::I16.max_value(), Some(32767.0));
//! assert_eq!(PixelType::RgbF.sample(), SampleKind::F32);
//! ```

use std::fmt;
use std::str::FromStr;

/// Rec. 709 luma weights for R, G, B.
pub const REC709_LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Weighted Rec. 709 luminance of an RGB triple.
#[inline]
pub fn luminance_rec709(r: f64, g: f64, b: f64) -> f64 {
    REC709_LUMA[0] * r + REC709_LUMA[1] * g + REC709_LUMA[2] * b
}

// ============================================================================
// Sample encoding
// ============================================================================

/// Storage encoding of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
}

impl SampleKind {
    /// Size of one sample in bytes.
    #[inline]
    pub const fn bytes(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Returns true for floating point samples.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Largest representable value.
    pub const fn max_value(&self) -> f64 {
        match self {
            Self::U8 => u8::MAX as f64,
            Self::I8 => i8::MAX as f64,
            Self::U16 => u16::MAX as f64,
            Self::I16 => i16::MAX as f64,
            Self::U32 => u32::MAX as f64,
            Self::I32 => i32::MAX as f64,
            Self::F32 => f32::MAX as f64,
            Self::F64 => f64::MAX,
        }
    }

    /// Smallest representable value.
    pub const fn min_value(&self) -> f64 {
        match self {
            Self::U8 | Self::U16 | Self::U32 => 0.0,
            Self::I8 => i8::MIN as f64,
            Self::I16 => i16::MIN as f64,
            Self::I32 => i32::MIN as f64,
            Self::F32 => f32::MIN as f64,
            Self::F64 => f64::MIN,
        }
    }

    /// Decodes one sample from the start of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`bytes()`](Self::bytes).
    #[inline]
    pub fn read(&self, bytes: &[u8]) -> f64 {
        match self {
            Self::U8 => bytes[0] as f64,
            Self::I8 => bytes[0] as i8 as f64,
            Self::U16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as f64,
            Self::I16 => i16::from_ne_bytes([bytes[0], bytes[1]]) as f64,
            Self::U32 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::I32 => i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::F32 => f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::F64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                f64::from_ne_bytes(raw)
            }
        }
    }

    /// Encodes `value` into the start of `bytes`.
    ///
    /// Integer samples round to nearest and saturate at the type limits;
    /// NaN stores as zero.
    #[inline]
    pub fn write(&self, value: f64, bytes: &mut [u8]) {
        match self {
            Self::U8 => bytes[0] = value.round() as u8,
            Self::I8 => bytes[0] = (value.round() as i8) as u8,
            Self::U16 => bytes[..2].copy_from_slice(&(value.round() as u16).to_ne_bytes()),
            Self::I16 => bytes[..2].copy_from_slice(&(value.round() as i16).to_ne_bytes()),
            Self::U32 => bytes[..4].copy_from_slice(&(value.round() as u32).to_ne_bytes()),
            Self::I32 => bytes[..4].copy_from_slice(&(value.round() as i32).to_ne_bytes()),
            Self::F32 => bytes[..4].copy_from_slice(&(value as f32).to_ne_bytes()),
            Self::F64 => bytes[..8].copy_from_slice(&value.to_ne_bytes()),
        }
    }
}

// ============================================================================
// Pixel type
// ============================================================================

/// Closed set of pixel representations a buffer can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PixelType {
    /// 8-bit unsigned greyscale or palette index.
    U8,
    /// 8-bit signed greyscale.
    I8,
    /// 16-bit unsigned greyscale.
    U16,
    /// 16-bit signed greyscale.
    I16,
    /// 32-bit unsigned greyscale.
    U32,
    /// 32-bit signed greyscale.
    I32,
    /// 32-bit float greyscale.
    F32,
    /// 64-bit float greyscale.
    F64,
    /// Complex number as two f64 (real, imaginary).
    Complex,
    /// 24-bit RGB.
    Rgb8,
    /// 32-bit RGBA.
    Rgba8,
    /// 48-bit RGB.
    Rgb16,
    /// 64-bit RGBA.
    Rgba16,
    /// 96-bit float RGB.
    RgbF,
    /// 128-bit float RGBA.
    RgbaF,
}

impl PixelType {
    /// Every pixel type, in declaration order.
    pub const ALL: [PixelType; 15] = [
        Self::U8,
        Self::I8,
        Self::U16,
        Self::I16,
        Self::U32,
        Self::I32,
        Self::F32,
        Self::F64,
        Self::Complex,
        Self::Rgb8,
        Self::Rgba8,
        Self::Rgb16,
        Self::Rgba16,
        Self::RgbF,
        Self::RgbaF,
    ];

    /// Encoding of each sample.
    #[inline]
    pub const fn sample(&self) -> SampleKind {
        match self {
            Self::U8 | Self::Rgb8 | Self::Rgba8 => SampleKind::U8,
            Self::I8 => SampleKind::I8,
            Self::U16 | Self::Rgb16 | Self::Rgba16 => SampleKind::U16,
            Self::I16 => SampleKind::I16,
            Self::U32 => SampleKind::U32,
            Self::I32 => SampleKind::I32,
            Self::F32 | Self::RgbF | Self::RgbaF => SampleKind::F32,
            Self::F64 | Self::Complex => SampleKind::F64,
        }
    }

    /// Samples per pixel.
    #[inline]
    pub const fn channels(&self) -> usize {
        match self {
            Self::Complex => 2,
            Self::Rgb8 | Self::Rgb16 | Self::RgbF => 3,
            Self::Rgba8 | Self::Rgba16 | Self::RgbaF => 4,
            _ => 1,
        }
    }

    /// Bytes per pixel.
    #[inline]
    pub const fn bytes_per_pixel(&self) -> usize {
        self.sample().bytes() * self.channels()
    }

    /// Bits per pixel (the "bit depth" of the whole pixel, not one channel).
    #[inline]
    pub const fn bits_per_pixel(&self) -> u32 {
        (self.bytes_per_pixel() * 8) as u32
    }

    /// Returns true for RGB and RGBA types.
    #[inline]
    pub const fn is_colour(&self) -> bool {
        matches!(
            self,
            Self::Rgb8 | Self::Rgba8 | Self::Rgb16 | Self::Rgba16 | Self::RgbF | Self::RgbaF
        )
    }

    /// Returns true when the last channel is alpha.
    #[inline]
    pub const fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba8 | Self::Rgba16 | Self::RgbaF)
    }

    /// Returns true for float sample types, including complex.
    #[inline]
    pub const fn is_float(&self) -> bool {
        self.sample().is_float()
    }

    /// Returns true for signed integer types.
    #[inline]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32)
    }

    /// Returns true for the complex type.
    #[inline]
    pub const fn is_complex(&self) -> bool {
        matches!(self, Self::Complex)
    }

    /// Returns true for display types (8-bit grey, 24-bit and 32-bit colour).
    #[inline]
    pub const fn is_standard(&self) -> bool {
        matches!(self, Self::U8 | Self::Rgb8 | Self::Rgba8)
    }

    /// Largest representable channel value, `None` for complex.
    pub fn max_value(&self) -> Option<f64> {
        match self {
            Self::Complex => None,
            _ => Some(self.sample().max_value()),
        }
    }

    /// Smallest representable channel value, `None` for complex.
    pub fn min_value(&self) -> Option<f64> {
        match self {
            Self::Complex => None,
            _ => Some(self.sample().min_value()),
        }
    }

    /// Range a value is considered to span before scaling.
    ///
    /// Integer types span their full representable range; float types are
    /// treated as normalized `[0, 1]`.
    pub fn natural_range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Complex => None,
            t if t.is_float() => Some((0.0, 1.0)),
            t => Some((t.sample().min_value(), t.sample().max_value())),
        }
    }

    /// Picks the default type for a bit depth.
    ///
    /// 8 and 16 map to greyscale, 24 and 32 to 8-bit colour, wider depths to
    /// 16-bit and float colour.
    pub const fn from_bits_per_pixel(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::U8),
            16 => Some(Self::U16),
            24 => Some(Self::Rgb8),
            32 => Some(Self::Rgba8),
            48 => Some(Self::Rgb16),
            64 => Some(Self::Rgba16),
            96 => Some(Self::RgbF),
            128 => Some(Self::RgbaF),
            _ => None,
        }
    }

    /// Single-channel type with the same sample encoding.
    pub const fn greyscale_equivalent(&self) -> Self {
        match self {
            Self::Rgb8 | Self::Rgba8 => Self::U8,
            Self::Rgb16 | Self::Rgba16 => Self::U16,
            Self::RgbF | Self::RgbaF => Self::F32,
            other => *other,
        }
    }

    /// Byte masks of R, G, B, A inside a little-endian packed pixel.
    pub const fn channel_masks(&self) -> Option<ChannelMasks> {
        match self {
            Self::Rgb8 => Some(ChannelMasks {
                red: 0x0000_00FF,
                green: 0x0000_FF00,
                blue: 0x00FF_0000,
                alpha: 0,
            }),
            Self::Rgba8 => Some(ChannelMasks {
                red: 0x0000_00FF,
                green: 0x0000_FF00,
                blue: 0x00FF_0000,
                alpha: 0xFF00_0000,
            }),
            _ => None,
        }
    }

    /// Lowercase name used in messages and on the command line.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Complex => "complex",
            Self::Rgb8 => "rgb8",
            Self::Rgba8 => "rgba8",
            Self::Rgb16 => "rgb16",
            Self::Rgba16 => "rgba16",
            Self::RgbF => "rgbf",
            Self::RgbaF => "rgbaf",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown pixel type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pixel type '{0}'")]
pub struct ParsePixelTypeError(pub String);

impl FromStr for PixelType {
    type Err = ParsePixelTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let alias = match lower.as_str() {
            "grey" | "gray" | "byte" => "u8",
            "float" => "f32",
            "double" => "f64",
            "rgb" | "rgb24" => "rgb8",
            "rgba" | "rgba32" => "rgba8",
            other => other,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == alias)
            .ok_or_else(|| ParsePixelTypeError(s.to_string()))
    }
}

/// Bit masks describing channel placement in a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMasks {
    /// Red channel mask
    pub red: u32,
    /// Green channel mask
    pub green: u32,
    /// Blue channel mask
    pub blue: u32,
    /// Alpha channel mask, zero when absent
    pub alpha: u32,
}

// ============================================================================
// Colour and palette
// ============================================================================

/// 8-bit RGBA colour, used for palette entries and drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha (255 = opaque)
    pub a: u8,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Creates a colour with explicit alpha.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque colour.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque grey of the given level.
    #[inline]
    pub const fn grey(level: u8) -> Self {
        Self::rgb(level, level, level)
    }

    /// Returns true when R, G and B are equal.
    #[inline]
    pub const fn is_grey(&self) -> bool {
        self.r == self.g && self.g == self.b
    }

    /// Rec. 709 luminance in `[0, 255]`.
    #[inline]
    pub fn luma(&self) -> f64 {
        luminance_rec709(self.r as f64, self.g as f64, self.b as f64)
    }

    /// Channels as an array in storage order.
    #[inline]
    pub const fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// 256-entry colour table attached to 8-bit buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Box<[Rgba; 256]>,
}

impl Palette {
    /// Linear grey ramp: entry `i` is `(i, i, i)`.
    pub fn greyscale() -> Self {
        let mut entries = Box::new([Rgba::BLACK; 256]);
        for (i, e) in entries.iter_mut().enumerate() {
            *e = Rgba::grey(i as u8);
        }
        Self { entries }
    }

    /// Builds a palette from explicit entries.
    pub fn from_entries(entries: [Rgba; 256]) -> Self {
        Self {
            entries: Box::new(entries),
        }
    }

    /// Entry for an index.
    #[inline]
    pub fn get(&self, index: u8) -> Rgba {
        self.entries[index as usize]
    }

    /// Overwrites one entry.
    #[inline]
    pub fn set(&mut self, index: u8, colour: Rgba) {
        self.entries[index as usize] = colour;
    }

    /// All entries.
    pub fn entries(&self) -> &[Rgba; 256] {
        &self.entries
    }

    /// True when every entry is grey.
    pub fn is_greyscale(&self) -> bool {
        self.entries.iter().all(Rgba::is_grey)
    }

    /// True for the identity grey ramp.
    pub fn is_linear_greyscale(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, e)| *e == Rgba::grey(i as u8))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::greyscale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_depths() {
        for bpp in [8, 16, 24, 32, 48, 64, 96, 128] {
            let t = PixelType::from_bits_per_pixel(bpp).unwrap();
            assert_eq!(t.bits_per_pixel(), bpp);
        }
        assert_eq!(PixelType::Complex.bits_per_pixel(), 128);
        assert_eq!(PixelType::from_bits_per_pixel(12), None);
    }

    #[test]
    fn test_max_values() {
        assert_eq!(PixelType::U8.max_value(), Some(255.0));
        assert_eq!(PixelType::U16.max_value(), Some(65535.0));
        assert_eq!(PixelType::I16.max_value(), Some(32767.0));
        assert_eq!(PixelType::I32.max_value(), Some(i32::MAX as f64));
        assert_eq!(PixelType::F32.max_value(), Some(f32::MAX as f64));
        assert_eq!(PixelType::Complex.max_value(), None);
        assert_eq!(PixelType::I8.min_value(), Some(-128.0));
    }

    #[test]
    fn test_sample_saturation() {
        let mut buf = [0u8; 8];
        SampleKind::U8.write(300.0, &mut buf);
        assert_eq!(buf[0], 255);
        SampleKind::U8.write(-4.0, &mut buf);
        assert_eq!(buf[0], 0);
        SampleKind::U8.write(127.5, &mut buf);
        assert_eq!(buf[0], 128);
        SampleKind::I16.write(-40000.0, &mut buf);
        assert_eq!(SampleKind::I16.read(&buf), -32768.0);
        SampleKind::F64.write(0.125, &mut buf);
        assert_eq!(SampleKind::F64.read(&buf), 0.125);
    }

    #[test]
    fn test_parse_names() {
        for t in PixelType::ALL {
            assert_eq!(t.name().parse::<PixelType>().unwrap(), t);
        }
        assert_eq!("RGB".parse::<PixelType>().unwrap(), PixelType::Rgb8);
        assert_eq!("float".parse::<PixelType>().unwrap(), PixelType::F32);
        assert!("rgb12".parse::<PixelType>().is_err());
    }

    #[test]
    fn test_palette() {
        let mut p = Palette::greyscale();
        assert!(p.is_greyscale());
        assert!(p.is_linear_greyscale());
        assert_eq!(p.get(200), Rgba::grey(200));
        p.set(3, Rgba::rgb(255, 0, 0));
        assert!(!p.is_greyscale());
    }

    #[test]
    fn test_luma() {
        assert!((Rgba::WHITE.luma() - 255.0).abs() < 1e-9);
        assert_eq!(Rgba::BLACK.luma(), 0.0);
    }
}
