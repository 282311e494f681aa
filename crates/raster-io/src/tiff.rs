//! TIFF format support.
//!
//! TIFF is the only container here that stores every scalar pixel type, so
//! it is the lossless choice for scientific data.
//!
//! # Features
//!
//! - 8/16/32-bit unsigned, 16/32-bit signed and 32/64-bit float greyscale
//! - 8/16-bit and float RGB and RGBA
//! - Grey+alpha is expanded to RGBA on read

use crate::{IoError, IoResult};
use raster_core::{DiagnosticSink, PixelBuffer, PixelType};
use std::io::Cursor;
#[allow(unused_imports)]
use tracing::{debug, trace};

fn decode_err(e: tiff::TiffError) -> IoError {
    IoError::DecodeError(e.to_string())
}

/// Flattens decoded samples to f64.
fn widen<T: Copy + Into<f64>>(v: &[T]) -> Vec<f64> {
    v.iter().map(|&s| s.into()).collect()
}

/// Decodes the first image of a TIFF held in memory.
pub fn decode(data: &[u8], sink: &dyn DiagnosticSink) -> IoResult<PixelBuffer> {
    use tiff::ColorType;
    use tiff::decoder::{Decoder, DecodingResult};

    let mut decoder = Decoder::new(Cursor::new(data)).map_err(decode_err)?;
    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let color_type = decoder.colortype().map_err(decode_err)?;
    let result = decoder.read_image().map_err(decode_err)?;

    let (pixel_type, values) = match (color_type, &result) {
        (ColorType::Gray(8), DecodingResult::U8(v)) => (PixelType::U8, widen(v)),
        (ColorType::Gray(8), DecodingResult::I8(v)) => (PixelType::I8, widen(v)),
        (ColorType::Gray(16), DecodingResult::U16(v)) => (PixelType::U16, widen(v)),
        (ColorType::Gray(16), DecodingResult::I16(v)) => (PixelType::I16, widen(v)),
        (ColorType::Gray(32), DecodingResult::U32(v)) => (PixelType::U32, widen(v)),
        (ColorType::Gray(32), DecodingResult::I32(v)) => (PixelType::I32, widen(v)),
        (ColorType::Gray(32), DecodingResult::F32(v)) => (PixelType::F32, widen(v)),
        (ColorType::Gray(64), DecodingResult::F64(v)) => (PixelType::F64, v.clone()),
        (ColorType::RGB(8), DecodingResult::U8(v)) => (PixelType::Rgb8, widen(v)),
        (ColorType::RGB(16), DecodingResult::U16(v)) => (PixelType::Rgb16, widen(v)),
        (ColorType::RGB(32), DecodingResult::F32(v)) => (PixelType::RgbF, widen(v)),
        (ColorType::RGBA(8), DecodingResult::U8(v)) => (PixelType::Rgba8, widen(v)),
        (ColorType::RGBA(16), DecodingResult::U16(v)) => (PixelType::Rgba16, widen(v)),
        (ColorType::RGBA(32), DecodingResult::F32(v)) => (PixelType::RgbaF, widen(v)),
        (ColorType::GrayA(8), DecodingResult::U8(v)) => {
            sink.report(Some("TIFF"), "grey+alpha expanded to RGBA");
            let rgba = v.chunks_exact(2).flat_map(|ga| {
                let (g, a) = (ga[0] as f64, ga[1] as f64);
                [g, g, g, a]
            });
            (PixelType::Rgba8, rgba.collect())
        }
        (ct, _) => {
            return Err(IoError::DecodeError(format!("unsupported TIFF color type: {ct:?}")));
        }
    };

    let mut buf = PixelBuffer::allocate(width, height, pixel_type)?;
    let line = width as usize * pixel_type.channels();
    if values.len() < line * height as usize {
        return Err(IoError::DecodeError("TIFF strip data shorter than the image".into()));
    }
    for (y, row) in values.chunks_exact(line).take(height as usize).enumerate() {
        buf.write_row(y as u32, row);
    }
    debug!(width, height, %pixel_type, "decoded TIFF");
    Ok(buf)
}

/// All samples of `buf` in row order, cast with `f`.
fn samples<T>(buf: &PixelBuffer, f: impl Fn(f64) -> T) -> Vec<T> {
    let mut row = vec![0.0; buf.width() as usize * buf.channels()];
    let mut out = Vec::with_capacity(row.len() * buf.height() as usize);
    for y in 0..buf.height() {
        buf.read_row(y, &mut row);
        out.extend(row.iter().map(|&v| f(v)));
    }
    out
}

/// Encodes any non-complex buffer except `I8`.
pub fn encode(buf: &PixelBuffer) -> IoResult<Vec<u8>> {
    use tiff::encoder::{TiffEncoder, colortype};

    let mut out = Vec::new();
    {
        let mut encoder = TiffEncoder::new(Cursor::new(&mut out))
            .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?;
        let (w, h) = buf.dimensions();

        macro_rules! write_as {
            ($ct:ty, $cast:expr) => {
                encoder
                    .write_image::<$ct>(w, h, &samples(buf, $cast))
                    .map_err(|e: tiff::TiffError| IoError::EncodeError(e.to_string()))?
            };
        }

        match buf.pixel_type() {
            PixelType::U8 => write_as!(colortype::Gray8, |v| v as u8),
            PixelType::U16 => write_as!(colortype::Gray16, |v| v as u16),
            PixelType::U32 => write_as!(colortype::Gray32, |v| v as u32),
            PixelType::I16 => write_as!(colortype::GrayI16, |v| v as i16),
            PixelType::I32 => write_as!(colortype::GrayI32, |v| v as i32),
            PixelType::F32 => write_as!(colortype::Gray32Float, |v| v as f32),
            PixelType::F64 => write_as!(colortype::Gray64Float, |v| v),
            PixelType::Rgb8 => write_as!(colortype::RGB8, |v| v as u8),
            PixelType::Rgb16 => write_as!(colortype::RGB16, |v| v as u16),
            PixelType::RgbF => write_as!(colortype::RGB32Float, |v| v as f32),
            PixelType::Rgba8 => write_as!(colortype::RGBA8, |v| v as u8),
            PixelType::Rgba16 => write_as!(colortype::RGBA16, |v| v as u16),
            PixelType::RgbaF => write_as!(colortype::RGBA32Float, |v| v as f32),
            t => return Err(IoError::UnsupportedBitDepth(format!("TIFF cannot store {t}"))),
        }
    }
    trace!(bytes = out.len(), "encoded TIFF");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_core::diagnostics::CollectingSink;

    fn ramp(pixel_type: PixelType, w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::allocate(w, h, pixel_type).unwrap();
        for y in 0..h {
            for x in 0..w {
                for c in 0..buf.channels() {
                    let v = (x + y * w) as f64 * 3.0 + c as f64;
                    let v = if pixel_type.is_float() { v / 100.0 } else if pixel_type.is_signed() { v - 20.0 } else { v };
                    buf.set_sample(x, y, c, v);
                }
            }
        }
        buf
    }

    #[test]
    fn test_roundtrip_lossless() {
        for t in [
            PixelType::U8,
            PixelType::U16,
            PixelType::U32,
            PixelType::I16,
            PixelType::I32,
            PixelType::F32,
            PixelType::F64,
            PixelType::Rgb8,
            PixelType::Rgb16,
            PixelType::RgbF,
            PixelType::Rgba8,
            PixelType::Rgba16,
            PixelType::RgbaF,
        ] {
            let src = ramp(t, 6, 4);
            let bytes = encode(&src).unwrap();
            let back = decode(&bytes, &CollectingSink::default()).unwrap();
            assert_eq!(back.pixel_type(), t);
            for y in 0..4 {
                assert_eq!(back.row(y), src.row(y), "{t}");
            }
        }
    }

    #[test]
    fn test_complex_rejected() {
        let buf = PixelBuffer::allocate(2, 2, PixelType::Complex).unwrap();
        assert!(encode(&buf).unwrap_err().is_unsupported());
        assert!(decode(b"II*\0\0\0\0\0", &CollectingSink::default()).is_err());
    }
}
