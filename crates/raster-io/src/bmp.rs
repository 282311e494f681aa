//! BMP format support.
//!
//! Uncompressed Windows bitmaps with a `BITMAPINFOHEADER` or one of its
//! larger V4/V5 successors.
//!
//! # Features
//!
//! - 8-bit palette, 24-bit BGR and 32-bit BGRA
//! - Bottom-up and top-down row order on read
//! - Bottom-up output, rows padded to 4 bytes
//!
//! RLE compression and 1/4/16-bit depths are rejected with a decode error.

use crate::{IoError, IoResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use raster_core::{DiagnosticSink, Palette, PixelBuffer, PixelType, Rgba};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
#[allow(unused_imports)]
use tracing::{debug, trace};

const FILE_HEADER_SIZE: u32 = 14;
const INFO_HEADER_SIZE: u32 = 40;
const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

/// Pixels per metre written to the header (72 dpi).
const PELS_PER_METER: i32 = 2835;

fn decode_err(e: std::io::Error) -> IoError {
    IoError::DecodeError(format!("truncated BMP: {e}"))
}

/// Padded row length in bytes.
fn row_size(width: u32, bits: u32) -> usize {
    ((width as usize * bits as usize).div_ceil(32)) * 4
}

/// Decodes a BMP held in memory.
pub fn decode(data: &[u8], sink: &dyn DiagnosticSink) -> IoResult<PixelBuffer> {
    let mut r = Cursor::new(data);

    let mut magic = [0u8; 2];
    r.read_exact(&mut magic).map_err(decode_err)?;
    if &magic != b"BM" {
        return Err(IoError::DecodeError("missing BM signature".into()));
    }
    let _file_size = r.read_u32::<LittleEndian>().map_err(decode_err)?;
    let _reserved = r.read_u32::<LittleEndian>().map_err(decode_err)?;
    let pixel_offset = r.read_u32::<LittleEndian>().map_err(decode_err)?;

    let header_size = r.read_u32::<LittleEndian>().map_err(decode_err)?;
    if header_size < INFO_HEADER_SIZE {
        return Err(IoError::DecodeError(format!(
            "unsupported BMP header of {header_size} bytes"
        )));
    }
    let width = r.read_i32::<LittleEndian>().map_err(decode_err)?;
    let height = r.read_i32::<LittleEndian>().map_err(decode_err)?;
    let _planes = r.read_u16::<LittleEndian>().map_err(decode_err)?;
    let bits = r.read_u16::<LittleEndian>().map_err(decode_err)? as u32;
    let compression = r.read_u32::<LittleEndian>().map_err(decode_err)?;
    let _image_size = r.read_u32::<LittleEndian>().map_err(decode_err)?;
    let _xppm = r.read_i32::<LittleEndian>().map_err(decode_err)?;
    let _yppm = r.read_i32::<LittleEndian>().map_err(decode_err)?;
    let colours_used = r.read_u32::<LittleEndian>().map_err(decode_err)?;
    let _important = r.read_u32::<LittleEndian>().map_err(decode_err)?;

    if width <= 0 || height == 0 {
        return Err(IoError::DecodeError(format!("invalid BMP size {width}x{height}")));
    }
    let top_down = height < 0;
    let (w, h) = (width as u32, height.unsigned_abs());

    let pixel_type = match (bits, compression) {
        (8, BI_RGB) => PixelType::U8,
        (24, BI_RGB) => PixelType::Rgb8,
        (32, BI_RGB) | (32, BI_BITFIELDS) => PixelType::Rgba8,
        (b, c) => {
            return Err(IoError::DecodeError(format!(
                "unsupported BMP variant: {b} bits, compression {c}"
            )));
        }
    };
    if compression == BI_BITFIELDS {
        sink.report(Some("BMP"), "bit field masks ignored, assuming BGRA order");
    }

    let palette = if bits == 8 {
        r.seek(SeekFrom::Start((FILE_HEADER_SIZE + header_size) as u64))
            .map_err(decode_err)?;
        let count = if colours_used == 0 { 256 } else { colours_used.min(256) };
        let mut p = Palette::greyscale();
        for i in 0..count {
            let mut bgra = [0u8; 4];
            r.read_exact(&mut bgra).map_err(decode_err)?;
            p.set(i as u8, Rgba::rgb(bgra[2], bgra[1], bgra[0]));
        }
        Some(p)
    } else {
        None
    };

    let stride = row_size(w, bits);
    let start = pixel_offset as usize;
    let needed = stride * h as usize;
    let pixels = data
        .get(start..start + needed)
        .ok_or_else(|| IoError::DecodeError(format!("BMP pixel data shorter than {needed} bytes")))?;

    let mut buf = PixelBuffer::allocate(w, h, pixel_type)?;
    let bpp = pixel_type.bytes_per_pixel();
    let mut any_alpha = false;
    for y in 0..h {
        let src_y = if top_down { y } else { h - 1 - y };
        let src = &pixels[src_y as usize * stride..][..w as usize * bpp];
        let dst = buf.row_mut(y);
        if bpp == 1 {
            dst.copy_from_slice(src);
            continue;
        }
        for (d, s) in dst.chunks_exact_mut(bpp).zip(src.chunks_exact(bpp)) {
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
            if bpp == 4 {
                d[3] = s[3];
                any_alpha |= s[3] != 0;
            }
        }
    }

    if pixel_type == PixelType::Rgba8 && !any_alpha {
        // Plain 32-bit BMPs leave the fourth byte zero
        sink.report(Some("BMP"), "alpha channel empty, treating as opaque");
        for y in 0..h {
            for px in buf.row_mut(y).chunks_exact_mut(4) {
                px[3] = 255;
            }
        }
    }
    if let Some(p) = palette {
        buf.set_palette(p)?;
    }
    debug!(width = w, height = h, bits, "decoded BMP");
    Ok(buf)
}

/// Encodes `U8`, `Rgb8` or `Rgba8` as an uncompressed bottom-up BMP.
pub fn encode(buf: &PixelBuffer) -> IoResult<Vec<u8>> {
    let pixel_type = buf.pixel_type();
    let bits = match pixel_type {
        PixelType::U8 => 8,
        PixelType::Rgb8 => 24,
        PixelType::Rgba8 => 32,
        t => return Err(IoError::UnsupportedBitDepth(format!("BMP cannot store {t}"))),
    };
    let (w, h) = buf.dimensions();
    let stride = row_size(w, bits);
    let palette_size = if bits == 8 { 256 * 4 } else { 0 };
    let pixel_offset = FILE_HEADER_SIZE + INFO_HEADER_SIZE + palette_size;
    let image_size = (stride * h as usize) as u32;

    let mut out = Vec::with_capacity(pixel_offset as usize + image_size as usize);
    write_headers(&mut out, w, h, bits, pixel_offset, image_size)?;

    if bits == 8 {
        let palette = buf.palette().cloned().unwrap_or_else(Palette::greyscale);
        for c in palette.entries() {
            out.write_all(&[c.b, c.g, c.r, 0])?;
        }
    }

    let bpp = pixel_type.bytes_per_pixel();
    let mut line = vec![0u8; stride];
    for y in (0..h).rev() {
        let row = buf.row(y);
        if bpp == 1 {
            line[..row.len()].copy_from_slice(row);
        } else {
            for (d, s) in line.chunks_exact_mut(bpp).zip(row.chunks_exact(bpp)) {
                d[0] = s[2];
                d[1] = s[1];
                d[2] = s[0];
                if bpp == 4 {
                    d[3] = s[3];
                }
            }
        }
        out.write_all(&line)?;
    }
    trace!(width = w, height = h, bits, bytes = out.len(), "encoded BMP");
    Ok(out)
}

fn write_headers<W: Write>(
    out: &mut W,
    width: u32,
    height: u32,
    bits: u32,
    pixel_offset: u32,
    image_size: u32,
) -> std::io::Result<()> {
    out.write_all(b"BM")?;
    out.write_u32::<LittleEndian>(pixel_offset + image_size)?;
    out.write_u32::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(pixel_offset)?;

    out.write_u32::<LittleEndian>(INFO_HEADER_SIZE)?;
    out.write_i32::<LittleEndian>(width as i32)?;
    out.write_i32::<LittleEndian>(height as i32)?;
    out.write_u16::<LittleEndian>(1)?;
    out.write_u16::<LittleEndian>(bits as u16)?;
    out.write_u32::<LittleEndian>(BI_RGB)?;
    out.write_u32::<LittleEndian>(image_size)?;
    out.write_i32::<LittleEndian>(PELS_PER_METER)?;
    out.write_i32::<LittleEndian>(PELS_PER_METER)?;
    out.write_u32::<LittleEndian>(if bits == 8 { 256 } else { 0 })?;
    out.write_u32::<LittleEndian>(0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_core::diagnostics::CollectingSink;

    fn pattern(pixel_type: PixelType, w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::allocate(w, h, pixel_type).unwrap();
        for y in 0..h {
            for x in 0..w {
                for c in 0..buf.channels() {
                    buf.set_sample(x, y, c, ((x * 40 + y * 7 + c as u32 * 60) % 256) as f64);
                }
            }
        }
        buf
    }

    #[test]
    fn test_roundtrip_all_depths() {
        for t in [PixelType::U8, PixelType::Rgb8, PixelType::Rgba8] {
            // Odd width exercises row padding
            let src = pattern(t, 5, 3);
            let bytes = encode(&src).unwrap();
            assert_eq!(&bytes[..2], b"BM");
            let back = decode(&bytes, &CollectingSink::default()).unwrap();
            assert_eq!(back.pixel_type(), t);
            for y in 0..3 {
                assert_eq!(back.row(y), src.row(y), "{t} row {y}");
            }
        }
    }

    #[test]
    fn test_palette_preserved() {
        let mut src = pattern(PixelType::U8, 4, 4);
        let mut p = Palette::greyscale();
        p.set(0, Rgba::rgb(255, 0, 0));
        src.set_palette(p.clone()).unwrap();
        let back = decode(&encode(&src).unwrap(), &CollectingSink::default()).unwrap();
        assert_eq!(back.palette(), Some(&p));
    }

    #[test]
    fn test_empty_alpha_reported() {
        let mut src = pattern(PixelType::Rgba8, 2, 2);
        for y in 0..2 {
            for px in src.row_mut(y).chunks_exact_mut(4) {
                px[3] = 0;
            }
        }
        let sink = CollectingSink::default();
        let back = decode(&encode(&src).unwrap(), &sink).unwrap();
        assert_eq!(back.sample(1, 1, 3), 255.0);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_rejects_garbage() {
        let sink = CollectingSink::default();
        assert!(decode(b"PK\x03\x04", &sink).unwrap_err().is_decode_error());
        assert!(decode(b"BM\0\0", &sink).is_err());
        let f32buf = PixelBuffer::allocate(2, 2, PixelType::F32).unwrap();
        assert!(encode(&f32buf).unwrap_err().is_unsupported());
    }
}
