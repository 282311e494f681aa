//! JPEG format support.
//!
//! Reads greyscale, RGB and CMYK baseline/progressive JPEGs through
//! `jpeg-decoder` and writes greyscale or RGB through `jpeg-encoder`.
//!
//! CMYK input is converted to RGB with the naive `(1 - c)(1 - k)` formula and
//! reported to the diagnostic sink. 16-bit greyscale (lossless JPEG) loads
//! as `U16`.

use crate::{IoError, IoResult};
use raster_core::{DiagnosticSink, PixelBuffer, PixelType, RowOrder};
use std::io::Cursor;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Decodes a JPEG held in memory.
pub fn decode(data: &[u8], sink: &dyn DiagnosticSink) -> IoResult<PixelBuffer> {
    let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(data));
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

    let (width, height) = (info.width as u32, info.height as u32);
    let buf = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => {
            PixelBuffer::from_raw(&pixels, width, height, None, PixelType::U8, RowOrder::TopDown)?
        }
        jpeg_decoder::PixelFormat::RGB24 => {
            PixelBuffer::from_raw(&pixels, width, height, None, PixelType::Rgb8, RowOrder::TopDown)?
        }
        jpeg_decoder::PixelFormat::L16 => {
            let mut buf = PixelBuffer::allocate(width, height, PixelType::U16)?;
            let mut row = vec![0.0; width as usize];
            for (y, line) in pixels.chunks_exact(width as usize * 2).enumerate() {
                for (v, be) in row.iter_mut().zip(line.chunks_exact(2)) {
                    *v = u16::from_be_bytes([be[0], be[1]]) as f64;
                }
                buf.write_row(y as u32, &row);
            }
            buf
        }
        jpeg_decoder::PixelFormat::CMYK32 => {
            sink.report(Some("JPEG"), "CMYK image converted to RGB without colour management");
            let rgb: Vec<u8> = pixels
                .chunks_exact(4)
                .flat_map(|cmyk| {
                    let k = 1.0 - cmyk[3] as f32 / 255.0;
                    let ch = |v: u8| ((1.0 - v as f32 / 255.0) * k * 255.0).round() as u8;
                    [ch(cmyk[0]), ch(cmyk[1]), ch(cmyk[2])]
                })
                .collect();
            PixelBuffer::from_raw(&rgb, width, height, None, PixelType::Rgb8, RowOrder::TopDown)?
        }
    };
    debug!(width, height, format = ?info.pixel_format, "decoded JPEG");
    Ok(buf)
}

/// Encodes a `U8` or `Rgb8` buffer.
///
/// `U8` buffers with a colour palette are stored as the palette's luma.
pub fn encode(buf: &PixelBuffer, quality: u8) -> IoResult<Vec<u8>> {
    use jpeg_encoder::{ColorType, Encoder};

    let (w, h) = buf.dimensions();
    if w > u16::MAX as u32 || h > u16::MAX as u32 {
        return Err(IoError::EncodeError(format!("{w}x{h} exceeds the JPEG size limit")));
    }
    let (color_type, data) = match buf.pixel_type() {
        PixelType::U8 => {
            let data = match buf.palette().filter(|p| !p.is_linear_greyscale()) {
                Some(p) => buf
                    .rows()
                    .flat_map(|row| row.iter().map(|&i| p.get(i).luma().round() as u8))
                    .collect(),
                None => buf.to_raw(false, RowOrder::TopDown),
            };
            (ColorType::Luma, data)
        }
        PixelType::Rgb8 => (ColorType::Rgb, buf.to_raw(false, RowOrder::TopDown)),
        t => return Err(IoError::UnsupportedBitDepth(format!("JPEG cannot store {t}"))),
    };

    let mut out = Vec::new();
    let encoder = Encoder::new(&mut out, quality.clamp(1, 100));
    encoder
        .encode(&data, w as u16, h as u16, color_type)
        .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;
    trace!(bytes = out.len(), quality, "encoded JPEG");
    Ok(out)
}
