//! PNG format support.
//!
//! # Features
//!
//! - 8-bit and 16-bit greyscale, RGB and RGBA
//! - Palette images are expanded to RGB(A) on read
//! - `U8` buffers with a non-grey palette are written as indexed PNG
//! - Compression level control
//!
//! 16-bit samples are big-endian in the file and native in the buffer.

use crate::engine::PngCompression;
use crate::{IoError, IoResult};
use raster_core::{DiagnosticSink, PixelBuffer, PixelType};
use std::io::Cursor;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Decodes a PNG held in memory.
pub fn decode(data: &[u8], sink: &dyn DiagnosticSink) -> IoResult<PixelBuffer> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    if reader.info().color_type == png::ColorType::Indexed {
        sink.report(Some("PNG"), "palette image expanded to RGB");
    }

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut raw = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut raw)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    let raw = &raw[..info.buffer_size()];

    let pixel_type = match (info.color_type, info.bit_depth) {
        (png::ColorType::Grayscale, png::BitDepth::Eight) => PixelType::U8,
        (png::ColorType::Grayscale, png::BitDepth::Sixteen) => PixelType::U16,
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Eight) => PixelType::Rgba8,
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Sixteen) => PixelType::Rgba16,
        (png::ColorType::Rgb, png::BitDepth::Eight) => PixelType::Rgb8,
        (png::ColorType::Rgb, png::BitDepth::Sixteen) => PixelType::Rgb16,
        (png::ColorType::Rgba, png::BitDepth::Eight) => PixelType::Rgba8,
        (png::ColorType::Rgba, png::BitDepth::Sixteen) => PixelType::Rgba16,
        (color_type, bit_depth) => {
            return Err(IoError::UnsupportedBitDepth(format!("{color_type:?} {bit_depth:?}")));
        }
    };

    let grey_alpha = info.color_type == png::ColorType::GrayscaleAlpha;
    if grey_alpha {
        sink.report(Some("PNG"), "grey+alpha expanded to RGBA");
    }
    let wide = info.bit_depth == png::BitDepth::Sixteen;
    let src_channels = info.color_type.samples();

    let mut buf = PixelBuffer::allocate(info.width, info.height, pixel_type)?;
    let src_line = info.line_size;
    let channels = pixel_type.channels();
    let mut values = vec![0.0; info.width as usize * channels];
    for y in 0..info.height {
        let line = &raw[y as usize * src_line..][..src_line];
        let sample = |i: usize| -> f64 {
            if wide {
                u16::from_be_bytes([line[2 * i], line[2 * i + 1]]) as f64
            } else {
                line[i] as f64
            }
        };
        for x in 0..info.width as usize {
            let px = &mut values[x * channels..][..channels];
            if grey_alpha {
                let g = sample(x * 2);
                px.copy_from_slice(&[g, g, g, sample(x * 2 + 1)]);
            } else {
                for (c, v) in px.iter_mut().enumerate() {
                    *v = sample(x * src_channels + c);
                }
            }
        }
        buf.write_row(y, &values);
    }
    debug!(width = info.width, height = info.height, %pixel_type, "decoded PNG");
    Ok(buf)
}

/// Encodes an 8/16-bit greyscale, RGB or RGBA buffer.
pub fn encode(buf: &PixelBuffer, compression: PngCompression) -> IoResult<Vec<u8>> {
    let pixel_type = buf.pixel_type();
    let (color_type, depth) = match pixel_type {
        PixelType::U8 => (png::ColorType::Grayscale, png::BitDepth::Eight),
        PixelType::U16 => (png::ColorType::Grayscale, png::BitDepth::Sixteen),
        PixelType::Rgb8 => (png::ColorType::Rgb, png::BitDepth::Eight),
        PixelType::Rgba8 => (png::ColorType::Rgba, png::BitDepth::Eight),
        PixelType::Rgb16 => (png::ColorType::Rgb, png::BitDepth::Sixteen),
        PixelType::Rgba16 => (png::ColorType::Rgba, png::BitDepth::Sixteen),
        t => return Err(IoError::UnsupportedBitDepth(format!("PNG cannot store {t}"))),
    };
    let indexed = buf.palette().filter(|p| !p.is_linear_greyscale());

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, buf.width(), buf.height());
        match indexed {
            Some(p) => {
                encoder.set_color(png::ColorType::Indexed);
                let rgb: Vec<u8> = p.entries().iter().flat_map(|c| [c.r, c.g, c.b]).collect();
                encoder.set_palette(rgb);
            }
            None => encoder.set_color(color_type),
        }
        encoder.set_depth(depth);
        encoder.set_compression(match compression {
            PngCompression::Fast => png::Compression::Fast,
            PngCompression::Default => png::Compression::default(),
        });

        let mut writer = encoder
            .write_header()
            .map_err(|e| IoError::EncodeError(e.to_string()))?;

        let mut data = Vec::with_capacity(buf.line_bytes() * buf.height() as usize);
        let mut values = vec![0.0; buf.width() as usize * buf.channels()];
        for y in 0..buf.height() {
            if depth == png::BitDepth::Sixteen {
                buf.read_row(y, &mut values);
                data.extend(values.iter().flat_map(|&v| (v as u16).to_be_bytes()));
            } else {
                data.extend_from_slice(buf.row(y));
            }
        }
        writer
            .write_image_data(&data)
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
    }
    trace!(bytes = out.len(), indexed = indexed.is_some(), "encoded PNG");
    Ok(out)
}
