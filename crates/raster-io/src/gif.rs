//! GIF format support (read only).
//!
//! The first frame is decoded through the `image` crate and returned as
//! `Rgb8`, or `Rgba8` when the frame uses transparency. GIF has no writer
//! here; save as PNG for lossless indexed output.

use crate::{IoError, IoResult};
use image::ImageFormat;
use raster_core::{DiagnosticSink, PixelBuffer};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Decodes the first frame of a GIF held in memory.
pub fn decode(data: &[u8], sink: &dyn DiagnosticSink) -> IoResult<PixelBuffer> {
    let image = image::load_from_memory_with_format(data, ImageFormat::Gif)
        .map_err(|e| IoError::DecodeError(format!("GIF: {e}")))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    trace!(width, height, "gif frame decoded");
    let buf = crate::engine::from_rgba8(width, height, rgba.as_raw())?;
    if buf.pixel_type().has_alpha() {
        sink.report(Some("GIF"), "transparent palette entry kept as alpha");
    }
    Ok(buf)
}
