//! Adobe Photoshop PSD support (read only).
//!
//! Reads the flattened composite through the `psd` crate. RGB documents
//! load as `Rgb8` (or `Rgba8` when the composite has transparency),
//! greyscale documents as `U8`. Other colour modes are refused.
//!
//! Samples deeper than 8 bits are reduced to 8 by the decoder; that loss is
//! reported to the sink.

use crate::{IoError, IoResult};
use psd::{ColorMode, Psd};
use raster_core::{DiagnosticSink, PixelBuffer, PixelType};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Decodes the composite image of a PSD held in memory.
pub fn decode(data: &[u8], sink: &dyn DiagnosticSink) -> IoResult<PixelBuffer> {
    let psd = Psd::from_bytes(data).map_err(|e| IoError::DecodeError(format!("PSD parse error: {e}")))?;

    let grey = match psd.color_mode() {
        ColorMode::Rgb => false,
        ColorMode::Grayscale => true,
        mode => {
            return Err(IoError::UnsupportedFormat(format!(
                "PSD color mode {mode:?} not supported, convert to RGB"
            )));
        }
    };
    let depth = psd.depth() as u8;
    if depth != 8 {
        sink.report(Some("PSD"), &format!("{depth}-bit channels reduced to 8-bit"));
    }
    debug!(
        width = psd.width(),
        height = psd.height(),
        layers = psd.layers().len(),
        "psd composite"
    );

    let (width, height) = (psd.width(), psd.height());
    let rgba = psd.rgba();
    if grey {
        let mut buf = PixelBuffer::allocate(width, height, PixelType::U8)?;
        for (y, row) in rgba.chunks_exact(width as usize * 4).enumerate() {
            for (dst, px) in buf.row_mut(y as u32).iter_mut().zip(row.chunks_exact(4)) {
                *dst = px[0];
            }
        }
        Ok(buf)
    } else {
        crate::engine::from_rgba8(width, height, &rgba)
    }
}
