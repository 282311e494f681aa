//! Load/save engine.
//!
//! [`ImageIo`] owns an [`IoConfig`] and routes files to the compiled-in
//! codecs. Saving takes a [`BitDepth`] and converts the buffer to the pixel
//! type stored at that depth first. Non-standard data bound for an 8-bit
//! depth is stretched over its found range on the way. A colour request for
//! an image whose pixels are all grey is stored as 8-bit greyscale instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use raster_io::{BitDepth, ImageIo, IoConfig};
//!
//! let io = ImageIo::new(IoConfig::default().with_jpeg_quality(80));
//! let buf = io.load("scan.tif")?;
//! io.save(&buf, "preview.jpg", BitDepth::Bit24)?;
//! # Ok::<(), raster_io::IoError>(())
//! ```

use crate::detect::Format;
use crate::registry::{BitDepth, supports_bit_depth, supports_reading, supports_writing};
use crate::{IoError, IoResult};
use raster_core::{DiagnosticSink, PixelBuffer, PixelType, TracingSink};
use raster_ops::convert::{can_convert, convert_to_standard_type, convert_to_type};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::{debug, trace};

// ============================================================================
// Configuration
// ============================================================================

/// Default JPEG encoder quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Deflate effort used when writing PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngCompression {
    /// Faster, larger files.
    Fast,
    /// The encoder's default balance.
    #[default]
    Default,
}

/// Codec settings and the diagnostic sink for one engine.
#[derive(Clone)]
pub struct IoConfig {
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    /// PNG deflate effort.
    pub png_compression: PngCompression,
    /// Receiver for non-fatal codec messages.
    pub sink: Arc<dyn DiagnosticSink>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            png_compression: PngCompression::default(),
            sink: Arc::new(TracingSink),
        }
    }
}

impl fmt::Debug for IoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoConfig")
            .field("jpeg_quality", &self.jpeg_quality)
            .field("png_compression", &self.png_compression)
            .finish_non_exhaustive()
    }
}

impl IoConfig {
    /// Sets JPEG quality (clamped to 1..=100 at encode time).
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Sets PNG compression.
    pub fn with_png_compression(mut self, compression: PngCompression) -> Self {
        self.png_compression = compression;
        self
    }

    /// Replaces the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }
}

// ============================================================================
// Engine
// ============================================================================

/// File I/O engine.
#[derive(Debug, Clone, Default)]
pub struct ImageIo {
    config: IoConfig,
}

impl ImageIo {
    /// Creates an engine with `config`.
    pub fn new(config: IoConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    /// Loads a file, detecting its format by signature then extension.
    ///
    /// # Errors
    ///
    /// [`IoError::Io`] if the file cannot be read, [`IoError::UnsupportedFormat`]
    /// for formats without a reader, [`IoError::DecodeError`] for corrupt data.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> IoResult<PixelBuffer> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let format = match Format::from_bytes(&bytes) {
            Format::Unknown => Format::from_extension(path),
            f => f,
        };
        debug!(path = %path.display(), %format, bytes = bytes.len(), "load");
        self.decode(format, &bytes)
    }

    /// Decodes an in-memory file, detecting its format by signature.
    pub fn load_from_memory(&self, bytes: &[u8]) -> IoResult<PixelBuffer> {
        self.decode(Format::from_bytes(bytes), bytes)
    }

    fn decode(&self, format: Format, bytes: &[u8]) -> IoResult<PixelBuffer> {
        if !supports_reading(format) {
            return Err(IoError::UnsupportedFormat(format!("no reader for {format}")));
        }
        let sink = self.config.sink.as_ref();
        match format {
            #[cfg(feature = "bmp")]
            Format::Bmp => crate::bmp::decode(bytes, sink),
            #[cfg(feature = "png")]
            Format::Png => crate::png::decode(bytes, sink),
            #[cfg(feature = "jpeg")]
            Format::Jpeg => crate::jpeg::decode(bytes, sink),
            #[cfg(feature = "tiff")]
            Format::Tiff => crate::tiff::decode(bytes, sink),
            #[cfg(feature = "gif")]
            Format::Gif => crate::gif::decode(bytes, sink),
            #[cfg(feature = "psd")]
            Format::Psd => crate::psd::decode(bytes, sink),
            _ => Err(IoError::UnsupportedFormat(format.to_string())),
        }
    }

    /// Saves `buf` at `depth`, choosing the format from the extension.
    ///
    /// # Errors
    ///
    /// [`IoError::UnsupportedFormat`] for unknown or read-only formats,
    /// [`IoError::UnsupportedBitDepth`] when the format cannot store `depth`.
    pub fn save<P: AsRef<Path>>(&self, buf: &PixelBuffer, path: P, depth: BitDepth) -> IoResult<()> {
        let path = path.as_ref();
        let format = Format::from_extension(path);
        debug!(path = %path.display(), %format, %depth, "save");
        let bytes = self.save_to_memory(buf, format, depth)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Encodes `buf` as `format` at `depth`.
    pub fn save_to_memory(&self, buf: &PixelBuffer, format: Format, depth: BitDepth) -> IoResult<Vec<u8>> {
        if !supports_writing(format) {
            return Err(IoError::UnsupportedFormat(format!("no writer for {format}")));
        }
        let depth = self.storage_depth(buf, depth);
        if !supports_bit_depth(format, depth) {
            return Err(IoError::UnsupportedBitDepth(format!("{format} cannot store {depth}")));
        }
        let prepared = self.prepare(buf, depth.pixel_type(), format)?;
        self.encode(&prepared, format)
    }

    /// Saves `buf` in its own pixel type.
    ///
    /// Only TIFF stores the non-standard types (16/32-bit signed, float).
    pub fn save_native<P: AsRef<Path>>(&self, buf: &PixelBuffer, path: P) -> IoResult<()> {
        let path = path.as_ref();
        let format = Format::from_extension(path);
        if !supports_writing(format) {
            return Err(IoError::UnsupportedFormat(format!("no writer for {format}")));
        }
        debug!(path = %path.display(), %format, pixel_type = %buf.pixel_type(), "save native");
        std::fs::write(path, self.encode(buf, format)?)?;
        Ok(())
    }

    /// Downgrades colour requests to 8-bit for grey images.
    fn storage_depth(&self, buf: &PixelBuffer, depth: BitDepth) -> BitDepth {
        if !matches!(depth, BitDepth::Bit24 | BitDepth::Bit32) {
            return depth;
        }
        let opaque = !buf.pixel_type().has_alpha() || alpha_is_opaque(buf);
        if opaque && buf.is_greyscale() {
            trace!(%depth, "grey image stored as 8-bit");
            BitDepth::Bit8
        } else {
            depth
        }
    }

    fn prepare(&self, buf: &PixelBuffer, target: PixelType, format: Format) -> IoResult<PixelBuffer> {
        let from = buf.pixel_type();
        if from == target {
            return Ok(buf.try_clone()?);
        }
        if from.bits_per_pixel() > target.bits_per_pixel() || from.is_float() || from.is_signed() {
            self.config
                .sink
                .report(Some(format.name()), &format!("{from} reduced to {target} on save"));
        }
        // 8-bit targets stretch the found range first so float and narrow
        // 16-bit data keep their contrast.
        let converted = if target.is_standard() && !from.is_standard() {
            let standard = convert_to_standard_type(buf, true)?;
            convert_to_type(&standard, target, false)?
        } else if can_convert(from, target) {
            convert_to_type(buf, target, true)?
        } else {
            let standard = convert_to_standard_type(buf, true)?;
            convert_to_type(&standard, target, true)?
        };
        Ok(converted)
    }

    fn encode(&self, buf: &PixelBuffer, format: Format) -> IoResult<Vec<u8>> {
        match format {
            #[cfg(feature = "bmp")]
            Format::Bmp => crate::bmp::encode(buf),
            #[cfg(feature = "png")]
            Format::Png => crate::png::encode(buf, self.config.png_compression),
            #[cfg(feature = "jpeg")]
            Format::Jpeg => crate::jpeg::encode(buf, self.config.jpeg_quality),
            #[cfg(feature = "tiff")]
            Format::Tiff => crate::tiff::encode(buf),
            _ => Err(IoError::UnsupportedFormat(format.to_string())),
        }
    }
}

/// True when every alpha sample sits at the type's maximum.
fn alpha_is_opaque(buf: &PixelBuffer) -> bool {
    let Some(max) = buf.pixel_type().max_value() else {
        return false;
    };
    let channels = buf.channels();
    let mut row = vec![0.0; buf.width() as usize * channels];
    (0..buf.height()).all(|y| {
        buf.read_row(y, &mut row);
        row.chunks_exact(channels).all(|px| px[channels - 1] >= max)
    })
}

/// Builds `Rgb8` from packed RGBA bytes, or `Rgba8` if any pixel is not opaque.
#[cfg(any(feature = "gif", feature = "psd"))]
pub(crate) fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> IoResult<PixelBuffer> {
    use raster_core::RowOrder;

    let needed = width as usize * height as usize * 4;
    if rgba.len() < needed {
        return Err(IoError::DecodeError(format!("{} pixel bytes, need {needed}", rgba.len())));
    }
    let rgba = &rgba[..needed];
    if rgba.chunks_exact(4).any(|px| px[3] != u8::MAX) {
        return Ok(PixelBuffer::from_raw(rgba, width, height, None, PixelType::Rgba8, RowOrder::TopDown)?);
    }
    let rgb: Vec<u8> = rgba.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect();
    Ok(PixelBuffer::from_raw(&rgb, width, height, None, PixelType::Rgb8, RowOrder::TopDown)?)
}

// ============================================================================
// Free functions
// ============================================================================

/// Loads a file with the default configuration.
pub fn load<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    ImageIo::default().load(path)
}

/// Saves a file with the default configuration.
pub fn save<P: AsRef<Path>>(buf: &PixelBuffer, path: P, depth: BitDepth) -> IoResult<()> {
    ImageIo::default().save(buf, path, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_core::diagnostics::CollectingSink;

    fn engine(sink: Arc<CollectingSink>) -> ImageIo {
        ImageIo::new(IoConfig::default().with_sink(sink))
    }

    #[test]
    fn test_grey_colour_request_stored_as_8bit() {
        let mut buf = PixelBuffer::allocate(3, 3, PixelType::Rgb8).unwrap();
        for px in buf.row_mut(1).chunks_exact_mut(3) {
            px.copy_from_slice(&[90, 90, 90]);
        }
        let io = ImageIo::default();
        let bytes = io.save_to_memory(&buf, Format::Png, BitDepth::Bit24).unwrap();
        let back = io.load_from_memory(&bytes).unwrap();
        assert_eq!(back.pixel_type(), PixelType::U8);
        assert_eq!(back.sample(2, 1, 0), 90.0);
    }

    #[test]
    fn test_lossy_save_reported() {
        let sink = Arc::new(CollectingSink::default());
        let io = engine(sink.clone());
        let mut buf = PixelBuffer::allocate(2, 2, PixelType::F32).unwrap();
        buf.set_sample(0, 0, 0, 1.0);
        let bytes = io.save_to_memory(&buf, Format::Bmp, BitDepth::Bit8).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.entries()[0].format.as_deref(), Some("BMP"));
        let back = io.load_from_memory(&bytes).unwrap();
        assert_eq!(back.sample(0, 0, 0), 255.0);
    }

    #[test]
    fn test_float_stretched_to_found_range() {
        let mut buf = PixelBuffer::allocate(3, 1, PixelType::F32).unwrap();
        for (x, v) in [0.0, 500.0, 1000.0].into_iter().enumerate() {
            buf.set_sample(x as u32, 0, 0, v);
        }
        let io = ImageIo::new(IoConfig::default().with_sink(Arc::new(CollectingSink::default())));
        let bytes = io.save_to_memory(&buf, Format::Png, BitDepth::Bit8).unwrap();
        let back = io.load_from_memory(&bytes).unwrap();
        assert_eq!(back.pixel_type(), PixelType::U8);
        assert_eq!(back.sample(0, 0, 0), 0.0);
        assert!((127.0..=128.0).contains(&back.sample(1, 0, 0)));
        assert_eq!(back.sample(2, 0, 0), 255.0);
    }

    #[test]
    fn test_narrow_u16_keeps_contrast() {
        let mut buf = PixelBuffer::allocate(2, 1, PixelType::U16).unwrap();
        buf.set_sample(0, 0, 0, 1000.0);
        buf.set_sample(1, 0, 0, 1010.0);
        let io = ImageIo::new(IoConfig::default().with_sink(Arc::new(CollectingSink::default())));
        let bytes = io.save_to_memory(&buf, Format::Bmp, BitDepth::Bit8).unwrap();
        let back = io.load_from_memory(&bytes).unwrap();
        assert_eq!((back.sample(0, 0, 0), back.sample(1, 0, 0)), (0.0, 255.0));
    }

    #[cfg(feature = "gif")]
    #[test]
    fn test_gif_routed_by_signature() {
        use image::codecs::gif::GifEncoder;

        let mut bytes = Vec::new();
        GifEncoder::new(&mut bytes)
            .encode(&[9, 9, 9, 255, 200, 10, 10, 255], 2, 1, image::ExtendedColorType::Rgba8)
            .unwrap();
        let buf = ImageIo::default().load_from_memory(&bytes).unwrap();
        assert_eq!(buf.pixel_type(), PixelType::Rgb8);
        assert_eq!(buf.sample(1, 0, 0), 200.0);
    }

    #[test]
    fn test_depth_refused() {
        let buf = PixelBuffer::allocate(2, 2, PixelType::Rgba16).unwrap();
        let err = ImageIo::default()
            .save_to_memory(&buf, Format::Jpeg, BitDepth::Bit64)
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_unknown_and_read_only_formats() {
        let io = ImageIo::default();
        assert!(io.load_from_memory(b"???").unwrap_err().is_unsupported());
        let buf = PixelBuffer::allocate(1, 1, PixelType::U8).unwrap();
        assert!(io.save_to_memory(&buf, Format::Psd, BitDepth::Bit8).unwrap_err().is_unsupported());
    }
}
