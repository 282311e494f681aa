//! # raster-io
//!
//! Image file I/O for raster buffers.
//!
//! Files load into a [`PixelBuffer`](raster_core::PixelBuffer) and buffers
//! save at a requested [`BitDepth`]:
//!
//! - **BMP** - Uncompressed Windows bitmaps
//! - **PNG** - Lossless, 8/16-bit, alpha, indexed output for palette images
//! - **JPEG** - Lossy greyscale and RGB
//! - **TIFF** - Every scalar and colour type, the lossless choice for float data
//! - **GIF** - First frame, read only
//! - **PSD** - Flattened composite of RGB and greyscale documents, read only
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use raster_io::{BitDepth, load, save};
//!
//! let image = load("input.tif")?;
//! save(&image, "output.png", BitDepth::Bit24)?;
//! ```
//!
//! # Configuration
//!
//! [`IoConfig`] carries the JPEG quality, PNG compression and the
//! [`DiagnosticSink`](raster_core::DiagnosticSink) that receives codec
//! warnings. The default sink forwards to `tracing`.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use raster_core::diagnostics::CollectingSink;
//! use raster_io::{ImageIo, IoConfig};
//!
//! let sink = Arc::new(CollectingSink::default());
//! let io = ImageIo::new(IoConfig::default().with_sink(sink.clone()));
//! let image = io.load("odd.bmp")?;
//! for d in sink.entries() {
//!     println!("{:?}: {}", d.format, d.message);
//! }
//! ```
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Bit Depths |
//! |--------|------|-------|------------|
//! | BMP | Yes | Yes | 8, 24, 32 |
//! | PNG | Yes | Yes | 8, 16, 24, 32, 48, 64 |
//! | JPEG | Yes | Yes | 8, 24 |
//! | TIFF | Yes | Yes | 8, 16, 24, 32, 48, 64 and native float/signed |
//! | GIF | Yes | No | - |
//! | PSD | Yes | No | - |
//!
//! # Feature Flags
//!
//! - `bmp` - BMP support (default)
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG support (default)
//! - `tiff` - TIFF support (default)
//! - `gif` - GIF reading via the `image` crate (default)
//! - `psd` - PSD reading via the `psd` crate (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod detect;
pub mod engine;
pub mod registry;

#[cfg(feature = "bmp")]
pub mod bmp;
#[cfg(feature = "gif")]
pub mod gif;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png")]
pub mod png;
#[cfg(feature = "psd")]
pub mod psd;
#[cfg(feature = "tiff")]
pub mod tiff;

pub use detect::Format;
pub use engine::{DEFAULT_JPEG_QUALITY, ImageIo, IoConfig, PngCompression, load, save};
pub use error::{IoError, IoResult};
pub use registry::{BitDepth, readable_formats, supports_bit_depth, supports_reading, supports_writing};
