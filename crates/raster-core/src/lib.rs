//! # raster-core
//!
//! Core types for the raster image engine.
//!
//! - [`PixelBuffer`] - owned pixel storage with stride, pixel type and palette
//! - [`PixelType`] - closed set of pixel representations (integer, float,
//!   complex, RGB/RGBA)
//! - [`Rect`], [`Point`] - inclusive rectangles and integer points
//! - [`BufferHandle`] - long-lived slot with replace and idempotent release
//! - [`diagnostics`] - sinks for non-fatal messages
//!
//! ## Crate Structure
//!
//! ```text
//! raster-core (this crate)
//!    ^
//!    |
//!    +-- raster-math (affine matrix)
//!    +-- raster-ops (conversion, transforms, statistics, drawing)
//!    +-- raster-io (file formats)
//!    +-- raster-cli
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - derive `Serialize`/`Deserialize` for [`Rect`], [`Point`],
//!   [`PixelType`] and [`Rgba`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod diagnostics;
pub mod error;
pub mod handle;
pub mod pixel;
pub mod rect;

pub use buffer::{PixelBuffer, ROW_ALIGNMENT, RowOrder, decode_row, encode_row};
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use error::{Error, Result};
pub use handle::BufferHandle;
pub use pixel::{
    ChannelMasks, Palette, ParsePixelTypeError, PixelType, REC709_LUMA, Rgba, SampleKind,
    luminance_rec709,
};
pub use rect::{Point, Rect};

/// Prelude module for convenient imports.
///
/// ```
/// use raster_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::{PixelBuffer, RowOrder};
    pub use crate::error::{Error, Result};
    pub use crate::handle::BufferHandle;
    pub use crate::pixel::{Palette, PixelType, Rgba};
    pub use crate::rect::{Point, Rect};
}
