//! # raster-ops
//!
//! Operations on [`PixelBuffer`](raster_core::PixelBuffer)s.
//!
//! # Modules
//!
//! - [`convert`] - pixel type conversion and linear scaling
//! - [`resize`] - separable rescaling with selectable filters
//! - [`transform`] - flips, quarter turns and region copies
//! - [`affine`] - resampling through an [`AffineMatrix`]
//! - [`composite`] - pasting and gradient-blended seams
//! - [`stats`] - min/max, statistics reports, histograms
//! - [`correlate`] - normalized cross-correlation for registration
//! - [`draw`] - rectangles, outlines and lines
//! - [`adjust`] - gamma, brightness, contrast, invert, threshold
//! - [`stretch`] - linear stretches of greyscale data
//!
//! # Example
//!
//! ```rust
//! use raster_core::{PixelBuffer, PixelType};
//! use raster_ops::prelude::*;
//!
//! let buf = PixelBuffer::allocate(64, 48, PixelType::U16)?;
//! let small = rescale(&buf, 32, 24, Filter::BiLinear, &Unstoppable)?;
//! let report = statistics_report(&small);
//! assert_eq!(report.area, 32 * 24);
//! # Ok::<(), raster_ops::OpsError>(())
//! ```
//!
//! # Cancellation
//!
//! Long-running operations ([`resize::rescale`], the [`correlate`] family)
//! take a `&dyn Stop` and return [`OpsError::Cancelled`] once it trips. Pass
//! [`Unstoppable`] when cancellation is not needed.
//!
//! # Feature Flags
//!
//! - `parallel` (default) - process rows on the rayon pool
//! - `serde` - serialize reports and correlation results

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;

pub mod adjust;
pub mod affine;
pub mod composite;
pub mod convert;
pub mod correlate;
pub mod draw;
pub mod parallel;
pub mod resize;
pub mod stats;
pub mod stretch;
pub mod transform;

pub use enough::{Stop, StopReason, Unstoppable};
pub use error::{OpsError, OpsResult};
pub use raster_math::{AffineMatrix, MatrixOrder};
pub use resize::Filter;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::affine::{affine_transform, draw_image, rotate};
    pub use crate::composite::{gradient_blend_paste_from_top_left, paste};
    pub use crate::convert::{convert_to_standard_type, convert_to_type};
    pub use crate::correlate::{Correlation, EdgeDetect, Prefilter, correlate, kernel_correlate_regions};
    pub use crate::resize::{Filter, rescale};
    pub use crate::stats::{find_min_max, histogram, statistics_report};
    pub use crate::transform::{flip_horizontal, flip_vertical};
    pub use crate::{AffineMatrix, MatrixOrder, OpsError, OpsResult, Stop, Unstoppable};
}
