//! # raster-math
//!
//! 2D affine matrix for the raster engine.
//!
//! - [`AffineMatrix`] - scale/rotate/translate builder with explicit
//!   [`MatrixOrder`], inversion and point mapping
//!
//! # Design
//!
//! This crate wraps [`glam::DAffine2`] and only adds composition order and
//! the singular-matrix policy. Points are **column vectors**:
//!
//! ```text
//! result = matrix * point
//! ```
//!
//! # Usage
//!
//! ```rust
//! use raster_math::{AffineMatrix, MatrixOrder};
//!
//! let mut m = AffineMatrix::identity();
//! m.translate(10.0, 0.0, MatrixOrder::Append);
//! assert_eq!(m.transform_point(1.0, 1.0), (11.0, 1.0));
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - double precision affine types
//! - `raster-core` - [`Rect`](raster_core::Rect) for bounding boxes
//!
//! # Used By
//!
//! - `raster-ops` - affine resampling
//! - `raster-cli` - `rotate` command

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod matrix;

pub use matrix::*;

/// Re-export glam types for direct use
pub mod glam {
    pub use ::glam::{DAffine2, DMat2, DVec2};
}
