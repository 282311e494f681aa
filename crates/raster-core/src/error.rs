//! Error types for raster-core operations.
//!
//! # Overview
//!
//! The [`Error`] enum covers the failure modes of buffer-level work:
//! - Buffer allocation and raw data import
//! - Region and coordinate validation
//! - Pixel type dispatch (conversion pairs, format mismatches)
//! - Handle state (operations on a released buffer)
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{Error, PixelBuffer, PixelType};
//!
//! let err = PixelBuffer::allocate(0, 10, PixelType::U8).unwrap_err();
//! assert!(err.is_allocation_error());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - derive for `std::error::Error` and `Display`
//!
//! # Used By
//!
//! - [`crate::buffer::PixelBuffer`] - allocation and bounds checks
//! - [`crate::handle::BufferHandle`] - released handle access
//! - `raster-ops`, `raster-io` - wrapped in their own error enums

use crate::pixel::PixelType;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by buffer-level operations.
///
/// # Categories
///
/// - **Allocation**: [`AllocationFailed`](Error::AllocationFailed),
///   [`InvalidDimensions`](Error::InvalidDimensions), [`InvalidStride`](Error::InvalidStride)
/// - **Bounds**: [`OutOfBounds`](Error::OutOfBounds), [`InvalidRegion`](Error::InvalidRegion)
/// - **Pixel types**: [`UnsupportedPixelType`](Error::UnsupportedPixelType),
///   [`UnsupportedConversion`](Error::UnsupportedConversion), [`FormatMismatch`](Error::FormatMismatch)
/// - **Handles**: [`InvalidHandle`](Error::InvalidHandle)
/// - **I/O**: [`Io`](Error::Io)
#[derive(Debug, Error)]
pub enum Error {
    /// Backing memory could not be obtained.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Bytes requested
        requested: usize,
        /// Failure reason
        reason: String,
    },

    /// Width or height is zero, or the byte size overflows.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Row stride is smaller than one packed row.
    #[error("stride {stride} is less than minimum {min_stride} for width {width}")]
    InvalidStride {
        /// Provided stride
        stride: usize,
        /// Minimum required stride
        min_stride: usize,
        /// Image width
        width: u32,
    },

    /// Pixel coordinates are outside the buffer.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate
        x: i64,
        /// Y coordinate
        y: i64,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Rectangle is empty or not fully inside the buffer.
    #[error("region ({left}, {top})-({right}, {bottom}) invalid for image {width}x{height}")]
    InvalidRegion {
        /// Left edge (inclusive)
        left: i32,
        /// Top edge (inclusive)
        top: i32,
        /// Right edge (inclusive)
        right: i32,
        /// Bottom edge (inclusive)
        bottom: i32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// The operation does not handle this pixel type.
    #[error("unsupported pixel type {pixel_type} for {operation}")]
    UnsupportedPixelType {
        /// Offending type
        pixel_type: PixelType,
        /// Operation name
        operation: &'static str,
    },

    /// No mapping exists between two pixel types.
    #[error("no conversion defined from {from} to {to}")]
    UnsupportedConversion {
        /// Source type
        from: PixelType,
        /// Target type
        to: PixelType,
    },

    /// Two buffers must share pixel type and they do not.
    #[error("format mismatch: {expected} vs {actual}")]
    FormatMismatch {
        /// Type required by the operation
        expected: PixelType,
        /// Type supplied
        actual: PixelType,
    },

    /// Operation on a released or never-allocated buffer.
    #[error("invalid buffer handle: {0}")]
    InvalidHandle(&'static str),

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(requested: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidRegion`] error from an inclusive rectangle.
    #[inline]
    pub fn invalid_region(rect: crate::Rect, width: u32, height: u32) -> Self {
        Self::InvalidRegion {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
            width,
            height,
        }
    }

    /// Creates an [`Error::UnsupportedPixelType`] error.
    #[inline]
    pub fn unsupported_pixel_type(pixel_type: PixelType, operation: &'static str) -> Self {
        Self::UnsupportedPixelType {
            pixel_type,
            operation,
        }
    }

    /// Creates an [`Error::UnsupportedConversion`] error.
    #[inline]
    pub fn unsupported_conversion(from: PixelType, to: PixelType) -> Self {
        Self::UnsupportedConversion { from, to }
    }

    /// Creates an [`Error::FormatMismatch`] error.
    #[inline]
    pub fn format_mismatch(expected: PixelType, actual: PixelType) -> Self {
        Self::FormatMismatch { expected, actual }
    }

    /// Returns `true` for allocation and dimension errors.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailed { .. } | Self::InvalidDimensions { .. } | Self::InvalidStride { .. }
        )
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. } | Self::InvalidRegion { .. })
    }

    /// Returns `true` if two buffers disagreed on their pixel type.
    #[inline]
    pub fn is_format_mismatch(&self) -> bool {
        matches!(self, Self::FormatMismatch { .. })
    }

    /// Returns `true` if this is an I/O error.
    #[inline]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;

    #[test]
    fn test_invalid_region_message() {
        let err = Error::invalid_region(Rect::new(5, 6, 120, 40), 100, 50);
        let msg = err.to_string();
        assert!(msg.contains("(5, 6)-(120, 40)"));
        assert!(msg.contains("100x50"));
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_allocation_predicates() {
        assert!(Error::allocation_failed(1 << 40, "out of memory").is_allocation_error());
        assert!(Error::invalid_dimensions(0, 4, "zero width").is_allocation_error());
        assert!(!Error::InvalidHandle("released").is_allocation_error());
    }

    #[test]
    fn test_conversion_message() {
        let err = Error::unsupported_conversion(PixelType::Complex, PixelType::Rgb8);
        assert!(err.to_string().contains("complex"));
        assert!(err.to_string().contains("rgb8"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.is_io_error());
    }
}
