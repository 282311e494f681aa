//! Error types for I/O operations.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Format not recognised, or its codec is not compiled in.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Corrupt or unsupported file content.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoder failure.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// The format cannot store the requested depth.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(String),

    /// Buffer construction failed.
    #[error(transparent)]
    Core(#[from] raster_core::Error),

    /// Conversion before saving failed.
    #[error(transparent)]
    Ops(#[from] raster_ops::OpsError),
}

impl IoError {
    /// Returns true for content that could not be decoded.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::DecodeError(_))
    }

    /// Returns true when the format or depth is not supported.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_) | Self::UnsupportedBitDepth(_))
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
