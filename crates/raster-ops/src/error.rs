//! Error types for buffer operations.

use enough::StopReason;
use raster_math::SingularMatrixError;
use thiserror::Error;

/// Error type for buffer operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Buffer-level failure (allocation, region, format mismatch, ...).
    #[error(transparent)]
    Core(#[from] raster_core::Error),

    /// Transform matrix cannot be inverted.
    #[error(transparent)]
    Singular(#[from] SingularMatrixError),

    /// Images have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The caller's stop token fired.
    #[error("operation cancelled: {0:?}")]
    Cancelled(StopReason),
}

impl From<StopReason> for OpsError {
    fn from(reason: StopReason) -> Self {
        Self::Cancelled(reason)
    }
}

impl OpsError {
    /// Creates an invalid parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Returns true if the operation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns true for a pixel type mismatch between two buffers.
    pub fn is_format_mismatch(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_format_mismatch())
    }

    /// Returns true for an unsupported conversion or pixel type.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::Core(raster_core::Error::UnsupportedConversion { .. })
                | Self::Core(raster_core::Error::UnsupportedPixelType { .. })
        )
    }
}

/// Result type for buffer operations.
pub type OpsResult<T> = Result<T, OpsError>;
