//! Long-lived buffer slot with explicit release.
//!
//! Most code owns a [`PixelBuffer`] directly and lets `Drop` release it. A
//! [`BufferHandle`] serves callers that keep one slot around (a viewer, a
//! binding layer) and swap its content as operations produce new buffers:
//!
//! - [`replace`](BufferHandle::replace) adopts a new buffer and drops the old one
//! - [`release`](BufferHandle::release) drops the buffer; calling it again is a no-op
//! - access to a released slot fails with [`Error::InvalidHandle`]
//!
//! ```rust
//! use raster_core::{BufferHandle, PixelBuffer, PixelType};
//!
//! let mut handle = BufferHandle::new(PixelBuffer::allocate(8, 8, PixelType::U8)?);
//! handle.apply(|b| PixelBuffer::allocate(b.width() * 2, b.height(), b.pixel_type()))?;
//! assert_eq!(handle.get()?.width(), 16);
//!
//! handle.release();
//! handle.release();
//! assert!(handle.get().is_err());
//! # Ok::<(), raster_core::Error>(())
//! ```

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

/// Optional owned buffer with replace and idempotent release.
#[derive(Debug, Default)]
pub struct BufferHandle {
    inner: Option<PixelBuffer>,
}

impl BufferHandle {
    /// Wraps an owned buffer.
    pub fn new(buffer: PixelBuffer) -> Self {
        Self {
            inner: Some(buffer),
        }
    }

    /// Handle with no buffer.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Returns true while a buffer is held.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Borrows the buffer.
    pub fn get(&self) -> Result<&PixelBuffer> {
        self.inner
            .as_ref()
            .ok_or(Error::InvalidHandle("buffer was released"))
    }

    /// Mutably borrows the buffer.
    pub fn get_mut(&mut self) -> Result<&mut PixelBuffer> {
        self.inner
            .as_mut()
            .ok_or(Error::InvalidHandle("buffer was released"))
    }

    /// Adopts `buffer`, dropping the previous one.
    pub fn replace(&mut self, buffer: PixelBuffer) {
        self.inner = Some(buffer);
    }

    /// Removes and returns the buffer, leaving the handle released.
    pub fn take(&mut self) -> Option<PixelBuffer> {
        self.inner.take()
    }

    /// Drops the buffer. No-op when already released.
    pub fn release(&mut self) {
        self.inner = None;
    }

    /// Runs an operation that produces a new buffer and adopts the result.
    ///
    /// On failure the current buffer is kept and the error is returned.
    pub fn apply<E, F>(&mut self, op: F) -> std::result::Result<(), E>
    where
        E: From<Error>,
        F: FnOnce(&PixelBuffer) -> std::result::Result<PixelBuffer, E>,
    {
        let next = op(self.get()?)?;
        self.inner = Some(next);
        Ok(())
    }

    /// Runs an in-place operation on the held buffer.
    pub fn modify<T, E, F>(&mut self, op: F) -> std::result::Result<T, E>
    where
        E: From<Error>,
        F: FnOnce(&mut PixelBuffer) -> std::result::Result<T, E>,
    {
        op(self.get_mut()?)
    }
}

impl From<PixelBuffer> for BufferHandle {
    fn from(buffer: PixelBuffer) -> Self {
        Self::new(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelType;

    #[test]
    fn test_failed_apply_keeps_buffer() {
        let mut h = BufferHandle::new(PixelBuffer::allocate(4, 4, PixelType::U8).unwrap());
        let res: Result<()> = h.apply(|_| PixelBuffer::allocate(0, 0, PixelType::U8));
        assert!(res.is_err());
        assert_eq!(h.get().unwrap().width(), 4);
    }

    #[test]
    fn test_released_handle() {
        let mut h = BufferHandle::empty();
        assert!(!h.is_valid());
        let err = h.get_mut().unwrap_err();
        assert!(matches!(err, Error::InvalidHandle(_)));
        let res: Result<()> = h.modify(|b| {
            b.set_sample(0, 0, 0, 1.0);
            Ok(())
        });
        assert!(res.is_err());
    }

    #[test]
    fn test_take_and_replace() {
        let mut h: BufferHandle = PixelBuffer::allocate(2, 2, PixelType::F32).unwrap().into();
        let b = h.take().unwrap();
        assert!(!h.is_valid());
        h.replace(b);
        assert_eq!(h.get().unwrap().pixel_type(), PixelType::F32);
    }
}
