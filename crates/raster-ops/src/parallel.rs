//! Row-parallel helpers.
//!
//! With the `parallel` feature rows are processed on the rayon pool,
//! otherwise sequentially. Results are identical either way since every row
//! is written by exactly one closure call.
//!
//! Cancellable variants check the stop token between blocks of
//! [`ROW_BLOCK`] rows on the calling thread, so the token itself never
//! crosses threads.

use crate::OpsResult;
use enough::Stop;
use raster_core::PixelBuffer;
use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Rows processed between two stop checks.
pub const ROW_BLOCK: u32 = 16;

/// Runs `f(y, row)` for every row of `dst` (padding excluded).
pub fn for_each_row<F>(dst: &mut PixelBuffer, f: F)
where
    F: Fn(u32, &mut [u8]) + Send + Sync,
{
    let h = dst.height();
    for_each_row_in(dst, 0..h, &f);
}

/// Like [`for_each_row`], checking `stop` every [`ROW_BLOCK`] rows.
pub fn for_each_row_checked<F>(dst: &mut PixelBuffer, stop: &dyn Stop, f: F) -> OpsResult<()>
where
    F: Fn(u32, &mut [u8]) + Send + Sync,
{
    let h = dst.height();
    let mut y0 = 0;
    while y0 < h {
        stop.check()?;
        let y1 = (y0 + ROW_BLOCK).min(h);
        for_each_row_in(dst, y0..y1, &f);
        y0 = y1;
    }
    Ok(())
}

fn for_each_row_in<F>(dst: &mut PixelBuffer, rows: Range<u32>, f: &F)
where
    F: Fn(u32, &mut [u8]) + Send + Sync,
{
    let stride = dst.stride();
    let line = dst.line_bytes();
    let first = rows.start;
    let bytes = &mut dst.raw_bytes_mut()[rows.start as usize * stride..rows.end as usize * stride];

    #[cfg(feature = "parallel")]
    bytes
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(i, row)| f(first + i as u32, &mut row[..line]));

    #[cfg(not(feature = "parallel"))]
    bytes
        .chunks_mut(stride)
        .enumerate()
        .for_each(|(i, row)| f(first + i as u32, &mut row[..line]));
}
