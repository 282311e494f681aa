//! Region registration by normalized cross-correlation.
//!
//! # Overview
//!
//! Region 2 (the *kernel*) slides over region 1 at integer offsets. An
//! offset is the position of the kernel's top-left corner in region 1's
//! frame and may be negative. At each candidate the score is the Pearson
//! correlation of the overlapping pixel intensities:
//!
//! ```text
//! ncc = sum((a - mean_a)(b - mean_b)) / sqrt(sum((a - mean_a)^2) * sum((b - mean_b)^2))
//! ```
//!
//! Candidates whose overlap covers less than [`MIN_OVERLAP_FRACTION`] of
//! the smaller region are skipped. Ties go to the offset closest to the
//! origin, so a region correlated with itself yields `(0, 0)` and `1.0`.
//!
//! Colour regions are compared by luminance, complex by magnitude.
//!
//! # Prefilters
//!
//! [`kernel_correlate_regions`] runs a [`Prefilter`] over both regions
//! first. [`Identity`] leaves them alone, [`EdgeDetect`] emphasises edges.
//! Any `Fn(&PixelBuffer) -> OpsResult<PixelBuffer>` is a prefilter too.
//!
//! # Cancellation
//!
//! The stop token is checked before each row of candidate offsets.

use crate::transform::copy;
use crate::{OpsError, OpsResult};
use enough::Stop;
use raster_core::{PixelBuffer, PixelType, Point, Rect};
#[allow(unused_imports)]
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Smallest overlap, as a fraction of the smaller region, that is scored.
pub const MIN_OVERLAP_FRACTION: f64 = 0.5;

/// Best alignment found by a correlation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Correlation {
    /// Kernel top-left in region 1's frame.
    pub offset: Point,
    /// Normalized cross-correlation in `[-1, 1]`.
    pub score: f64,
}

// ============================================================================
// Prefilters
// ============================================================================

/// Transform applied to both regions before scoring.
pub trait Prefilter: Send + Sync {
    /// Filters one region.
    fn apply(&self, region: PixelBuffer) -> OpsResult<PixelBuffer>;
}

impl<F> Prefilter for F
where
    F: Fn(&PixelBuffer) -> OpsResult<PixelBuffer> + Send + Sync,
{
    fn apply(&self, region: PixelBuffer) -> OpsResult<PixelBuffer> {
        self(&region)
    }
}

/// Passes regions through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Prefilter for Identity {
    fn apply(&self, region: PixelBuffer) -> OpsResult<PixelBuffer> {
        Ok(region)
    }
}

/// Sobel gradient magnitude as an `F32` buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetect;

impl Prefilter for EdgeDetect {
    fn apply(&self, region: PixelBuffer) -> OpsResult<PixelBuffer> {
        edge_detect(&region)
    }
}

/// Sobel gradient magnitude of the intensity, edges clamped.
pub fn edge_detect(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    let (w, h) = src.dimensions();
    let grid = intensity_grid(src);
    let mut dst = PixelBuffer::allocate(w, h, PixelType::F32)?;
    let at = |x: i64, y: i64| {
        let x = x.clamp(0, w as i64 - 1) as usize;
        let y = y.clamp(0, h as i64 - 1) as usize;
        grid[y * w as usize + x]
    };
    let mut row = vec![0.0; w as usize];
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x - 1, y)
                - at(x - 1, y + 1);
            let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x, y - 1)
                - at(x + 1, y - 1);
            row[x as usize] = gx.hypot(gy);
        }
        dst.write_row(y as u32, &row);
    }
    Ok(dst)
}

// ============================================================================
// Scoring
// ============================================================================

fn intensity_grid(buf: &PixelBuffer) -> Vec<f64> {
    let (w, h) = buf.dimensions();
    let mut grid = Vec::with_capacity(w as usize * h as usize);
    if buf.channels() == 1 {
        let mut row = vec![0.0; w as usize];
        for y in 0..h {
            buf.read_row(y, &mut row);
            grid.extend_from_slice(&row);
        }
    } else {
        for y in 0..h {
            grid.extend((0..w).map(|x| buf.intensity(x, y)));
        }
    }
    grid
}

/// A region flattened to intensities, with an optional mask.
struct Plane {
    width: i32,
    height: i32,
    values: Vec<f64>,
    active: Option<Vec<bool>>,
}

impl Plane {
    fn new(buf: &PixelBuffer, mask: Option<&PixelBuffer>) -> Self {
        Self {
            width: buf.width() as i32,
            height: buf.height() as i32,
            values: intensity_grid(buf),
            active: mask.map(|m| intensity_grid(m).into_iter().map(|v| v != 0.0).collect()),
        }
    }

    fn active_count(&self) -> usize {
        self.active
            .as_ref()
            .map_or(self.values.len(), |a| a.iter().filter(|&&on| on).count())
    }
}

/// NCC of `kernel` placed at `(dx, dy)` over `base`, if enough overlaps.
fn score_at(base: &Plane, kernel: &Plane, dx: i32, dy: i32, min_count: usize) -> Option<f64> {
    let x0 = dx.max(0);
    let x1 = (dx + kernel.width).min(base.width);
    let y0 = dy.max(0);
    let y1 = (dy + kernel.height).min(base.height);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let (mut n, mut sa, mut sb, mut saa, mut sbb, mut sab) = (0usize, 0.0, 0.0, 0.0, 0.0, 0.0);
    for y in y0..y1 {
        let brow = (y * base.width) as usize;
        let krow = ((y - dy) * kernel.width) as usize;
        for x in x0..x1 {
            let ki = krow + (x - dx) as usize;
            if kernel.active.as_ref().is_some_and(|m| !m[ki]) {
                continue;
            }
            let a = base.values[brow + x as usize];
            let b = kernel.values[ki];
            n += 1;
            sa += a;
            sb += b;
            saa += a * a;
            sbb += b * b;
            sab += a * b;
        }
    }
    if n == 0 || n < min_count {
        return None;
    }

    let nf = n as f64;
    let va = (saa - sa * sa / nf).max(0.0);
    let vb = (sbb - sb * sb / nf).max(0.0);
    let flat_a = va <= 1e-12 * saa.abs().max(1.0);
    let flat_b = vb <= 1e-12 * sbb.abs().max(1.0);
    let score = match (flat_a, flat_b) {
        // Two flat patches match only if they are the same level
        (true, true) => {
            if (sa / nf - sb / nf).abs() <= 1e-9 * (sa / nf).abs().max(1.0) {
                1.0
            } else {
                0.0
            }
        }
        (true, false) | (false, true) => 0.0,
        (false, false) => ((sab - sa * sb / nf) / (va * vb).sqrt()).clamp(-1.0, 1.0),
    };
    Some(score)
}

fn better(candidate: &Correlation, best: &Option<Correlation>) -> bool {
    match best {
        None => true,
        Some(b) => {
            candidate.score > b.score
                || (candidate.score == b.score
                    && candidate.offset.length_squared() < b.offset.length_squared())
        }
    }
}

fn best_offset(base: &Plane, kernel: &Plane, window: &Rect, stop: &dyn Stop) -> OpsResult<Correlation> {
    let smaller = (base.values.len()).min(kernel.active_count());
    let min_count = ((smaller as f64 * MIN_OVERLAP_FRACTION).ceil() as usize).max(1);

    let mut best: Option<Correlation> = None;
    for dy in window.top..=window.bottom {
        stop.check()?;

        #[cfg(feature = "parallel")]
        let scores: Vec<(i32, Option<f64>)> = (window.left..=window.right)
            .into_par_iter()
            .map(|dx| (dx, score_at(base, kernel, dx, dy, min_count)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let scores: Vec<(i32, Option<f64>)> = (window.left..=window.right)
            .map(|dx| (dx, score_at(base, kernel, dx, dy, min_count)))
            .collect();

        for (dx, score) in scores {
            let Some(score) = score else { continue };
            let candidate = Correlation { offset: Point::new(dx, dy), score };
            if better(&candidate, &best) {
                best = Some(candidate);
            }
        }
    }
    best.ok_or_else(|| OpsError::invalid_parameter("no offset in the search window overlaps enough to score"))
}

/// Every offset at which the kernel still touches region 1.
pub fn full_search_window(region1: (u32, u32), region2: (u32, u32)) -> Rect {
    Rect::new(
        1 - region2.0 as i32,
        1 - region2.1 as i32,
        region1.0 as i32 - 1,
        region1.1 as i32 - 1,
    )
}

// ============================================================================
// Public API
// ============================================================================

/// Finds the offset of `rect2` of `buf2` within `rect1` of `buf1`.
///
/// # Errors
///
/// Invalid regions, cancellation, or no offset overlapping enough to score.
///
/// # Example
///
/// ```rust
/// use enough::Unstoppable;
/// use raster_core::{PixelBuffer, PixelType, Rect};
/// use raster_ops::correlate::correlate;
///
/// let mut buf = PixelBuffer::allocate(16, 16, PixelType::U8)?;
/// for y in 0..16 {
///     for x in 0..16 {
///         buf.set_sample(x, y, 0, ((x * x + 3 * y) % 97) as f64);
///     }
/// }
/// let r = Rect::new(2, 2, 13, 13);
/// let found = correlate(&buf, &r, &buf, &r, &Unstoppable)?;
/// assert_eq!((found.offset.x, found.offset.y), (0, 0));
/// assert_eq!(found.score, 1.0);
/// # Ok::<(), raster_ops::OpsError>(())
/// ```
pub fn correlate(
    buf1: &PixelBuffer,
    rect1: &Rect,
    buf2: &PixelBuffer,
    rect2: &Rect,
    stop: &dyn Stop,
) -> OpsResult<Correlation> {
    kernel_correlate_regions(buf1, rect1, buf2, rect2, None, None, &Identity, stop)
}

/// Correlation restricted to a search window, with a mask and a prefilter.
///
/// - `search`: offsets to try, in region 1's frame; `None` tries every
///   offset at which the regions overlap. It is clipped to that range.
/// - `mask`: same size as `rect2`; zero mask pixels are left out of the
///   score.
/// - `prefilter`: applied to copies of both regions.
#[allow(clippy::too_many_arguments)]
pub fn kernel_correlate_regions(
    buf1: &PixelBuffer,
    rect1: &Rect,
    buf2: &PixelBuffer,
    rect2: &Rect,
    search: Option<&Rect>,
    mask: Option<&PixelBuffer>,
    prefilter: &dyn Prefilter,
    stop: &dyn Stop,
) -> OpsResult<Correlation> {
    buf1.check_rect(rect1)?;
    buf2.check_rect(rect2)?;
    if let Some(m) = mask {
        if m.dimensions() != (rect2.width(), rect2.height()) {
            return Err(OpsError::SizeMismatch(format!(
                "mask is {}x{}, kernel region is {}x{}",
                m.width(),
                m.height(),
                rect2.width(),
                rect2.height()
            )));
        }
    }
    let full = full_search_window((rect1.width(), rect1.height()), (rect2.width(), rect2.height()));
    let window = match search {
        Some(s) => s
            .intersect(&full)
            .ok_or_else(|| OpsError::invalid_parameter(format!("search window {s:?} misses every overlap")))?,
        None => full,
    };
    debug!(?rect1, ?rect2, ?window, masked = mask.is_some(), "correlate regions");

    let region1 = prefilter.apply(copy(buf1, rect1)?)?;
    let region2 = prefilter.apply(copy(buf2, rect2)?)?;
    if region1.dimensions() != (rect1.width(), rect1.height())
        || region2.dimensions() != (rect2.width(), rect2.height())
    {
        return Err(OpsError::SizeMismatch("prefilter changed the region size".into()));
    }
    stop.check()?;

    let base = Plane::new(&region1, None);
    let kernel = Plane::new(&region2, mask);
    let found = best_offset(&base, &kernel, &window, stop)?;
    trace!(offset = ?found.offset, score = found.score, "best offset");
    Ok(found)
}

/// Aligns `right` against the right edge of `left`.
///
/// Compares a strip `thickness` pixels wide along the right edge of
/// `left` with the same strip along the left edge of `right`. The returned
/// offset is the position of `right`'s top-left corner in `left`'s frame.
pub fn correlate_along_right_edge(
    left: &PixelBuffer,
    right: &PixelBuffer,
    thickness: u32,
    stop: &dyn Stop,
) -> OpsResult<Correlation> {
    let t = thickness.min(left.width()).min(right.width());
    if t == 0 {
        return Err(OpsError::invalid_parameter("edge thickness must be positive"));
    }
    let x0 = (left.width() - t) as i32;
    let strip1 = Rect::from_origin_size(x0, 0, t, left.height());
    let strip2 = Rect::from_origin_size(0, 0, t, right.height());
    let found = correlate(left, &strip1, right, &strip2, stop)?;
    Ok(Correlation {
        offset: found.offset + Point::new(x0, 0),
        score: found.score,
    })
}

/// Aligns `bottom` against the bottom edge of `top`.
///
/// The vertical counterpart of [`correlate_along_right_edge`].
pub fn correlate_along_bottom_edge(
    top: &PixelBuffer,
    bottom: &PixelBuffer,
    thickness: u32,
    stop: &dyn Stop,
) -> OpsResult<Correlation> {
    let t = thickness.min(top.height()).min(bottom.height());
    if t == 0 {
        return Err(OpsError::invalid_parameter("edge thickness must be positive"));
    }
    let y0 = (top.height() - t) as i32;
    let strip1 = Rect::from_origin_size(0, y0, top.width(), t);
    let strip2 = Rect::from_origin_size(0, 0, bottom.width(), t);
    let found = correlate(top, &strip1, bottom, &strip2, stop)?;
    Ok(Correlation {
        offset: found.offset + Point::new(0, y0),
        score: found.score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use enough::{StopReason, Unstoppable};

    struct AlwaysStop;

    impl Stop for AlwaysStop {
        fn check(&self) -> Result<(), StopReason> {
            Err(StopReason::Cancelled)
        }
    }

    fn texture(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::allocate(w, h, PixelType::U8).unwrap();
        for y in 0..h {
            for x in 0..w {
                let v = (x * 31 + y * 17 + (x * y) % 13) % 251;
                buf.set_sample(x, y, 0, v as f64);
            }
        }
        buf
    }

    #[test]
    fn test_self_correlation() {
        let buf = texture(20, 14);
        let r = Rect::new(0, 0, 19, 13);
        let c = correlate(&buf, &r, &buf, &r, &Unstoppable).unwrap();
        assert_eq!(c.offset, Point::ZERO);
        assert_eq!(c.score, 1.0);
    }

    #[test]
    fn test_finds_known_shift() {
        let buf = texture(40, 30);
        let base = Rect::new(5, 5, 34, 24);
        let kernel = Rect::new(12, 9, 23, 18);
        let c = correlate(&buf, &base, &buf, &kernel, &Unstoppable).unwrap();
        assert_eq!(c.offset, Point::new(7, 4));
        assert_abs_diff_eq!(c.score, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_search_window_limits_offsets() {
        let buf = texture(40, 30);
        let base = Rect::new(5, 5, 34, 24);
        let kernel = Rect::new(12, 9, 23, 18);
        let window = Rect::new(-2, -2, 2, 2);
        let c = kernel_correlate_regions(&buf, &base, &buf, &kernel, Some(&window), None, &Identity, &Unstoppable)
            .unwrap();
        assert!(window.contains(c.offset));
        assert!(c.score < 1.0);
    }

    #[test]
    fn test_flat_regions() {
        let flat = PixelBuffer::allocate(8, 8, PixelType::U16).unwrap();
        let r = flat.bounds();
        let c = correlate(&flat, &r, &flat, &r, &Unstoppable).unwrap();
        assert_eq!(c.offset, Point::ZERO);
        assert_eq!(c.score, 1.0);
        let tex = texture(8, 8);
        let c = correlate(&flat, &r, &tex, &r, &Unstoppable).unwrap();
        assert_eq!(c.score, 0.0);
    }

    #[test]
    fn test_edge_prefilter_and_closure() {
        let buf = texture(24, 24);
        let base = Rect::new(0, 0, 23, 23);
        let kernel = Rect::new(6, 4, 15, 13);
        let c = kernel_correlate_regions(&buf, &base, &buf, &kernel, None, None, &EdgeDetect, &Unstoppable).unwrap();
        assert_eq!(c.offset, Point::new(6, 4));

        let to_float = |b: &PixelBuffer| crate::convert::convert_to_type(b, PixelType::F64, false);
        let c = kernel_correlate_regions(&buf, &base, &buf, &kernel, None, None, &to_float, &Unstoppable).unwrap();
        assert_eq!(c.offset, Point::new(6, 4));
    }

    #[test]
    fn test_mask_size_checked() {
        let buf = texture(10, 10);
        let r = buf.bounds();
        let mask = PixelBuffer::allocate(3, 3, PixelType::U8).unwrap();
        let err = kernel_correlate_regions(&buf, &r, &buf, &r, None, Some(&mask), &Identity, &Unstoppable);
        assert!(matches!(err, Err(OpsError::SizeMismatch(_))));
    }

    #[test]
    fn test_cancelled() {
        let buf = texture(10, 10);
        let r = buf.bounds();
        let err = correlate(&buf, &r, &buf, &r, &AlwaysStop).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_right_edge_tiles() {
        let scene = texture(60, 20);
        let left = copy(&scene, &Rect::new(0, 0, 29, 19)).unwrap();
        let right = copy(&scene, &Rect::new(22, 0, 51, 19)).unwrap();
        let c = correlate_along_right_edge(&left, &right, 6, &Unstoppable).unwrap();
        assert_eq!(c.offset, Point::new(22, 0));
    }

    #[test]
    fn test_bottom_edge_tiles() {
        let scene = texture(20, 60);
        let top = copy(&scene, &Rect::new(0, 0, 19, 29)).unwrap();
        let bottom = copy(&scene, &Rect::new(0, 25, 19, 54)).unwrap();
        let c = correlate_along_bottom_edge(&top, &bottom, 4, &Unstoppable).unwrap();
        assert_eq!(c.offset, Point::new(0, 25));
    }
}
