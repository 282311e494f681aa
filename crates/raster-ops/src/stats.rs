//! Statistics: min/max, summary report, histograms and line profiles.
//!
//! Colour buffers are measured on Rec. 709 intensity unless a function says
//! otherwise; complex buffers on magnitude. Alpha never contributes.
//!
//! ```rust
//! use raster_core::{PixelBuffer, PixelType};
//! use raster_ops::stats::statistics_report;
//!
//! let mut buf = PixelBuffer::allocate(100, 100, PixelType::U8)?;
//! buf.raw_bytes_mut().fill(128);
//! let report = statistics_report(&buf);
//! assert_eq!(report.mean, 128.0);
//! assert_eq!(report.area, 10_000);
//! # Ok::<(), raster_core::Error>(())
//! ```

use crate::{OpsError, OpsResult};
use raster_core::{Error, PixelBuffer, PixelType, Point, luminance_rec709};
#[allow(unused_imports)]
use tracing::{debug, trace};

// ============================================================================
// Value ranges
// ============================================================================

/// Largest value a channel of `pixel_type` can hold, `None` for complex.
///
/// Float types report the largest finite `f32`/`f64`.
pub fn max_possible_value(pixel_type: PixelType) -> Option<f64> {
    pixel_type.max_value()
}

/// Smallest value a channel of `pixel_type` can hold, `None` for complex.
pub fn min_possible_value(pixel_type: PixelType) -> Option<f64> {
    pixel_type.min_value()
}

/// Calls `f` with one measured value per pixel.
fn for_each_value(buf: &PixelBuffer, mut f: impl FnMut(f64)) {
    let pixel_type = buf.pixel_type();
    let channels = buf.channels();
    let mut row = vec![0.0; buf.width() as usize * channels];
    for y in 0..buf.height() {
        buf.read_row(y, &mut row);
        for px in row.chunks_exact(channels) {
            let v = match pixel_type {
                PixelType::Complex => px[0].hypot(px[1]),
                t if t.is_colour() => luminance_rec709(px[0], px[1], px[2]),
                _ => px[0],
            };
            f(v);
        }
    }
}

/// Smallest and largest values in the buffer.
///
/// Colour buffers report the extremes over R, G and B samples (not
/// intensity), complex buffers over magnitudes.
pub fn find_min_max(buf: &PixelBuffer) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    if buf.pixel_type().is_colour() {
        let channels = buf.channels();
        let mut row = vec![0.0; buf.width() as usize * channels];
        for y in 0..buf.height() {
            buf.read_row(y, &mut row);
            for px in row.chunks_exact(channels) {
                for &v in &px[..3] {
                    min = min.min(v);
                    max = max.max(v);
                }
            }
        }
    } else {
        for_each_value(buf, |v| {
            min = min.min(v);
            max = max.max(v);
        });
    }
    (min, max)
}

// ============================================================================
// Summary report
// ============================================================================

/// Summary statistics of one buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatisticsReport {
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std_deviation: f64,
    /// Percentage of pixels at the type's maximum value
    pub percentage_overloaded: f64,
    /// Percentage of pixels at the type's minimum value
    pub percentage_underloaded: f64,
    /// Number of pixels
    pub area: u64,
}

/// Computes min, max, mean, standard deviation and clipping percentages.
///
/// Complex buffers have no representable limits, so both percentages are 0.
pub fn statistics_report(buf: &PixelBuffer) -> StatisticsReport {
    let pixel_type = buf.pixel_type();
    let hi = max_possible_value(pixel_type);
    let lo = min_possible_value(pixel_type);

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut over = 0u64;
    let mut under = 0u64;
    for_each_value(buf, |v| {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        sum_sq += v * v;
        if hi.is_some_and(|h| v >= h) {
            over += 1;
        }
        if lo.is_some_and(|l| v <= l) {
            under += 1;
        }
    });

    let area = buf.width() as u64 * buf.height() as u64;
    let n = area as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);

    debug!(area, min, max, mean, "statistics report");

    StatisticsReport {
        min,
        max,
        mean,
        std_deviation: variance.sqrt(),
        percentage_overloaded: over as f64 * 100.0 / n,
        percentage_underloaded: under as f64 * 100.0 / n,
        area,
    }
}

// ============================================================================
// Histograms
// ============================================================================

/// Bin counts over a closed value range.
///
/// Bin `i` starts at `min + i * range_per_bin`, with
/// `range_per_bin = (max - min) / (bins - 1)`, so `max` itself lands in the
/// last bin. Values outside `[min, max]` are not counted.
///
/// Bins are `(max - min) / (bins - 1)` wide, not `(max - min) / bins`: with
/// 256 bins over `[0, 255]` each integer level gets its own bin.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Histogram {
    /// Lower end of the range
    pub min: f64,
    /// Upper end of the range
    pub max: f64,
    /// Counts per bin
    pub counts: Vec<u64>,
}

impl Histogram {
    fn new(min: f64, max: f64, bins: usize) -> OpsResult<Self> {
        if bins == 0 {
            return Err(OpsError::invalid_parameter("histogram needs at least one bin"));
        }
        if !(max >= min) {
            return Err(OpsError::invalid_parameter(format!(
                "histogram range [{min}, {max}] is empty"
            )));
        }
        Ok(Self {
            min,
            max,
            counts: vec![0; bins],
        })
    }

    /// Number of bins.
    #[inline]
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Width of one bin in value units.
    pub fn range_per_bin(&self) -> f64 {
        if self.counts.len() < 2 {
            self.max - self.min
        } else {
            (self.max - self.min) / (self.counts.len() - 1) as f64
        }
    }

    /// Bin index for `value`, `None` outside the range.
    pub fn bin_for(&self, value: f64) -> Option<usize> {
        if !(value >= self.min && value <= self.max) {
            return None;
        }
        let rpb = self.range_per_bin();
        if self.counts.len() < 2 || rpb <= 0.0 {
            return Some(0);
        }
        let bin = ((value - self.min) / rpb).floor() as usize;
        Some(bin.min(self.counts.len() - 1))
    }

    #[inline]
    fn add(&mut self, value: f64) {
        if let Some(bin) = self.bin_for(value) {
            self.counts[bin] += 1;
        }
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Index of the fullest bin (first one on ties).
    pub fn peak(&self) -> usize {
        let mut best = 0;
        for (i, &c) in self.counts.iter().enumerate() {
            if c > self.counts[best] {
                best = i;
            }
        }
        best
    }
}

/// Histogram over `[0, max_possible_value]`.
///
/// # Errors
///
/// [`Error::UnsupportedPixelType`] for complex buffers, which have no
/// maximum; [`OpsError::InvalidParameter`] for zero bins.
pub fn histogram(buf: &PixelBuffer, bins: usize) -> OpsResult<Histogram> {
    let max = max_possible_value(buf.pixel_type())
        .ok_or(Error::unsupported_pixel_type(buf.pixel_type(), "histogram"))?;
    histogram_range(buf, 0.0, max, bins)
}

/// Histogram over an explicit `[min, max]`.
pub fn histogram_range(buf: &PixelBuffer, min: f64, max: f64, bins: usize) -> OpsResult<Histogram> {
    let mut hist = Histogram::new(min, max, bins)?;
    for_each_value(buf, |v| hist.add(v));
    trace!(bins, total = hist.total(), "histogram");
    Ok(hist)
}

/// Per-channel histograms of a colour buffer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RgbHistogram {
    /// Red channel
    pub red: Histogram,
    /// Green channel
    pub green: Histogram,
    /// Blue channel
    pub blue: Histogram,
}

/// Separate R, G and B histograms over `[min, max]`.
///
/// # Errors
///
/// [`Error::UnsupportedPixelType`] for non-colour buffers.
pub fn rgb_histogram(buf: &PixelBuffer, min: f64, max: f64, bins: usize) -> OpsResult<RgbHistogram> {
    if !buf.pixel_type().is_colour() {
        return Err(Error::unsupported_pixel_type(buf.pixel_type(), "rgb histogram").into());
    }
    let mut red = Histogram::new(min, max, bins)?;
    let mut green = red.clone();
    let mut blue = red.clone();

    let channels = buf.channels();
    let mut row = vec![0.0; buf.width() as usize * channels];
    for y in 0..buf.height() {
        buf.read_row(y, &mut row);
        for px in row.chunks_exact(channels) {
            red.add(px[0]);
            green.add(px[1]);
            blue.add(px[2]);
        }
    }
    Ok(RgbHistogram { red, green, blue })
}

// ============================================================================
// Line profile
// ============================================================================

/// Integer points on the line from `p1` to `p2` inclusive (Bresenham).
pub fn line_points(p1: Point, p2: Point) -> Vec<Point> {
    let dx = (p2.x - p1.x).abs();
    let dy = -(p2.y - p1.y).abs();
    let sx = if p1.x < p2.x { 1 } else { -1 };
    let sy = if p1.y < p2.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (p1.x, p1.y);
    let mut points = Vec::with_capacity(dx.max(-dy) as usize + 1);
    loop {
        points.push(Point::new(x, y));
        if x == p2.x && y == p2.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

/// Intensity values along the line from `p1` to `p2`, both ends included.
///
/// # Errors
///
/// [`Error::OutOfBounds`] if either end lies outside the buffer.
pub fn greyscale_values_along_line(buf: &PixelBuffer, p1: Point, p2: Point) -> OpsResult<Vec<f64>> {
    for p in [p1, p2] {
        if !buf.is_inside(p.x as i64, p.y as i64) {
            return Err(Error::out_of_bounds(p.x as i64, p.y as i64, buf.width(), buf.height()).into());
        }
    }
    Ok(line_points(p1, p2)
        .into_iter()
        .map(|p| buf.intensity(p.x as u32, p.y as u32))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_report() {
        let mut buf = PixelBuffer::allocate(100, 100, PixelType::U8).unwrap();
        buf.raw_bytes_mut().fill(128);
        let r = statistics_report(&buf);
        assert_eq!(r.min, 128.0);
        assert_eq!(r.max, 128.0);
        assert_eq!(r.mean, 128.0);
        assert_eq!(r.std_deviation, 0.0);
        assert_eq!(r.area, 10_000);
        assert_eq!(r.percentage_overloaded, 0.0);
    }

    #[test]
    fn test_type_limits() {
        assert_eq!(min_possible_value(PixelType::U16), Some(0.0));
        assert_eq!(min_possible_value(PixelType::I16), Some(-32768.0));
        assert_eq!(max_possible_value(PixelType::I16), Some(32767.0));
        assert_eq!(min_possible_value(PixelType::Complex), None);
    }

    #[test]
    fn test_signed_underload_at_type_minimum() {
        let mut buf = PixelBuffer::allocate(4, 1, PixelType::I16).unwrap();
        buf.set_sample(0, 0, 0, -32768.0);
        let r = statistics_report(&buf);
        assert_eq!(r.percentage_underloaded, 25.0);
    }

    #[test]
    fn test_clipping_percentages() {
        let mut buf = PixelBuffer::allocate(4, 1, PixelType::U16).unwrap();
        buf.set_sample(0, 0, 0, 65535.0);
        buf.set_sample(1, 0, 0, 10.0);
        buf.set_sample(2, 0, 0, 20.0);
        let r = statistics_report(&buf);
        assert_eq!(r.percentage_overloaded, 25.0);
        assert_eq!(r.percentage_underloaded, 25.0);
    }

    #[test]
    fn test_std_deviation() {
        let mut buf = PixelBuffer::allocate(2, 1, PixelType::F64).unwrap();
        buf.set_sample(0, 0, 0, 2.0);
        buf.set_sample(1, 0, 0, 4.0);
        let r = statistics_report(&buf);
        assert_relative_eq!(r.mean, 3.0);
        assert_relative_eq!(r.std_deviation, 1.0);
    }

    #[test]
    fn test_min_max_colour_channels() {
        let mut buf = PixelBuffer::allocate(2, 1, PixelType::Rgba8).unwrap();
        buf.set_sample(0, 0, 3, 255.0);
        buf.set_sample(1, 0, 1, 40.0);
        assert_eq!(find_min_max(&buf), (0.0, 40.0));
    }

    #[test]
    fn test_histogram_bins() {
        let mut buf = PixelBuffer::allocate(4, 1, PixelType::U8).unwrap();
        buf.row_mut(0).copy_from_slice(&[0, 1, 128, 255]);
        let h = histogram(&buf, 256).unwrap();
        assert_eq!(h.bins(), 256);
        assert_eq!(h.counts[0], 1);
        assert_eq!(h.counts[128], 1);
        assert_eq!(h.counts[255], 1);
        assert_eq!(h.total(), 4);
        assert_relative_eq!(h.range_per_bin(), 1.0);

        let coarse = histogram_range(&buf, 0.0, 255.0, 4).unwrap();
        assert_relative_eq!(coarse.range_per_bin(), 85.0);
        assert_eq!(coarse.counts, vec![2, 1, 0, 1]);
    }

    #[test]
    fn test_histogram_complex_fails() {
        let buf = PixelBuffer::allocate(2, 2, PixelType::Complex).unwrap();
        assert!(histogram(&buf, 16).is_err());
        let u8buf = PixelBuffer::allocate(2, 2, PixelType::U8).unwrap();
        assert!(histogram(&u8buf, 0).is_err());
    }

    #[test]
    fn test_histogram_range_excludes_outside() {
        let mut buf = PixelBuffer::allocate(3, 1, PixelType::U8).unwrap();
        buf.row_mut(0).copy_from_slice(&[5, 50, 200]);
        let h = histogram_range(&buf, 10.0, 100.0, 10).unwrap();
        assert_eq!(h.total(), 1);
        assert_eq!(h.peak(), 4);
    }

    #[test]
    fn test_rgb_histogram() {
        let mut buf = PixelBuffer::allocate(2, 2, PixelType::Rgb8).unwrap();
        for y in 0..2 {
            for x in 0..2 {
                buf.set_sample(x, y, 0, 255.0);
            }
        }
        let h = rgb_histogram(&buf, 0.0, 255.0, 256).unwrap();
        assert_eq!(h.red.counts[255], 4);
        assert_eq!(h.green.counts[0], 4);
        let grey = PixelBuffer::allocate(2, 2, PixelType::U8).unwrap();
        assert!(rgb_histogram(&grey, 0.0, 255.0, 256).is_err());
    }

    #[test]
    fn test_line_points() {
        let pts = line_points(Point::new(0, 0), Point::new(3, 1));
        assert_eq!(pts.first(), Some(&Point::new(0, 0)));
        assert_eq!(pts.last(), Some(&Point::new(3, 1)));
        assert_eq!(pts.len(), 4);
        let single = line_points(Point::new(2, 2), Point::new(2, 2));
        assert_eq!(single, vec![Point::new(2, 2)]);
    }

    #[test]
    fn test_values_along_line() {
        let mut buf = PixelBuffer::allocate(5, 5, PixelType::U16).unwrap();
        for i in 0..5 {
            buf.set_sample(i, i, 0, i as f64 * 10.0);
        }
        let v = greyscale_values_along_line(&buf, Point::new(0, 0), Point::new(4, 4)).unwrap();
        assert_eq!(v, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert!(greyscale_values_along_line(&buf, Point::new(0, 0), Point::new(5, 0)).is_err());
    }
}
