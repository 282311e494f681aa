//! Point and rectangle types for region-based operations.
//!
//! # Coordinate System
//!
//! Origin (0, 0) is the **top-left** pixel, X grows right and Y grows down.
//!
//! # Inclusive rectangles
//!
//! A [`Rect`] names its four edge pixels: `left..=right` by `top..=bottom`.
//! `Rect::new(0, 0, 9, 9)` covers a 10x10 block. Every operation in the
//! workspace takes inclusive rectangles.
//!
//! Toolkits that describe rectangles half-open (the right/bottom edge is one
//! past the last pixel) go through [`Rect::from_half_open`] and
//! [`Rect::to_half_open`]; those two functions are the only place the +-1
//! adjustment happens.
//!
//! ```text
//! (0,0) ────────► X
//!   │   left        right
//!   │    ┌──────────┐ top
//!   │    │  Region  │
//!   │    └──────────┘ bottom
//!   ▼
//!   Y
//! ```
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{Point, Rect};
//!
//! let r = Rect::new(10, 20, 109, 69);
//! assert_eq!((r.width(), r.height()), (100, 50));
//! assert!(r.contains(Point::new(109, 69)));
//!
//! // A 100x50 half-open rectangle starting at (10, 20)
//! assert_eq!(Rect::from_half_open(10, 20, 110, 70), r);
//! assert_eq!(r.to_half_open(), (10, 20, 110, 70));
//! ```

/// Integer pixel position or offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl Point {
    /// Creates a point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Origin `(0, 0)`.
    pub const ZERO: Self = Self::new(0, 0);

    /// Squared euclidean length, used to rank offsets.
    #[inline]
    pub const fn length_squared(&self) -> i64 {
        (self.x as i64) * (self.x as i64) + (self.y as i64) * (self.y as i64)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Rectangle with inclusive edges on all four sides.
///
/// # Invariants
///
/// A rectangle with `right < left` or `bottom < top` is empty.
///
/// # Example
///
/// ```rust
/// use raster_core::Rect;
///
/// let rect = Rect::from_size(640, 480);
/// assert_eq!(rect.right, 639);
/// assert_eq!(rect.area(), 640 * 480);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left edge (inclusive)
    pub left: i32,
    /// Top edge (inclusive)
    pub top: i32,
    /// Right edge (inclusive)
    pub right: i32,
    /// Bottom edge (inclusive)
    pub bottom: i32,
}

impl Rect {
    /// Creates a rectangle from its inclusive edges.
    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle covering a whole `width` x `height` image.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32 - 1, height as i32 - 1)
    }

    /// Rectangle from an origin and a size in pixels.
    #[inline]
    pub const fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(x, y, x + width as i32 - 1, y + height as i32 - 1)
    }

    /// Converts from half-open edges (`right`/`bottom` one past the last pixel).
    #[inline]
    pub const fn from_half_open(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - 1, bottom - 1)
    }

    /// Converts to half-open `(left, top, right, bottom)`.
    #[inline]
    pub const fn to_half_open(&self) -> (i32, i32, i32, i32) {
        (self.left, self.top, self.right + 1, self.bottom + 1)
    }

    /// Width in pixels, 0 when empty.
    #[inline]
    pub const fn width(&self) -> u32 {
        if self.right < self.left {
            0
        } else {
            (self.right - self.left + 1) as u32
        }
    }

    /// Height in pixels, 0 when empty.
    #[inline]
    pub const fn height(&self) -> u32 {
        if self.bottom < self.top {
            0
        } else {
            (self.bottom - self.top + 1) as u32
        }
    }

    /// Number of pixels covered.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Returns true if the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.right < self.left || self.bottom < self.top
    }

    /// Top-left corner.
    #[inline]
    pub const fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Returns true if `p` is inside.
    #[inline]
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Returns true if `other` lies entirely inside `self`.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// Overlap of two rectangles, `None` if they do not intersect.
    ///
    /// # Example
    ///
    /// ```rust
    /// use raster_core::Rect;
    ///
    /// let a = Rect::new(0, 0, 9, 9);
    /// let b = Rect::new(5, 5, 14, 14);
    /// assert_eq!(a.intersect(&b), Some(Rect::new(5, 5, 9, 9)));
    /// ```
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if r.is_empty() { None } else { Some(r) }
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Shifts the rectangle by an offset.
    #[inline]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    /// Re-expresses the rectangle relative to `origin`.
    #[inline]
    pub const fn relative_to(&self, origin: Point) -> Rect {
        self.translate(-origin.x, -origin.y)
    }

    /// Clips to a `width` x `height` image, `None` if nothing remains.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        self.intersect(&Rect::from_size(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_size() {
        let r = Rect::new(0, 0, 0, 0);
        assert_eq!(r.width(), 1);
        assert_eq!(r.height(), 1);
        assert_eq!(r.area(), 1);
        assert!(!r.is_empty());
        assert!(Rect::new(5, 0, 4, 3).is_empty());
        assert_eq!(Rect::new(5, 0, 4, 3).width(), 0);
    }

    #[test]
    fn test_half_open_round_trip() {
        let r = Rect::from_half_open(3, 4, 13, 24);
        assert_eq!(r, Rect::new(3, 4, 12, 23));
        assert_eq!(r.width(), 10);
        assert_eq!(r.height(), 20);
        assert_eq!(r.to_half_open(), (3, 4, 13, 24));
    }

    #[test]
    fn test_intersect_touching_edges() {
        let a = Rect::new(0, 0, 9, 9);
        // Shares only column 9
        let b = Rect::new(9, 0, 20, 9);
        assert_eq!(a.intersect(&b), Some(Rect::new(9, 0, 9, 9)));
        let c = Rect::new(10, 0, 20, 9);
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_clamp_and_translate() {
        let r = Rect::new(-5, -5, 4, 4);
        assert_eq!(r.clamp_to(3, 3), Some(Rect::new(0, 0, 2, 2)));
        assert_eq!(r.translate(5, 5), Rect::new(0, 0, 9, 9));
        assert_eq!(
            Rect::new(10, 10, 19, 19).relative_to(Point::new(10, 10)),
            Rect::new(0, 0, 9, 9)
        );
        assert_eq!(Rect::new(20, 20, 30, 30).clamp_to(10, 10), None);
    }

    #[test]
    fn test_point_ops() {
        let p = Point::new(3, -4);
        assert_eq!(p.length_squared(), 25);
        assert_eq!(p + Point::new(1, 1), Point::new(4, -3));
        assert_eq!(p - p, Point::ZERO);
    }
}
