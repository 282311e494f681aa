//! 2D affine matrix with order-aware composition.
//!
//! # Convention
//!
//! Points are column vectors; a matrix maps `(x, y)` to
//!
//! ```text
//! x' = a*x + c*y + tx
//! y' = b*x + d*y + ty
//! ```
//!
//! stored as `[a, b, c, d, tx, ty]` (glam column order).
//!
//! # Composition order
//!
//! Every builder takes a [`MatrixOrder`]:
//!
//! - [`MatrixOrder::Prepend`]: the new operation runs **before** the current
//!   transform (`M' = M * Op`).
//! - [`MatrixOrder::Append`]: the new operation runs **after** it (`M' = Op * M`).
//!
//! ```rust
//! use raster_math::{AffineMatrix, MatrixOrder};
//! use std::f64::consts::FRAC_PI_2;
//!
//! let mut pre = AffineMatrix::identity();
//! pre.scale(2.0, 1.0, MatrixOrder::Prepend);
//! pre.rotate(FRAC_PI_2, MatrixOrder::Prepend);
//!
//! let mut app = AffineMatrix::identity();
//! app.scale(2.0, 1.0, MatrixOrder::Append);
//! app.rotate(FRAC_PI_2, MatrixOrder::Append);
//!
//! // Prepend: rotate first, then scale. Append: scale first, then rotate.
//! let (px, py) = pre.transform_point(1.0, 0.0);
//! let (ax, ay) = app.transform_point(1.0, 0.0);
//! assert!((px - 0.0).abs() < 1e-12 && (py - 1.0).abs() < 1e-12);
//! assert!((ax - 0.0).abs() < 1e-12 && (ay - 2.0).abs() < 1e-12);
//! ```

use glam::{DAffine2, DVec2};
use raster_core::Rect;
use thiserror::Error;

/// Determinant magnitude below which a matrix counts as singular.
pub const SINGULAR_EPSILON: f64 = 1e-10;

/// Inversion of a non-invertible matrix.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("matrix is singular (determinant {determinant:e})")]
pub struct SingularMatrixError {
    /// Determinant of the linear part
    pub determinant: f64,
}

/// Where a new operation goes relative to the existing transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixOrder {
    /// New operation applies before the current transform.
    #[default]
    Prepend,
    /// New operation applies after the current transform.
    Append,
}

/// Mutable 2D affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMatrix {
    inner: DAffine2,
}

impl Default for AffineMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineMatrix {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        inner: DAffine2::IDENTITY,
    };

    /// Identity transform.
    #[inline]
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Builds a matrix from `[a, b, c, d, tx, ty]`.
    #[inline]
    pub fn from_elements(elements: [f64; 6]) -> Self {
        Self {
            inner: DAffine2::from_cols_array(&elements),
        }
    }

    /// Elements as `[a, b, c, d, tx, ty]`.
    #[inline]
    pub fn elements(&self) -> [f64; 6] {
        self.inner.to_cols_array()
    }

    /// Underlying glam transform.
    #[inline]
    pub fn as_daffine2(&self) -> DAffine2 {
        self.inner
    }

    /// Resets to identity.
    pub fn reset(&mut self) {
        self.inner = DAffine2::IDENTITY;
    }

    fn compose(&mut self, op: DAffine2, order: MatrixOrder) {
        self.inner = match order {
            MatrixOrder::Prepend => self.inner * op,
            MatrixOrder::Append => op * self.inner,
        };
    }

    /// Composes a scale.
    pub fn scale(&mut self, sx: f64, sy: f64, order: MatrixOrder) -> &mut Self {
        self.compose(DAffine2::from_scale(DVec2::new(sx, sy)), order);
        self
    }

    /// Composes a rotation by `radians` (positive turns +X towards +Y).
    pub fn rotate(&mut self, radians: f64, order: MatrixOrder) -> &mut Self {
        self.compose(DAffine2::from_angle(radians), order);
        self
    }

    /// Composes a rotation about `(cx, cy)`.
    pub fn rotate_at(&mut self, radians: f64, cx: f64, cy: f64, order: MatrixOrder) -> &mut Self {
        let op = DAffine2::from_translation(DVec2::new(cx, cy))
            * DAffine2::from_angle(radians)
            * DAffine2::from_translation(DVec2::new(-cx, -cy));
        self.compose(op, order);
        self
    }

    /// Composes a translation.
    pub fn translate(&mut self, dx: f64, dy: f64, order: MatrixOrder) -> &mut Self {
        self.compose(DAffine2::from_translation(DVec2::new(dx, dy)), order);
        self
    }

    /// Composes another matrix.
    pub fn multiply(&mut self, other: &AffineMatrix, order: MatrixOrder) -> &mut Self {
        self.compose(other.inner, order);
        self
    }

    /// Determinant of the linear part.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.inner.matrix2.determinant()
    }

    /// Returns true unless the determinant is within [`SINGULAR_EPSILON`] of zero.
    #[inline]
    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() >= SINGULAR_EPSILON
    }

    /// Returns true for the identity transform (within 1e-12).
    pub fn is_identity(&self) -> bool {
        self.inner.abs_diff_eq(DAffine2::IDENTITY, 1e-12)
    }

    /// Inverse transform, `None` if singular.
    pub fn inverse(&self) -> Option<Self> {
        self.is_invertible().then(|| Self {
            inner: self.inner.inverse(),
        })
    }

    /// Inverts in place.
    ///
    /// # Errors
    ///
    /// [`SingularMatrixError`] if the determinant is ~0; the matrix is left
    /// unchanged.
    pub fn invert(&mut self) -> Result<(), SingularMatrixError> {
        match self.inverse() {
            Some(inv) => {
                *self = inv;
                Ok(())
            }
            None => Err(SingularMatrixError {
                determinant: self.determinant(),
            }),
        }
    }

    /// Maps a point.
    #[inline]
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.inner.transform_point2(DVec2::new(x, y));
        (p.x, p.y)
    }

    /// Maps points in place.
    pub fn transform_points(&self, points: &mut [(f64, f64)]) {
        for p in points.iter_mut() {
            *p = self.transform_point(p.0, p.1);
        }
    }

    /// Integer rectangle enclosing the image of `rect`'s pixel centres.
    ///
    /// ```rust
    /// use raster_core::Rect;
    /// use raster_math::{AffineMatrix, MatrixOrder};
    ///
    /// let mut m = AffineMatrix::identity();
    /// m.scale(2.0, 3.0, MatrixOrder::Append);
    /// assert_eq!(m.bounding_rect(&Rect::new(0, 0, 9, 9)), Rect::new(0, 0, 18, 27));
    /// ```
    pub fn bounding_rect(&self, rect: &Rect) -> Rect {
        let mut corners = [
            (rect.left as f64, rect.top as f64),
            (rect.right as f64, rect.top as f64),
            (rect.left as f64, rect.bottom as f64),
            (rect.right as f64, rect.bottom as f64),
        ];
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        self.transform_points(&mut corners);
        for (tx, ty) in corners {
            min_x = min_x.min(tx);
            min_y = min_y.min(ty);
            max_x = max_x.max(tx);
            max_y = max_y.max(ty);
        }
        // Absorb rounding noise so exact integers stay put
        Rect::new(
            (min_x + 1e-9).floor() as i32,
            (min_y + 1e-9).floor() as i32,
            (max_x - 1e-9).ceil() as i32,
            (max_y - 1e-9).ceil() as i32,
        )
    }
}

impl std::ops::Mul for AffineMatrix {
    type Output = AffineMatrix;

    /// `self * rhs` applies `rhs` first.
    fn mul(self, rhs: AffineMatrix) -> AffineMatrix {
        AffineMatrix {
            inner: self.inner * rhs.inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity() {
        let m = AffineMatrix::identity();
        assert!(m.is_identity());
        assert_eq!(m.transform_point(3.5, -2.0), (3.5, -2.0));
        assert_eq!(m.elements(), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_order_changes_result() {
        let mut pre = AffineMatrix::identity();
        pre.scale(2.0, 1.0, MatrixOrder::Prepend)
            .rotate(FRAC_PI_2, MatrixOrder::Prepend);
        let mut app = AffineMatrix::identity();
        app.scale(2.0, 1.0, MatrixOrder::Append)
            .rotate(FRAC_PI_2, MatrixOrder::Append);

        // Prepend: S * R, rotation applies first: (1,0) -> (0,1) -> (0,1)
        let (x, y) = pre.transform_point(1.0, 0.0);
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 1.0, epsilon = 1e-12);

        // Append: R * S, scale applies first: (1,0) -> (2,0) -> (0,2)
        let (x, y) = app.transform_point(1.0, 0.0);
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_scale_commutes_with_rotation() {
        let mut pre = AffineMatrix::identity();
        pre.scale(2.0, 2.0, MatrixOrder::Prepend)
            .rotate(FRAC_PI_2, MatrixOrder::Prepend);
        let mut app = AffineMatrix::identity();
        app.scale(2.0, 2.0, MatrixOrder::Append)
            .rotate(FRAC_PI_2, MatrixOrder::Append);
        let (px, py) = pre.transform_point(1.0, 0.0);
        let (ax, ay) = app.transform_point(1.0, 0.0);
        assert_abs_diff_eq!(px, ax, epsilon = 1e-12);
        assert_abs_diff_eq!(py, ay, epsilon = 1e-12);
    }

    #[test]
    fn test_translate_order() {
        let mut pre = AffineMatrix::identity();
        pre.scale(2.0, 2.0, MatrixOrder::Append)
            .translate(1.0, 0.0, MatrixOrder::Prepend);
        assert_eq!(pre.transform_point(0.0, 0.0), (2.0, 0.0));

        let mut app = AffineMatrix::identity();
        app.scale(2.0, 2.0, MatrixOrder::Append)
            .translate(1.0, 0.0, MatrixOrder::Append);
        assert_eq!(app.transform_point(0.0, 0.0), (1.0, 0.0));
    }

    #[test]
    fn test_invert_round_trip() {
        let mut m = AffineMatrix::identity();
        m.scale(3.0, 0.5, MatrixOrder::Append)
            .rotate(0.3, MatrixOrder::Append)
            .translate(10.0, -4.0, MatrixOrder::Append);
        let original = m;
        m.invert().unwrap();
        let (x, y) = original.transform_point(7.0, 2.0);
        let (bx, by) = m.transform_point(x, y);
        assert_abs_diff_eq!(bx, 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(by, 2.0, epsilon = 1e-9);
        assert!((original * m).is_identity());
    }

    #[test]
    fn test_singular_invert_leaves_matrix() {
        let mut m = AffineMatrix::identity();
        m.scale(0.0, 4.0, MatrixOrder::Append)
            .translate(2.0, 2.0, MatrixOrder::Append);
        let before = m.elements();
        let err = m.invert().unwrap_err();
        assert_eq!(err.determinant, 0.0);
        assert_eq!(m.elements(), before);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_rotate_at_centre() {
        let mut m = AffineMatrix::identity();
        m.rotate_at(FRAC_PI_2, 5.0, 5.0, MatrixOrder::Append);
        let (x, y) = m.transform_point(5.0, 5.0);
        assert_abs_diff_eq!(x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 5.0, epsilon = 1e-12);
        let (x, y) = m.transform_point(6.0, 5.0);
        assert_abs_diff_eq!(x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_points_matches_single() {
        let mut m = AffineMatrix::identity();
        m.rotate(0.3, MatrixOrder::Append).translate(4.0, -1.0, MatrixOrder::Append);
        let mut pts = [(0.0, 0.0), (2.5, -3.0), (10.0, 7.0)];
        let expected: Vec<_> = pts.iter().map(|&(x, y)| m.transform_point(x, y)).collect();
        m.transform_points(&mut pts);
        assert_eq!(pts.to_vec(), expected);
    }
}
