// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Small fixed-size linear algebra for the flame model: a 2D vector,
//! a 2x2 matrix, an affine map built from the two, and an RGB color.
//!
//! The matrix convention is fixed here and used everywhere else in
//! the crate: `Matrix2 { a, b, c, d }` holds the rows `(a b)` and
//! `(c d)`, so applying it to `(x, y)` yields `(a·x + b·y, c·x + d·y)`.
//! The "first column" is therefore `(a, c)` and the second `(b, d)`.

use num::Zero;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub};

/// Determinants with a smaller magnitude than this are treated as
/// singular.
pub const SINGULAR_EPSILON: f64 = 1e-12;

/// A point or displacement in the plane.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vector2 {
    /// Constructor.
    pub fn new(x: f64, y: f64) -> Self {
        Vector2 { x, y }
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// True when neither component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Zero for Vector2 {
    fn zero() -> Self {
        Vector2::new(0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;
    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f64> for Vector2 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Div<f64> for Vector2 {
    type Output = Vector2;
    fn div(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x / rhs, self.y / rhs)
    }
}

/// A 2x2 matrix stored row by row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix2 {
    /// Row 0, column 0.
    pub a: f64,
    /// Row 0, column 1.
    pub b: f64,
    /// Row 1, column 0.
    pub c: f64,
    /// Row 1, column 1.
    pub d: f64,
}

impl Matrix2 {
    /// Constructor, entries given row by row.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Matrix2 { a, b, c, d }
    }

    /// The identity matrix.
    pub fn identity() -> Self {
        Matrix2::new(1.0, 0.0, 0.0, 1.0)
    }

    /// Builds a matrix whose two columns are the given vectors.  This
    /// is how Jacobians are assembled from partial derivatives.
    pub fn from_columns(first: Vector2, second: Vector2) -> Self {
        Matrix2::new(first.x, second.x, first.y, second.y)
    }

    /// Counter-clockwise rotation by `theta` radians.
    pub fn rotation(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Matrix2::new(c, -s, s, c)
    }

    /// Determinant.
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// The inverse, or `None` when the matrix is singular (or so close
    /// to it that the inverse is meaningless).
    pub fn inverse(&self) -> Option<Matrix2> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        Some(Matrix2::new(self.d, -self.b, -self.c, self.a) * (1.0 / det))
    }

    /// Multiplies the first column `(a, c)` by `factor`.
    pub fn scale_first_column(&mut self, factor: f64) {
        self.a *= factor;
        self.c *= factor;
    }

    /// Multiplies the second column `(b, d)` by `factor`.
    pub fn scale_second_column(&mut self, factor: f64) {
        self.b *= factor;
        self.d *= factor;
    }

    /// True when no entry is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite() && self.d.is_finite()
    }
}

impl Default for Matrix2 {
    fn default() -> Self {
        Matrix2::identity()
    }
}

impl Mul for Matrix2 {
    type Output = Matrix2;
    fn mul(self, rhs: Matrix2) -> Matrix2 {
        Matrix2::new(
            self.a * rhs.a + self.b * rhs.c,
            self.a * rhs.b + self.b * rhs.d,
            self.c * rhs.a + self.d * rhs.c,
            self.c * rhs.b + self.d * rhs.d,
        )
    }
}

impl Mul<Vector2> for Matrix2 {
    type Output = Vector2;
    fn mul(self, v: Vector2) -> Vector2 {
        Vector2::new(self.a * v.x + self.b * v.y, self.c * v.x + self.d * v.y)
    }
}

impl Mul<f64> for Matrix2 {
    type Output = Matrix2;
    fn mul(self, s: f64) -> Matrix2 {
        Matrix2::new(self.a * s, self.b * s, self.c * s, self.d * s)
    }
}

impl Mul<Matrix2> for f64 {
    type Output = Matrix2;
    fn mul(self, m: Matrix2) -> Matrix2 {
        m * self
    }
}

impl MulAssign<f64> for Matrix2 {
    fn mul_assign(&mut self, s: f64) {
        *self = *self * s;
    }
}

/// A linear transform followed by a translation: `map(p) = m·p + c`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AffineMap {
    /// Linear part.
    pub m: Matrix2,
    /// Translation.
    pub c: Vector2,
}

impl AffineMap {
    /// Constructor.
    pub fn new(m: Matrix2, c: Vector2) -> Self {
        AffineMap { m, c }
    }

    /// The map that leaves every point where it is.
    pub fn identity() -> Self {
        AffineMap::new(Matrix2::identity(), Vector2::zero())
    }

    /// Apply the map to a point.
    #[inline]
    pub fn map(&self, p: Vector2) -> Vector2 {
        self.m * p + self.c
    }

    /// Inverse of the linear part, `None` when singular.
    pub fn inverse_matrix(&self) -> Option<Matrix2> {
        self.m.inverse()
    }

    /// The full inverse affine map, `None` when the linear part is
    /// singular.
    pub fn inverse(&self) -> Option<AffineMap> {
        let inv = self.m.inverse()?;
        Some(AffineMap::new(inv, -(inv * self.c)))
    }
}

/// An RGB color with real-valued channels, nominally in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color3 {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

impl Color3 {
    /// Constructor.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Color3 { r, g, b }
    }

    /// All three channels set to `v`.
    pub fn gray(v: f64) -> Self {
        Color3::new(v, v, v)
    }

    /// Unit white, the starting value of the running color.
    pub fn white() -> Self {
        Color3::gray(1.0)
    }

    /// Weighted blend: `weight` of `self` plus `1 - weight` of `other`.
    #[inline]
    pub fn blend(self, other: Color3, weight: f64) -> Color3 {
        self * weight + other * (1.0 - weight)
    }
}

impl Default for Color3 {
    fn default() -> Self {
        Color3::white()
    }
}

impl Add for Color3 {
    type Output = Color3;
    fn add(self, rhs: Color3) -> Color3 {
        Color3::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Mul<f64> for Color3 {
    type Output = Color3;
    fn mul(self, s: f64) -> Color3 {
        Color3::new(self.r * s, self.g * s, self.b * s)
    }
}
