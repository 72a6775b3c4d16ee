use nalgebra as na;
use crate::math::Vector2;
use std::ops::{Add, Mul};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A 2x2 matrix stored by columns, used for rotations and joint effective masses
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Matrix2 {
    pub col1: Vector2,
    pub col2: Vector2,
}

impl Matrix2 {
    /// Creates a matrix from its two columns
    #[inline]
    pub fn new(col1: Vector2, col2: Vector2) -> Self {
        Self { col1, col2 }
    }

    /// Creates a 2x2 identity matrix
    #[inline]
    pub fn identity() -> Self {
        Self::new(Vector2::unit_x(), Vector2::unit_y())
    }

    /// Creates a 2x2 zero matrix
    #[inline]
    pub fn zero() -> Self {
        Self::new(Vector2::zero(), Vector2::zero())
    }

    /// Creates a rotation matrix for the given angle in radians
    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(Vector2::new(c, s), Vector2::new(-s, c))
    }

    /// Returns the transpose (the inverse, for a rotation)
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::new(
            Vector2::new(self.col1.x, self.col2.x),
            Vector2::new(self.col1.y, self.col2.y),
        )
    }

    /// Component-wise absolute value
    #[inline]
    pub fn abs(&self) -> Self {
        Self::new(self.col1.abs(), self.col2.abs())
    }

    /// Returns the inverse, or the zero matrix when the matrix is singular.
    ///
    /// A zero effective-mass matrix makes the solver apply no impulse, which is the
    /// correct outcome for a constraint between two immovable bodies.
    pub fn invert(&self) -> Self {
        self.to_nalgebra()
            .try_inverse()
            .map(|m| Self::from_nalgebra(&m))
            .unwrap_or_else(Self::zero)
    }

    /// Convert to nalgebra Matrix2
    #[inline]
    pub fn to_nalgebra(&self) -> na::Matrix2<f32> {
        na::Matrix2::new(self.col1.x, self.col2.x, self.col1.y, self.col2.y)
    }

    /// Convert from nalgebra Matrix2
    #[inline]
    pub fn from_nalgebra(m: &na::Matrix2<f32>) -> Self {
        Self::new(
            Vector2::new(m[(0, 0)], m[(1, 0)]),
            Vector2::new(m[(0, 1)], m[(1, 1)]),
        )
    }
}

impl Default for Matrix2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul<Vector2> for Matrix2 {
    type Output = Vector2;
    #[inline]
    fn mul(self, v: Vector2) -> Vector2 {
        Vector2::new(
            self.col1.x * v.x + self.col2.x * v.y,
            self.col1.y * v.x + self.col2.y * v.y,
        )
    }
}

impl Mul for Matrix2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(self * rhs.col1, self * rhs.col2)
    }
}

impl Add for Matrix2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.col1 + rhs.col1, self.col2 + rhs.col2)
    }
}
