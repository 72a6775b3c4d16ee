mod vector;
mod matrix;
mod aabb;

pub use vector::Vector2;
pub use matrix::Matrix2;
pub use aabb::Aabb2;

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;

/// Returns true if the two floating point values are approximately equal
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Returns true if the value is approximately zero
#[inline]
pub fn approx_zero(a: f32) -> bool {
    a.abs() < EPSILON
}

/// Clamps a value between a minimum and maximum value
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Returns -1 for negative values and 1 otherwise (zero counts as positive)
#[inline]
pub fn sign_nonzero(value: f32) -> f32 {
    if value < 0.0 { -1.0 } else { 1.0 }
}
