use crate::error::PhysicsError;
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Surface properties that feed the contact solver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coulomb friction coefficient
    pub friction: f32,

    /// Coefficient of restitution (bounciness), 0-1
    pub restitution: f32,
}

impl Material {
    /// Creates a new material, rejecting negative or non-finite coefficients
    pub fn new(friction: f32, restitution: f32) -> Result<Self> {
        if !(friction.is_finite() && friction >= 0.0) {
            return Err(PhysicsError::InvalidParameter(format!(
                "friction must be finite and non-negative, got {}",
                friction
            )));
        }
        if !(restitution.is_finite() && restitution >= 0.0) {
            return Err(PhysicsError::InvalidParameter(format!(
                "restitution must be finite and non-negative, got {}",
                restitution
            )));
        }
        Ok(Self { friction, restitution })
    }

    /// Friction of a contact between two materials.
    ///
    /// The geometric mean lets a frictionless surface cancel friction entirely.
    #[inline]
    pub fn combine_friction(a: f32, b: f32) -> f32 {
        (a * b).sqrt()
    }

    /// Restitution of a contact between two materials
    #[inline]
    pub fn combine_restitution(a: f32, b: f32) -> f32 {
        a.max(b)
    }

    /// Creates a material for ice (low friction, slight bounce)
    pub fn ice() -> Self {
        Self { friction: 0.05, restitution: 0.1 }
    }

    /// Creates a material for rubber (high friction, bouncy)
    pub fn rubber() -> Self {
        Self { friction: 0.9, restitution: 0.7 }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.2,
            restitution: 0.0,
        }
    }
}
