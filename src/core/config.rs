use crate::math::Vector2;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters for the physics simulation.
///
/// Owned by a [`PhysicsWorld`](crate::core::PhysicsWorld); edits take effect on the next step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct SimulationConfig {
    /// Global acceleration applied to every dynamic body
    pub gravity: Vector2,

    /// The number of sequential-impulse passes per step
    pub iterations: u32,

    /// Reapply last step's accumulated impulses before iterating
    pub warm_starting: bool,

    /// Clamp accumulated rather than incremental impulses
    pub accumulate_impulses: bool,

    /// Feed penetration and joint drift back as bias velocities
    pub position_correction: bool,

    /// Penetration tolerated before position correction kicks in
    pub allowed_penetration: f32,

    /// Fraction of the penetration removed per step (Baumgarte factor)
    pub bias_factor: f32,

    /// Upper bound on the contact bias velocity
    pub max_bias_velocity: f32,

    /// Approach speed below which restitution is ignored
    pub restitution_velocity_threshold: f32,

    /// Fraction of the joint drift removed per step
    pub joint_bias_factor: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vector2::new(0.0, -10.0),
            iterations: 10,
            warm_starting: true,
            accumulate_impulses: true,
            position_correction: true,
            allowed_penetration: 0.01,
            bias_factor: 0.2,
            max_bias_velocity: 10.0,
            restitution_velocity_threshold: 1.0,
            joint_bias_factor: 0.2,
        }
    }
}
