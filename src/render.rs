//! Observational drawing hook.
//!
//! The simulation never depends on a renderer; hosts implement [`DebugRenderer`]
//! and call `PhysicsWorld::draw` (or `RigidBody::draw`) after a step.

use crate::math::Vector2;

/// Receives world-space primitives describing the current simulation state
pub trait DebugRenderer {
    /// Draws a closed polygon. `is_static` lets the host style immovable bodies differently.
    fn draw_polygon(&mut self, vertices: &[Vector2], is_static: bool);

    /// Draws a line segment, used for joints
    fn draw_segment(&mut self, from: Vector2, to: Vector2);

    /// Draws a single point, used for contact points
    fn draw_point(&mut self, _point: Vector2) {}
}
