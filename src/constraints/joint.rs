use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::bodies::RigidBody;
use crate::render::DebugRenderer;
use std::any::Any;

/// A persistent velocity constraint between two bodies.
///
/// The world drives every joint through the same two calls each step: `pre_step`
/// once, then `apply_impulse` once per solver iteration, after all contacts.
pub trait Joint: Send + Sync + 'static {
    /// Returns the type name of the joint
    fn joint_type(&self) -> &'static str;

    /// Returns the two bodies involved in the joint
    fn get_bodies(&self) -> &[BodyHandle; 2];

    /// Checks if the joint involves a specific body
    fn involves_body(&self, body: BodyHandle) -> bool {
        self.get_bodies().contains(&body)
    }

    /// Computes the effective mass and bias from the current configuration and
    /// warm starts with the accumulated impulse
    fn pre_step(&mut self, inv_dt: f32, bodies: &mut BodyStorage<RigidBody>, config: &SimulationConfig);

    /// Applies the impulse that drives the velocity error toward the bias
    fn apply_impulse(&mut self, bodies: &mut BodyStorage<RigidBody>);

    /// Magnitude of the impulse accumulated this step
    fn accumulated_impulse(&self) -> f32;

    /// Draws the joint as line segments
    fn draw(&self, bodies: &BodyStorage<RigidBody>, renderer: &mut dyn DebugRenderer);

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns a dynamic mutable reference to any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
