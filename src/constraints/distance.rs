use crate::constraints::Joint;
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::bodies::RigidBody;
use crate::error::PhysicsError;
use crate::math::{Vector2, EPSILON};
use crate::render::DebugRenderer;
use crate::Result;
use std::any::Any;

/// A rigid rod keeping two anchor points at a fixed distance
#[derive(Debug, Clone)]
pub struct DistanceJoint {
    bodies: [BodyHandle; 2],

    /// The anchor point on the first body (in local space)
    local_anchor_a: Vector2,

    /// The anchor point on the second body (in local space)
    local_anchor_b: Vector2,

    /// The desired distance between the anchor points
    rest_length: f32,

    r1: Vector2,
    r2: Vector2,

    /// Unit axis from anchor A to anchor B
    axis: Vector2,

    /// Effective mass along the axis
    mass: f32,

    bias: f32,

    /// Accumulated impulse along the axis
    impulse: f32,
}

impl DistanceJoint {
    /// Connects world-space `anchor_a` on `body_a` with `anchor_b` on `body_b`.
    /// The rest length is their current distance.
    pub fn new(
        bodies: &BodyStorage<RigidBody>,
        body_a: BodyHandle,
        anchor_a: Vector2,
        body_b: BodyHandle,
        anchor_b: Vector2,
    ) -> Result<Self> {
        if body_a == body_b {
            return Err(PhysicsError::InvalidParameter(format!(
                "A joint needs two distinct bodies, got {:?} twice",
                body_a
            )));
        }
        let a = bodies.get_body(body_a)?;
        let b = bodies.get_body(body_b)?;

        Ok(Self {
            bodies: [body_a, body_b],
            local_anchor_a: a.get_rotation_matrix().transpose() * (anchor_a - a.get_position()),
            local_anchor_b: b.get_rotation_matrix().transpose() * (anchor_b - b.get_position()),
            rest_length: anchor_a.distance(&anchor_b),
            r1: Vector2::zero(),
            r2: Vector2::zero(),
            axis: Vector2::zero(),
            mass: 0.0,
            bias: 0.0,
            impulse: 0.0,
        })
    }

    /// Returns the desired distance
    pub fn get_rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Sets the desired distance
    pub fn set_rest_length(&mut self, rest_length: f32) {
        self.rest_length = rest_length.max(0.0);
    }

    /// Returns the signed accumulated impulse (positive pushes the anchors apart)
    pub fn get_impulse(&self) -> f32 {
        self.impulse
    }
}

impl Joint for DistanceJoint {
    fn joint_type(&self) -> &'static str {
        "Distance"
    }

    fn get_bodies(&self) -> &[BodyHandle; 2] {
        &self.bodies
    }

    fn pre_step(&mut self, inv_dt: f32, bodies: &mut BodyStorage<RigidBody>, config: &SimulationConfig) {
        let (body_a, body_b) = match bodies.get_pair_mut(self.bodies[0], self.bodies[1]) {
            Ok(pair) => pair,
            Err(_) => return,
        };

        self.r1 = body_a.get_rotation_matrix() * self.local_anchor_a;
        self.r2 = body_b.get_rotation_matrix() * self.local_anchor_b;

        let delta = (body_b.get_position() + self.r2) - (body_a.get_position() + self.r1);
        let length = delta.length();

        // Coincident anchors give no usable axis; the joint idles until they separate.
        if length < EPSILON {
            self.axis = Vector2::zero();
            self.mass = 0.0;
            self.bias = 0.0;
            self.impulse = 0.0;
            return;
        }
        self.axis = delta / length;

        let cr1 = self.r1.cross(&self.axis);
        let cr2 = self.r2.cross(&self.axis);
        let k = body_a.get_inverse_mass()
            + body_b.get_inverse_mass()
            + body_a.get_inverse_inertia() * cr1 * cr1
            + body_b.get_inverse_inertia() * cr2 * cr2;
        self.mass = if k > 0.0 { 1.0 / k } else { 0.0 };

        self.bias = if config.position_correction {
            -config.joint_bias_factor * inv_dt * (length - self.rest_length)
        } else {
            0.0
        };

        if config.warm_starting {
            let p = self.impulse * self.axis;
            body_a.apply_impulse(-p, self.r1);
            body_b.apply_impulse(p, self.r2);
        } else {
            self.impulse = 0.0;
        }
    }

    fn apply_impulse(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        if self.mass == 0.0 {
            return;
        }

        let (body_a, body_b) = match bodies.get_pair_mut(self.bodies[0], self.bodies[1]) {
            Ok(pair) => pair,
            Err(_) => return,
        };

        let dv = body_b.velocity_at(self.r2) - body_a.velocity_at(self.r1);
        let cdot = dv.dot(&self.axis);
        let lambda = self.mass * (self.bias - cdot);

        let p = lambda * self.axis;
        body_a.apply_impulse(-p, self.r1);
        body_b.apply_impulse(p, self.r2);

        self.impulse += lambda;
    }

    fn accumulated_impulse(&self) -> f32 {
        self.impulse.abs()
    }

    fn draw(&self, bodies: &BodyStorage<RigidBody>, renderer: &mut dyn DebugRenderer) {
        let (Ok(a), Ok(b)) = (bodies.get_body(self.bodies[0]), bodies.get_body(self.bodies[1])) else {
            return;
        };
        renderer.draw_segment(
            a.get_position() + a.get_rotation_matrix() * self.local_anchor_a,
            b.get_position() + b.get_rotation_matrix() * self.local_anchor_b,
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
