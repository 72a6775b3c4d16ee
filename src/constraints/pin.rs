use crate::constraints::Joint;
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::bodies::RigidBody;
use crate::error::PhysicsError;
use crate::math::{Matrix2, Vector2};
use crate::render::DebugRenderer;
use crate::Result;
use std::any::Any;

/// A revolute joint pinning a point of body A to a point of body B.
///
/// Both bodies may rotate freely about the shared anchor.
#[derive(Debug, Clone)]
pub struct PinJoint {
    bodies: [BodyHandle; 2],

    /// The anchor point on the first body (in local space)
    local_anchor_a: Vector2,

    /// The anchor point on the second body (in local space)
    local_anchor_b: Vector2,

    /// World-space lever arms, refreshed every pre-step
    r1: Vector2,
    r2: Vector2,

    /// Inverse effective mass matrix
    mass: Matrix2,

    /// Target relative velocity at the anchor
    bias: Vector2,

    /// Accumulated impulse
    impulse: Vector2,

    /// Constraint force mixing; zero for a rigid pin
    softness: f32,
}

impl PinJoint {
    /// Pins `body_a` and `body_b` together at the world-space `anchor`
    pub fn new(bodies: &BodyStorage<RigidBody>, body_a: BodyHandle, body_b: BodyHandle, anchor: Vector2) -> Result<Self> {
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
            local_anchor_a: a.get_rotation_matrix().transpose() * (anchor - a.get_position()),
            local_anchor_b: b.get_rotation_matrix().transpose() * (anchor - b.get_position()),
            r1: Vector2::zero(),
            r2: Vector2::zero(),
            mass: Matrix2::zero(),
            bias: Vector2::zero(),
            impulse: Vector2::zero(),
            softness: 0.0,
        })
    }

    pub fn get_softness(&self) -> f32 {
        self.softness
    }

    /// Sets the softness; larger values let the anchors drift apart under load
    pub fn set_softness(&mut self, softness: f32) {
        self.softness = softness.max(0.0);
    }

    pub fn get_local_anchors(&self) -> (Vector2, Vector2) {
        (self.local_anchor_a, self.local_anchor_b)
    }

    /// Returns the accumulated impulse vector
    pub fn get_impulse(&self) -> Vector2 {
        self.impulse
    }

    /// World-space anchor positions on each body
    pub fn world_anchors(&self, bodies: &BodyStorage<RigidBody>) -> Result<(Vector2, Vector2)> {
        let a = bodies.get_body(self.bodies[0])?;
        let b = bodies.get_body(self.bodies[1])?;
        Ok((
            a.get_position() + a.get_rotation_matrix() * self.local_anchor_a,
            b.get_position() + b.get_rotation_matrix() * self.local_anchor_b,
        ))
    }
}

impl Joint for PinJoint {
    fn joint_type(&self) -> &'static str {
        "Pin"
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

        let (r1, r2) = (self.r1, self.r2);
        let inv_mass_sum = body_a.get_inverse_mass() + body_b.get_inverse_mass();
        let inv_i_a = body_a.get_inverse_inertia();
        let inv_i_b = body_b.get_inverse_inertia();

        // K = (1/mA + 1/mB) * I + invIA * skew(r1)^T skew(r1) + invIB * skew(r2)^T skew(r2)
        let k1 = Matrix2::new(Vector2::new(inv_mass_sum, 0.0), Vector2::new(0.0, inv_mass_sum));
        let k2 = Matrix2::new(
            Vector2::new(inv_i_a * r1.y * r1.y, -inv_i_a * r1.x * r1.y),
            Vector2::new(-inv_i_a * r1.x * r1.y, inv_i_a * r1.x * r1.x),
        );
        let k3 = Matrix2::new(
            Vector2::new(inv_i_b * r2.y * r2.y, -inv_i_b * r2.x * r2.y),
            Vector2::new(-inv_i_b * r2.x * r2.y, inv_i_b * r2.x * r2.x),
        );

        let mut k = k1 + k2 + k3;
        k.col1.x += self.softness;
        k.col2.y += self.softness;
        self.mass = k.invert();

        let p1 = body_a.get_position() + r1;
        let p2 = body_b.get_position() + r2;
        let dp = p2 - p1;

        self.bias = if config.position_correction {
            -config.joint_bias_factor * inv_dt * dp
        } else {
            Vector2::zero()
        };

        if config.warm_starting {
            // Apply accumulated impulse.
            body_a.apply_impulse(-self.impulse, r1);
            body_b.apply_impulse(self.impulse, r2);
        } else {
            self.impulse = Vector2::zero();
        }
    }

    fn apply_impulse(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let (body_a, body_b) = match bodies.get_pair_mut(self.bodies[0], self.bodies[1]) {
            Ok(pair) => pair,
            Err(_) => return,
        };

        let dv = body_b.velocity_at(self.r2) - body_a.velocity_at(self.r1);
        let impulse = self.mass * (self.bias - dv - self.softness * self.impulse);

        body_a.apply_impulse(-impulse, self.r1);
        body_b.apply_impulse(impulse, self.r2);

        self.impulse += impulse;
    }

    fn accumulated_impulse(&self) -> f32 {
        self.impulse.length()
    }

    fn draw(&self, bodies: &BodyStorage<RigidBody>, renderer: &mut dyn DebugRenderer) {
        let (Ok(a), Ok(b)) = (bodies.get_body(self.bodies[0]), bodies.get_body(self.bodies[1])) else {
            return;
        };
        let Ok((anchor_a, anchor_b)) = self.world_anchors(bodies) else {
            return;
        };

        renderer.draw_segment(a.get_position(), anchor_a);
        renderer.draw_segment(anchor_a, b.get_position());
        renderer.draw_segment(b.get_position(), anchor_b);
        renderer.draw_segment(anchor_b, a.get_position());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
