use crate::bodies::{BodyFlags, Material};
use crate::collision::CollisionFilter;
use crate::error::PhysicsError;
use crate::math::{Aabb2, Matrix2, Vector2};
use crate::render::DebugRenderer;
use crate::Result;

/// A rigid box for physics simulation.
///
/// A body with zero inverse mass is static: it is never integrated and never
/// moved by the solver, and two static bodies are never tested against each other.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// Position of the center of mass in world space
    position: Vector2,

    /// Orientation in radians
    rotation: f32,

    /// The body's linear velocity
    velocity: Vector2,

    /// The body's angular velocity (radians per second)
    angular_velocity: f32,

    /// Force accumulated for the next integration step
    force: Vector2,

    /// Torque accumulated for the next integration step
    torque: f32,

    /// Half of the box's width and height
    half_extents: Vector2,

    /// Per-axis speed limit; a zero component leaves that axis uncapped
    velocity_cap: Vector2,

    /// The body's material properties
    material: Material,

    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,

    /// Contact state, rebuilt every broad phase
    flags: BodyFlags,

    /// Which other bodies this one may collide with
    filter: CollisionFilter,
}

impl RigidBody {
    /// Creates a static unit box at rest at the origin
    pub fn new() -> Self {
        Self {
            position: Vector2::zero(),
            rotation: 0.0,
            velocity: Vector2::zero(),
            angular_velocity: 0.0,
            force: Vector2::zero(),
            torque: 0.0,
            half_extents: Vector2::new(0.5, 0.5),
            velocity_cap: Vector2::zero(),
            material: Material::default(),
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            flags: BodyFlags::empty(),
            filter: CollisionFilter::default(),
        }
    }

    /// Creates a dynamic box with the given half extents and mass
    pub fn new_box(half_extents: Vector2, mass: f32) -> Result<Self> {
        let mut body = Self::new();
        body.set(half_extents, mass)?;
        Ok(body)
    }

    /// Creates a static (infinite mass) box with the given half extents
    pub fn new_static(half_extents: Vector2) -> Result<Self> {
        Self::new_box(half_extents, 0.0)
    }

    /// Configures the box shape and mass and resets the kinematic state.
    ///
    /// A mass of zero or `+inf` makes the body static. Negative or NaN masses and
    /// negative or non-finite half extents are rejected.
    pub fn set(&mut self, half_extents: Vector2, mass: f32) -> Result<()> {
        if !half_extents.is_finite() || half_extents.x < 0.0 || half_extents.y < 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "half extents must be finite and non-negative, got {}",
                half_extents
            )));
        }
        if mass.is_nan() || mass < 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "mass must be zero, positive or infinite, got {}",
                mass
            )));
        }

        self.half_extents = half_extents;
        self.position = Vector2::zero();
        self.rotation = 0.0;
        self.velocity = Vector2::zero();
        self.angular_velocity = 0.0;
        self.force = Vector2::zero();
        self.torque = 0.0;

        if mass > 0.0 && mass.is_finite() {
            self.mass = mass;
            self.inv_mass = 1.0 / mass;
            self.inertia = mass * half_extents.length_squared() / 3.0;
            self.inv_inertia = if self.inertia > 0.0 { 1.0 / self.inertia } else { 0.0 };
        } else {
            self.mass = 0.0;
            self.inv_mass = 0.0;
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
        }

        Ok(())
    }

    /// Returns true if the body has infinite mass
    #[inline]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Returns the body's position
    pub fn get_position(&self) -> Vector2 {
        self.position
    }

    /// Sets the body's position
    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
    }

    /// Returns the body's rotation in radians
    pub fn get_rotation(&self) -> f32 {
        self.rotation
    }

    /// Sets the body's rotation in radians
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    /// Returns the rotation as a 2x2 matrix
    #[inline]
    pub fn get_rotation_matrix(&self) -> Matrix2 {
        Matrix2::from_angle(self.rotation)
    }

    /// Returns the body's linear velocity
    pub fn get_linear_velocity(&self) -> Vector2 {
        self.velocity
    }

    /// Sets the body's linear velocity
    pub fn set_linear_velocity(&mut self, velocity: Vector2) {
        self.velocity = velocity;
    }

    /// Returns the body's angular velocity
    pub fn get_angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Sets the body's angular velocity
    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.angular_velocity = angular_velocity;
    }

    pub fn get_half_extents(&self) -> Vector2 {
        self.half_extents
    }

    /// Returns the body's mass (zero for static bodies)
    pub fn get_mass(&self) -> f32 {
        self.mass
    }

    pub fn get_inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Returns the moment of inertia about the center of mass (zero for static bodies)
    pub fn get_inertia(&self) -> f32 {
        self.inertia
    }

    pub fn get_inverse_inertia(&self) -> f32 {
        self.inv_inertia
    }

    /// Returns the body's material
    pub fn get_material(&self) -> &Material {
        &self.material
    }

    /// Sets the body's material
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn get_friction(&self) -> f32 {
        self.material.friction
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.material.friction = friction.max(0.0);
    }

    /// Returns the per-axis terminal velocity
    pub fn get_velocity_cap(&self) -> Vector2 {
        self.velocity_cap
    }

    /// Sets the per-axis terminal velocity; components are taken as magnitudes
    pub fn set_velocity_cap(&mut self, cap: Vector2) {
        self.velocity_cap = cap.abs();
    }

    pub fn get_collision_filter(&self) -> CollisionFilter {
        self.filter
    }

    pub fn set_collision_filter(&mut self, filter: CollisionFilter) {
        self.filter = filter;
    }

    /// Adds a force through the center of mass for the next step
    pub fn add_force(&mut self, force: Vector2) {
        self.force += force;
    }

    /// Adds a torque for the next step
    pub fn add_torque(&mut self, torque: f32) {
        self.torque += torque;
    }

    /// Returns the force accumulated since the last step
    pub fn get_force(&self) -> Vector2 {
        self.force
    }

    /// Returns the torque accumulated since the last step
    pub fn get_torque(&self) -> f32 {
        self.torque
    }

    /// Applies an impulse at `lever_arm` (offset from the center of mass).
    /// Static bodies are unaffected.
    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vector2, lever_arm: Vector2) {
        self.velocity += self.inv_mass * impulse;
        self.angular_velocity += self.inv_inertia * lever_arm.cross(&impulse);
    }

    /// Velocity of the material point at `lever_arm` from the center of mass
    #[inline]
    pub fn velocity_at(&self, lever_arm: Vector2) -> Vector2 {
        self.velocity + Vector2::scalar_cross(self.angular_velocity, &lever_arm)
    }

    pub fn get_flags(&self) -> BodyFlags {
        self.flags
    }

    /// True if the body touched any other body during the last broad phase
    pub fn is_in_touch(&self) -> bool {
        self.flags.contains(BodyFlags::IN_TOUCH)
    }

    /// True if the body rested on a static body during the last broad phase
    pub fn is_grounded(&self) -> bool {
        self.flags.contains(BodyFlags::GROUNDED)
    }

    pub(crate) fn flags_mut(&mut self) -> &mut BodyFlags {
        &mut self.flags
    }

    /// Applies gravity and the accumulated force and torque to the velocities
    pub(crate) fn integrate_forces(&mut self, gravity: Vector2, dt: f32) {
        if self.is_static() {
            return;
        }

        self.velocity += dt * (gravity + self.inv_mass * self.force);
        self.angular_velocity += dt * self.inv_inertia * self.torque;

        if self.velocity_cap.x > 0.0 {
            self.velocity.x = crate::math::clamp(self.velocity.x, -self.velocity_cap.x, self.velocity_cap.x);
        }
        if self.velocity_cap.y > 0.0 {
            self.velocity.y = crate::math::clamp(self.velocity.y, -self.velocity_cap.y, self.velocity_cap.y);
        }
    }

    /// Advances position and rotation by the current velocities
    pub(crate) fn integrate_velocity(&mut self, dt: f32) {
        if self.is_static() {
            return;
        }

        self.position += dt * self.velocity;
        self.rotation += dt * self.angular_velocity;
    }

    pub(crate) fn clear_forces(&mut self) {
        self.force = Vector2::zero();
        self.torque = 0.0;
    }

    /// Corners of the box in world space, counter-clockwise from the bottom left
    pub fn world_vertices(&self) -> [Vector2; 4] {
        let rot = self.get_rotation_matrix();
        let h = self.half_extents;
        [
            self.position + rot * Vector2::new(-h.x, -h.y),
            self.position + rot * Vector2::new(h.x, -h.y),
            self.position + rot * Vector2::new(h.x, h.y),
            self.position + rot * Vector2::new(-h.x, h.y),
        ]
    }

    /// World-space bounds of the rotated box
    pub fn get_world_bounds(&self) -> Aabb2 {
        Aabb2::from_oriented_box(self.position, self.half_extents, self.rotation)
    }

    /// Hands the body's outline to a renderer. Reads only position, rotation and shape.
    pub fn draw(&self, renderer: &mut dyn DebugRenderer) {
        renderer.draw_polygon(&self.world_vertices(), self.is_static());
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}
