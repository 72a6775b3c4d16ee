use std::collections::BTreeMap;

use tracing::{debug, error, instrument, trace};

use crate::bodies::{BodyFlags, RigidBody};
use crate::collision::{
    Arbiter, ArbiterKey, BoxNarrowPhase, BroadPhase, BruteForceBroadPhase, Contact, NarrowPhase,
    MAX_CONTACT_POINTS,
};
use crate::constraints::Joint;
use crate::core::events::{BodyEvent, BodyEventType, CollisionEvent, CollisionEventType, EventQueue};
use crate::core::storage::{BodyStorage, JointStorage, Storage};
use crate::core::{BodyHandle, JointHandle, SimulationConfig};
use crate::error::PhysicsError;
use crate::math::Vector2;
use crate::render::DebugRenderer;
use crate::Result;

/// Minimum cosine between a contact normal and gravity for the contact to count as ground
const GROUND_NORMAL_COS: f32 = 0.5;

/// The physics world: owns bodies, joints and the live arbiters, and advances them in time
pub struct PhysicsWorld {
    /// All rigid bodies, in insertion order
    bodies: BodyStorage<RigidBody>,

    /// All joints, in insertion order
    joints: JointStorage<Box<dyn Joint>>,

    /// Live contact constraints, iterated in key order
    arbiters: BTreeMap<ArbiterKey, Arbiter>,

    /// Configuration for the simulation
    config: SimulationConfig,

    broad_phase: Box<dyn BroadPhase>,
    narrow_phase: Box<dyn NarrowPhase>,

    /// Queue of physics events
    events: EventQueue,

    /// Set once a narrow phase has returned an oversized manifold
    contract_violation_reported: bool,

    /// The total elapsed simulation time
    time: f32,
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new physics world with the given configuration
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            bodies: BodyStorage::new(),
            joints: JointStorage::new(),
            arbiters: BTreeMap::new(),
            config,
            broad_phase: Box::new(BruteForceBroadPhase::new()),
            narrow_phase: Box::new(BoxNarrowPhase::new()),
            events: EventQueue::new(),
            contract_violation_reported: false,
            time: 0.0,
        }
    }

    /// Replaces the contact generator used for every body pair
    pub fn set_narrow_phase(&mut self, narrow_phase: Box<dyn NarrowPhase>) {
        self.narrow_phase = narrow_phase;
    }

    /// Replaces the pair discovery algorithm
    pub fn set_broad_phase(&mut self, broad_phase: Box<dyn BroadPhase>) {
        self.broad_phase = broad_phase;
    }

    /// Returns the current simulation time
    pub fn get_time(&self) -> f32 {
        self.time
    }

    /// Sets the gravity for the simulation
    pub fn set_gravity(&mut self, gravity: Vector2) {
        self.config.gravity = gravity;
    }

    /// Gets the current gravity
    pub fn get_gravity(&self) -> Vector2 {
        self.config.gravity
    }

    /// Returns a reference to the simulation configuration
    pub fn get_config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns a mutable reference to the simulation configuration
    pub fn get_config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    pub fn set_config(&mut self, config: SimulationConfig) {
        self.config = config;
    }

    /// Adds a rigid body to the world and returns its handle
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = self.bodies.add(body);

        self.events.add_body_event(BodyEvent {
            event_type: BodyEventType::Added,
            body: handle,
        });

        handle
    }

    /// Removes a rigid body together with its arbiters and joints
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        let body = self.bodies.remove(handle).ok_or_else(|| {
            PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle))
        })?;

        let stale: Vec<ArbiterKey> = self.arbiters.keys().filter(|key| key.contains(handle)).copied().collect();
        for key in stale {
            self.arbiters.remove(&key);
            self.events.add_collision_event(CollisionEvent {
                event_type: CollisionEventType::End,
                pair: key,
                contact_count: 0,
            });
        }

        let joint_handles: Vec<JointHandle> = self
            .joints
            .iter()
            .filter_map(|(j_handle, joint)| joint.involves_body(handle).then_some(j_handle))
            .collect();
        for j_handle in joint_handles {
            self.joints.remove(j_handle);
        }

        self.events.add_body_event(BodyEvent {
            event_type: BodyEventType::Removed,
            body: handle,
        });

        Ok(body)
    }

    /// Gets a reference to a rigid body by its handle
    pub fn get_body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.get_body(handle)
    }

    /// Gets a mutable reference to a rigid body by its handle
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies.get_body_mut(handle)
    }

    /// Read access to the body collection, e.g. for building joints
    pub fn bodies(&self) -> &BodyStorage<RigidBody> {
        &self.bodies
    }

    /// Adds a joint; both of its bodies must already be in the world
    pub fn add_joint(&mut self, joint: Box<dyn Joint>) -> Result<JointHandle> {
        for &body in joint.get_bodies() {
            self.bodies.get_body(body)?;
        }
        Ok(self.joints.add(joint))
    }

    /// Removes a joint from the world
    pub fn remove_joint(&mut self, handle: JointHandle) -> Result<Box<dyn Joint>> {
        self.joints.remove(handle).ok_or_else(|| {
            PhysicsError::ResourceNotFound(format!("Joint with handle {:?} not found", handle))
        })
    }

    /// Gets a reference to a joint by its handle
    pub fn get_joint(&self, handle: JointHandle) -> Result<&dyn Joint> {
        self.joints.get_joint(handle).map(|joint| &**joint)
    }

    /// Gets a mutable reference to a joint by its handle
    pub fn get_joint_mut(&mut self, handle: JointHandle) -> Result<&mut Box<dyn Joint>> {
        self.joints.get_joint_mut(handle)
    }

    /// Iterates over the joints in insertion order
    pub fn joints(&self) -> impl Iterator<Item = (JointHandle, &dyn Joint)> {
        self.joints.iter().map(|(handle, joint)| (handle, &**joint))
    }

    /// Looks up the live arbiter for a body pair, in either order
    pub fn get_arbiter(&self, body_a: BodyHandle, body_b: BodyHandle) -> Option<&Arbiter> {
        self.arbiters.get(&ArbiterKey::new(body_a, body_b))
    }

    /// Iterates over the live arbiters in key order
    pub fn arbiters(&self) -> impl Iterator<Item = &Arbiter> {
        self.arbiters.values()
    }

    pub fn arbiter_count(&self) -> usize {
        self.arbiters.len()
    }

    /// Refreshes the arbiter set from the current body configuration.
    ///
    /// Pairs with contacts get a new arbiter or have their existing one updated
    /// (carrying impulses forward); every other arbiter is erased. Touch flags are
    /// rebuilt from scratch.
    pub fn broad_phase(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.flags_mut().remove(BodyFlags::IN_TOUCH | BodyFlags::GROUNDED);
        }

        let pairs = {
            let listed: Vec<(BodyHandle, &RigidBody)> = self.bodies.iter().collect();
            self.broad_phase.collect_pairs(&listed)
        };

        let gravity_dir = self.config.gravity.normalize();
        let has_gravity = !self.config.gravity.is_zero();
        let warm_starting = self.config.warm_starting;
        let mut previous = std::mem::take(&mut self.arbiters);

        for key in pairs {
            let (body_a, body_b) = match (self.bodies.get(key.body_a), self.bodies.get(key.body_b)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };

            // Two infinite masses would make the effective mass undefined
            if body_a.is_static() && body_b.is_static() {
                continue;
            }

            let contacts = validate_manifold(
                key,
                self.narrow_phase.collide(body_a, body_b),
                &mut self.contract_violation_reported,
            );
            if contacts.is_empty() {
                continue;
            }

            let arbiter = match previous.remove(&key) {
                Some(mut arbiter) => {
                    arbiter.update(&contacts, warm_starting);
                    self.events.add_collision_event(CollisionEvent {
                        event_type: CollisionEventType::Persist,
                        pair: key,
                        contact_count: arbiter.num_contacts(),
                    });
                    arbiter
                }
                None => {
                    debug!(body_a = key.body_a.0, body_b = key.body_b.0, contacts = contacts.len(), "arbiter created");
                    self.events.add_collision_event(CollisionEvent {
                        event_type: CollisionEventType::Begin,
                        pair: key,
                        contact_count: contacts.len(),
                    });
                    Arbiter::new(key, body_a, body_b, contacts)
                }
            };

            // The normal points from A to B, so A rests on B when it points along gravity
            let along_gravity = arbiter.average_normal().dot(&gravity_dir);
            let a_grounded = has_gravity && body_b.is_static() && along_gravity > GROUND_NORMAL_COS;
            let b_grounded = has_gravity && body_a.is_static() && along_gravity < -GROUND_NORMAL_COS;

            self.arbiters.insert(key, arbiter);

            if let Ok((body_a, body_b)) = self.bodies.get_pair_mut(key.body_a, key.body_b) {
                body_a.flags_mut().insert(BodyFlags::IN_TOUCH);
                body_b.flags_mut().insert(BodyFlags::IN_TOUCH);
                if a_grounded {
                    body_a.flags_mut().insert(BodyFlags::GROUNDED);
                }
                if b_grounded {
                    body_b.flags_mut().insert(BodyFlags::GROUNDED);
                }
            }
        }

        for key in previous.into_keys() {
            debug!(body_a = key.body_a.0, body_b = key.body_b.0, "arbiter erased");
            self.events.add_collision_event(CollisionEvent {
                event_type: CollisionEventType::End,
                pair: key,
                contact_count: 0,
            });
        }

        for (handle, body) in self.bodies.iter() {
            trace!(body = handle.0, in_touch = body.is_in_touch(), grounded = body.is_grounded(), "contact state");
        }
    }

    /// Advances the simulation by `dt`.
    ///
    /// Broad phase, force integration, pre-step of every arbiter then every joint,
    /// `iterations` passes of impulses over arbiters then joints, and finally position
    /// integration. Velocities are integrated before positions (semi-implicit Euler).
    /// A non-positive or NaN `dt` only refreshes the arbiters and clears the force
    /// accumulators.
    #[instrument(skip(self), level = "trace")]
    pub fn step(&mut self, dt: f32) {
        // Clear events from previous step
        self.events.clear();

        self.broad_phase();

        if !(dt > 0.0) {
            debug!(dt, "degenerate time step, skipping integration");
            for (_, body) in self.bodies.iter_mut() {
                body.clear_forces();
            }
            return;
        }

        let inv_dt = 1.0 / dt;
        let gravity = self.config.gravity;

        // Integrate forces
        for (_, body) in self.bodies.iter_mut() {
            body.integrate_forces(gravity, dt);
        }

        // Perform pre-steps
        for arbiter in self.arbiters.values_mut() {
            arbiter.pre_step(inv_dt, &mut self.bodies, &self.config);
        }
        for (_, joint) in self.joints.iter_mut() {
            joint.pre_step(inv_dt, &mut self.bodies, &self.config);
        }

        // Perform iterations
        for _ in 0..self.config.iterations {
            for arbiter in self.arbiters.values_mut() {
                arbiter.apply_impulse(&mut self.bodies, &self.config);
            }
            for (_, joint) in self.joints.iter_mut() {
                joint.apply_impulse(&mut self.bodies);
            }
        }

        // Integrate velocities
        for (_, body) in self.bodies.iter_mut() {
            body.integrate_velocity(dt);
            body.clear_forces();
        }

        self.time += dt;
    }

    /// Returns a reference to the event queue
    pub fn get_events(&self) -> &EventQueue {
        &self.events
    }

    /// Returns a mutable reference to the event queue
    pub fn get_events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Hands every body, joint and contact point to `renderer`
    pub fn draw(&self, renderer: &mut dyn DebugRenderer) {
        for (_, body) in self.bodies.iter() {
            body.draw(renderer);
        }
        for (_, joint) in self.joints.iter() {
            joint.draw(&self.bodies, renderer);
        }
        for arbiter in self.arbiters.values() {
            arbiter.draw(renderer);
        }
    }

    /// Clears the world of all bodies, joints and arbiters
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.joints.clear();
        self.arbiters.clear();
        self.events.clear();
        self.time = 0.0;
    }

    /// Returns the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Returns the number of joints in the world
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Enforces the narrow-phase contract of at most [`MAX_CONTACT_POINTS`] contacts.
/// The first violation is logged; surplus points are always dropped.
fn validate_manifold(key: ArbiterKey, mut contacts: Vec<Contact>, reported: &mut bool) -> Vec<Contact> {
    if contacts.len() > MAX_CONTACT_POINTS {
        if !*reported {
            let violation = PhysicsError::ContractViolation(format!(
                "narrow phase produced {} contacts for {:?}, at most {} are allowed",
                contacts.len(),
                key,
                MAX_CONTACT_POINTS
            ));
            error!(%violation, "truncating manifold");
            *reported = true;
        }
        contacts.truncate(MAX_CONTACT_POINTS);
    }
    contacts
}
