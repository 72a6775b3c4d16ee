pub mod world;
pub mod config;
pub mod storage;
pub mod events;

pub use self::world::PhysicsWorld;
pub use self::config::SimulationConfig;
pub use self::storage::{BodyStorage, JointStorage, Storage};
pub use self::events::{EventQueue, CollisionEvent, CollisionEventType, BodyEvent, BodyEventType};

/// A unique identifier for a body in the physics world.
///
/// Handles are handed out in increasing order and never reused, so their
/// ordering is the bodies' insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u32);

/// A unique identifier for a joint in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointHandle(pub(crate) u32);

impl BodyHandle {
    /// Raw index of the handle, stable for the lifetime of the world
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl JointHandle {
    pub fn index(&self) -> u32 {
        self.0
    }
}
