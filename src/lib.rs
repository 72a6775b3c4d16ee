pub mod math;
pub mod core;
pub mod bodies;
pub mod collision;
pub mod constraints;
pub mod render;

/// Re-export common types for easier usage
pub use crate::core::{PhysicsWorld, SimulationConfig, BodyHandle, JointHandle};
pub use crate::bodies::{RigidBody, Material, BodyFlags};
pub use crate::collision::{Arbiter, ArbiterKey, Contact};
pub use crate::constraints::{Joint, PinJoint, DistanceJoint};
pub use crate::math::Vector2;
pub use crate::render::DebugRenderer;

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),

        #[error("Collaborator contract violated: {0}")]
        ContractViolation(String),
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
