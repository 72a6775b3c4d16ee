mod rigid_body;
mod material;

pub use self::rigid_body::RigidBody;
pub use self::material::Material;
pub use self::body_flags::BodyFlags;

/// Flags describing per-step contact state of a body
pub mod body_flags {
    use bitflags::bitflags;

    bitflags! {
        /// Contact state flags, rebuilt by every broad phase
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
        pub struct BodyFlags: u32 {
            /// Body has at least one contact with another body this step
            const IN_TOUCH = 0x01;

            /// Body rests on a static body (contact normal opposes gravity)
            const GROUNDED = 0x02;
        }
    }
}
