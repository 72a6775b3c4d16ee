use bitflags::bitflags;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

bitflags! {
    /// A bit mask representing a collision group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    pub struct CollisionGroup: u32 {
        /// Default group (collides with everything)
        const DEFAULT    = 0x0000_0001;

        /// Static world geometry
        const STATIC     = 0x0000_0002;

        /// Player or NPC bodies
        const CHARACTER  = 0x0000_0004;

        /// Projectiles
        const PROJECTILE = 0x0000_0008;

        /// Debris that should not push characters around
        const DEBRIS     = 0x0000_0010;

        /// All groups
        const ALL        = 0xFFFF_FFFF;
    }
}

/// Type alias for a collision mask (what groups this object collides with)
pub type CollisionMask = CollisionGroup;

/// Group membership and mask of a single body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct CollisionFilter {
    /// Groups this body belongs to
    pub group: CollisionGroup,

    /// Groups this body collides with
    pub mask: CollisionMask,
}

impl CollisionFilter {
    pub fn new(group: CollisionGroup, mask: CollisionMask) -> Self {
        Self { group, mask }
    }

    /// A collides with B if A's mask includes B's group AND B's mask includes A's group
    #[inline]
    pub fn should_collide(&self, other: &CollisionFilter) -> bool {
        self.mask.intersects(other.group) && other.mask.intersects(self.group)
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            group: CollisionGroup::DEFAULT,
            mask: CollisionMask::ALL,
        }
    }
}
