mod collision_pair;
mod contact_manifold;
mod narrow_phase;
mod broad_phase;
mod arbiter;
mod collision_filter;

pub use self::collision_pair::ArbiterKey;
pub use self::contact_manifold::{Contact, Edge, FeaturePair, MAX_CONTACT_POINTS};
pub use self::narrow_phase::{NarrowPhase, BoxNarrowPhase};
pub use self::broad_phase::{BroadPhase, BruteForceBroadPhase};
pub use self::arbiter::Arbiter;
pub use self::collision_filter::{CollisionFilter, CollisionGroup, CollisionMask};
