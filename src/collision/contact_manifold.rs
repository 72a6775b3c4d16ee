use crate::math::Vector2;

/// Maximum number of contact points between one pair of boxes
pub const MAX_CONTACT_POINTS: usize = 2;

/// Box edge numbering used to identify contact features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Edge {
    #[default]
    None = 0,
    Edge1 = 1,
    Edge2 = 2,
    Edge3 = 3,
    Edge4 = 4,
}

/// The pair of edges on each box that clipped out a contact point.
///
/// Two contacts from consecutive frames with equal feature pairs are considered the
/// same physical contact, which is what lets accumulated impulses carry over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeaturePair {
    pub in_edge1: Edge,
    pub out_edge1: Edge,
    pub in_edge2: Edge,
    pub out_edge2: Edge,
}

impl FeaturePair {
    /// Packs the four edges into a single comparable id
    #[inline]
    pub fn key(&self) -> u32 {
        u32::from_le_bytes([
            self.in_edge1 as u8,
            self.out_edge1 as u8,
            self.in_edge2 as u8,
            self.out_edge2 as u8,
        ])
    }

    /// Swaps the roles of the two boxes
    #[inline]
    pub fn flip(&mut self) {
        std::mem::swap(&mut self.in_edge1, &mut self.in_edge2);
        std::mem::swap(&mut self.out_edge1, &mut self.out_edge2);
    }
}

/// One contact point of a manifold together with its solver state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Contact {
    /// Contact position in world space
    pub position: Vector2,

    /// Contact normal, pointing from body A toward body B
    pub normal: Vector2,

    /// Signed distance along the normal; negative means penetrating
    pub separation: f32,

    /// Lever arm from body A's center to the contact
    pub r1: Vector2,

    /// Lever arm from body B's center to the contact
    pub r2: Vector2,

    /// Accumulated normal impulse
    pub normal_impulse: f32,

    /// Accumulated tangent (friction) impulse
    pub tangent_impulse: f32,

    /// Effective mass along the normal
    pub mass_normal: f32,

    /// Effective mass along the tangent
    pub mass_tangent: f32,

    /// Target normal velocity for position correction and restitution
    pub bias: f32,

    /// Stable identity of the contact across frames
    pub feature: FeaturePair,
}

impl Contact {
    /// Creates a fresh contact with no accumulated impulse
    pub fn new(position: Vector2, normal: Vector2, separation: f32, feature: FeaturePair) -> Self {
        Self {
            position,
            normal,
            separation,
            feature,
            ..Self::default()
        }
    }

    /// Tangent direction used for friction (normal rotated clockwise)
    #[inline]
    pub fn tangent(&self) -> Vector2 {
        self.normal.cross_scalar(1.0)
    }
}
