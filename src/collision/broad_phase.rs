use crate::core::BodyHandle;
use crate::bodies::RigidBody;
use crate::math::Aabb2;
use crate::collision::collision_pair::ArbiterKey;

/// Trait for broad-phase pair discovery
pub trait BroadPhase: Send + Sync {
    /// Returns every pair that may be in contact, given bodies in insertion order.
    ///
    /// Pairs must come back in a reproducible order and must never contain two
    /// static bodies.
    fn collect_pairs(&mut self, bodies: &[(BodyHandle, &RigidBody)]) -> Vec<ArbiterKey>;
}

/// O(n^2) broad phase over every unordered pair of bodies
#[derive(Debug, Default)]
pub struct BruteForceBroadPhase {
    /// Bounds cached for the current pass
    bounds: Vec<Aabb2>,
}

impl BruteForceBroadPhase {
    /// Creates a new brute-force broad-phase
    pub fn new() -> Self {
        Self { bounds: Vec::new() }
    }
}

impl BroadPhase for BruteForceBroadPhase {
    fn collect_pairs(&mut self, bodies: &[(BodyHandle, &RigidBody)]) -> Vec<ArbiterKey> {
        self.bounds.clear();
        self.bounds.extend(bodies.iter().map(|(_, body)| body.get_world_bounds()));

        let mut pairs = Vec::new();

        for i in 0..bodies.len() {
            let (handle_a, body_a) = bodies[i];

            for j in (i + 1)..bodies.len() {
                let (handle_b, body_b) = bodies[j];

                if body_a.is_static() && body_b.is_static() {
                    continue;
                }

                if !body_a.get_collision_filter().should_collide(&body_b.get_collision_filter()) {
                    continue;
                }

                if self.bounds[i].intersects(&self.bounds[j]) {
                    pairs.push(ArbiterKey::new(handle_a, handle_b));
                }
            }
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector2;

    fn body_at(x: f32, mass: f32) -> RigidBody {
        let mut body = RigidBody::new_box(Vector2::new(0.5, 0.5), mass).unwrap();
        body.set_position(Vector2::new(x, 0.0));
        body
    }

    #[test]
    fn skips_static_pairs_and_far_bodies() {
        let ground_a = body_at(0.0, 0.0);
        let ground_b = body_at(0.5, 0.0);
        let dynamic = body_at(0.8, 1.0);
        let far = body_at(50.0, 1.0);

        let bodies = vec![
            (BodyHandle(1), &ground_a),
            (BodyHandle(2), &ground_b),
            (BodyHandle(3), &dynamic),
            (BodyHandle(4), &far),
        ];

        let pairs = BruteForceBroadPhase::new().collect_pairs(&bodies);
        assert_eq!(
            pairs,
            vec![
                ArbiterKey::new(BodyHandle(1), BodyHandle(3)),
                ArbiterKey::new(BodyHandle(2), BodyHandle(3)),
            ]
        );
    }
}
