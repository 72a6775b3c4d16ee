use crate::bodies::{Material, RigidBody};
use crate::collision::collision_pair::ArbiterKey;
use crate::collision::contact_manifold::Contact;
use crate::core::{BodyStorage, SimulationConfig};
use crate::math::{clamp, Vector2};
use crate::render::DebugRenderer;

/// The live contact constraint between one pair of bodies.
///
/// An arbiter owns the pair's contact manifold (at most two points) and the impulses
/// accumulated on it. It exists in the world only while the pair has contacts.
#[derive(Debug, Clone, PartialEq)]
pub struct Arbiter {
    key: ArbiterKey,

    /// Contacts in narrow-phase order
    contacts: Vec<Contact>,

    /// Combined friction coefficient of the two bodies
    friction: f32,

    /// Combined restitution coefficient of the two bodies
    restitution: f32,
}

impl Arbiter {
    /// Creates an arbiter for `key` from a fresh manifold.
    ///
    /// `body_a` and `body_b` must be the bodies of `key.body_a` and `key.body_b`
    /// respectively, and contact normals must point from A to B. Accumulated impulses
    /// on the incoming contacts are discarded.
    pub fn new(key: ArbiterKey, body_a: &RigidBody, body_b: &RigidBody, mut contacts: Vec<Contact>) -> Self {
        for contact in &mut contacts {
            contact.normal_impulse = 0.0;
            contact.tangent_impulse = 0.0;
        }

        Self {
            key,
            contacts,
            friction: Material::combine_friction(body_a.get_friction(), body_b.get_friction()),
            restitution: Material::combine_restitution(
                body_a.get_material().restitution,
                body_b.get_material().restitution,
            ),
        }
    }

    pub fn key(&self) -> ArbiterKey {
        self.key
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn num_contacts(&self) -> usize {
        self.contacts.len()
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Replaces the manifold with `new_contacts`.
    ///
    /// A new contact sharing a feature id with an old one inherits the old contact's
    /// accumulated impulses when `warm_starting` is on; every other contact starts from zero.
    pub fn update(&mut self, new_contacts: &[Contact], warm_starting: bool) {
        let merged = new_contacts
            .iter()
            .map(|new_contact| {
                let mut contact = *new_contact;
                let previous = self
                    .contacts
                    .iter()
                    .find(|old| old.feature.key() == new_contact.feature.key());

                match previous {
                    Some(old) if warm_starting => {
                        contact.normal_impulse = old.normal_impulse;
                        contact.tangent_impulse = old.tangent_impulse;
                    }
                    _ => {
                        contact.normal_impulse = 0.0;
                        contact.tangent_impulse = 0.0;
                    }
                }
                contact
            })
            .collect();

        self.contacts = merged;
    }

    /// Computes effective masses and bias velocities, then warm starts.
    ///
    /// A zero `inv_dt` disables position correction.
    pub fn pre_step(&mut self, inv_dt: f32, bodies: &mut BodyStorage<RigidBody>, config: &SimulationConfig) {
        let (body_a, body_b) = match bodies.get_pair_mut(self.key.body_a, self.key.body_b) {
            Ok(pair) => pair,
            Err(_) => return,
        };

        let bias_factor = if config.position_correction { config.bias_factor } else { 0.0 };
        let inv_mass_sum = body_a.get_inverse_mass() + body_b.get_inverse_mass();
        let inv_i_a = body_a.get_inverse_inertia();
        let inv_i_b = body_b.get_inverse_inertia();

        for c in &mut self.contacts {
            c.r1 = c.position - body_a.get_position();
            c.r2 = c.position - body_b.get_position();

            // Precompute normal mass, tangent mass, and bias.
            let rn1 = c.r1.dot(&c.normal);
            let rn2 = c.r2.dot(&c.normal);
            let k_normal = inv_mass_sum
                + inv_i_a * (c.r1.length_squared() - rn1 * rn1)
                + inv_i_b * (c.r2.length_squared() - rn2 * rn2);
            c.mass_normal = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

            let tangent = c.tangent();
            let rt1 = c.r1.dot(&tangent);
            let rt2 = c.r2.dot(&tangent);
            let k_tangent = inv_mass_sum
                + inv_i_a * (c.r1.length_squared() - rt1 * rt1)
                + inv_i_b * (c.r2.length_squared() - rt2 * rt2);
            c.mass_tangent = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

            let penetration = (c.separation + config.allowed_penetration).min(0.0);
            c.bias = (-bias_factor * inv_dt * penetration).min(config.max_bias_velocity);

            if self.restitution > 0.0 {
                let vn = (body_b.velocity_at(c.r2) - body_a.velocity_at(c.r1)).dot(&c.normal);
                if vn < -config.restitution_velocity_threshold {
                    c.bias = c.bias.max(-self.restitution * vn);
                }
            }

            if !config.accumulate_impulses {
                c.normal_impulse = 0.0;
                c.tangent_impulse = 0.0;
            } else if config.warm_starting {
                let p = c.normal_impulse * c.normal + c.tangent_impulse * tangent;
                body_a.apply_impulse(-p, c.r1);
                body_b.apply_impulse(p, c.r2);
            }
        }
    }

    /// Runs one sequential-impulse pass over the contacts, in stored order
    pub fn apply_impulse(&mut self, bodies: &mut BodyStorage<RigidBody>, config: &SimulationConfig) {
        let (body_a, body_b) = match bodies.get_pair_mut(self.key.body_a, self.key.body_b) {
            Ok(pair) => pair,
            Err(_) => return,
        };

        for c in &mut self.contacts {
            // Relative velocity at contact
            let dv = body_b.velocity_at(c.r2) - body_a.velocity_at(c.r1);

            // Compute normal impulse
            let vn = dv.dot(&c.normal);
            let mut d_pn = c.mass_normal * (-vn + c.bias);

            if config.accumulate_impulses {
                // Clamp the accumulated impulse
                let pn0 = c.normal_impulse;
                c.normal_impulse = (pn0 + d_pn).max(0.0);
                d_pn = c.normal_impulse - pn0;
            } else {
                d_pn = d_pn.max(0.0);
            }

            let pn = d_pn * c.normal;
            body_a.apply_impulse(-pn, c.r1);
            body_b.apply_impulse(pn, c.r2);

            // Relative velocity at contact, after the normal impulse
            let dv = body_b.velocity_at(c.r2) - body_a.velocity_at(c.r1);

            let tangent = c.tangent();
            let vt = dv.dot(&tangent);
            let mut d_pt = c.mass_tangent * (-vt);

            if config.accumulate_impulses {
                // Friction is bounded by the accumulated normal impulse
                let max_pt = self.friction * c.normal_impulse;
                let old_tangent_impulse = c.tangent_impulse;
                c.tangent_impulse = clamp(old_tangent_impulse + d_pt, -max_pt, max_pt);
                d_pt = c.tangent_impulse - old_tangent_impulse;
            } else {
                let max_pt = self.friction * d_pn;
                d_pt = clamp(d_pt, -max_pt, max_pt);
            }

            let pt = d_pt * tangent;
            body_a.apply_impulse(-pt, c.r1);
            body_b.apply_impulse(pt, c.r2);
        }
    }

    /// Total normal impulse currently held by the manifold
    pub fn total_normal_impulse(&self) -> f32 {
        self.contacts.iter().map(|c| c.normal_impulse).sum()
    }

    /// Draws each contact point
    pub fn draw(&self, renderer: &mut dyn DebugRenderer) {
        for contact in &self.contacts {
            renderer.draw_point(contact.position);
        }
    }

    /// Average contact normal, or zero for an empty manifold
    pub fn average_normal(&self) -> Vector2 {
        if self.contacts.is_empty() {
            return Vector2::zero();
        }
        let sum = self
            .contacts
            .iter()
            .fold(Vector2::zero(), |acc, c| acc + c.normal);
        sum / self.contacts.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::contact_manifold::{Edge, FeaturePair};
    use crate::core::BodyHandle;

    fn feature(edge: Edge) -> FeaturePair {
        FeaturePair { in_edge2: edge, ..FeaturePair::default() }
    }

    fn arbiter_with(contacts: Vec<Contact>) -> Arbiter {
        let body = RigidBody::new_box(Vector2::new(0.5, 0.5), 1.0).unwrap();
        Arbiter::new(ArbiterKey::new(BodyHandle(1), BodyHandle(2)), &body, &body, contacts)
    }

    #[test]
    fn update_carries_impulses_for_matching_features() {
        let old = Contact::new(Vector2::zero(), Vector2::unit_y(), -0.01, feature(Edge::Edge2));
        let mut arbiter = arbiter_with(vec![old]);
        arbiter.contacts[0].normal_impulse = 3.0;
        arbiter.contacts[0].tangent_impulse = -0.5;

        let matching = Contact::new(Vector2::new(0.1, 0.0), Vector2::unit_y(), -0.02, feature(Edge::Edge2));
        let fresh = Contact::new(Vector2::new(0.5, 0.0), Vector2::unit_y(), -0.02, feature(Edge::Edge3));
        arbiter.update(&[fresh, matching], true);

        assert_eq!(arbiter.num_contacts(), 2);
        assert_eq!(arbiter.contacts()[0].normal_impulse, 0.0);
        assert_eq!(arbiter.contacts()[1].normal_impulse, 3.0);
        assert_eq!(arbiter.contacts()[1].tangent_impulse, -0.5);
        assert_eq!(arbiter.contacts()[1].position, Vector2::new(0.1, 0.0));
    }

    #[test]
    fn update_without_warm_starting_zeroes_impulses() {
        let old = Contact::new(Vector2::zero(), Vector2::unit_y(), -0.01, feature(Edge::Edge2));
        let mut arbiter = arbiter_with(vec![old]);
        arbiter.contacts[0].normal_impulse = 3.0;

        arbiter.update(&[Contact::new(Vector2::zero(), Vector2::unit_y(), -0.01, feature(Edge::Edge2))], false);
        assert_eq!(arbiter.contacts()[0].normal_impulse, 0.0);
    }

    #[test]
    fn new_arbiter_starts_from_zero_impulse() {
        let mut dirty = Contact::new(Vector2::zero(), Vector2::unit_y(), -0.01, feature(Edge::Edge1));
        dirty.normal_impulse = 100.0;
        dirty.tangent_impulse = -4.0;

        let arbiter = arbiter_with(vec![dirty]);
        assert_eq!(arbiter.contacts()[0].normal_impulse, 0.0);
        assert_eq!(arbiter.contacts()[0].tangent_impulse, 0.0);
        assert_eq!(arbiter.contacts()[0].separation, -0.01);
    }

    #[test]
    fn friction_is_geometric_mean() {
        let mut a = RigidBody::new_box(Vector2::new(0.5, 0.5), 1.0).unwrap();
        let mut b = RigidBody::new_box(Vector2::new(0.5, 0.5), 1.0).unwrap();
        a.set_friction(0.4);
        b.set_friction(0.9);
        let arbiter = Arbiter::new(ArbiterKey::new(BodyHandle(1), BodyHandle(2)), &a, &b, Vec::new());
        assert!((arbiter.friction() - 0.6).abs() < 1e-6);
    }
}
