use crate::core::BodyHandle;

/// Identity of an arbiter: an unordered pair of bodies.
///
/// The lower handle is always stored first, so a key built from `(a, b)` equals the
/// key built from `(b, a)` and keys order by insertion order of the bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArbiterKey {
    /// The body inserted first
    pub body_a: BodyHandle,

    /// The body inserted last
    pub body_b: BodyHandle,
}

impl ArbiterKey {
    /// Creates a canonical key for the two bodies
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        if body_a <= body_b {
            Self { body_a, body_b }
        } else {
            Self { body_a: body_b, body_b: body_a }
        }
    }

    /// Checks if this pair contains the specified body
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// Returns the other body in the pair
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_order_independent() {
        let a = BodyHandle(3);
        let b = BodyHandle(7);
        assert_eq!(ArbiterKey::new(a, b), ArbiterKey::new(b, a));
        assert_eq!(ArbiterKey::new(b, a).body_a, a);
        assert_eq!(ArbiterKey::new(a, b).other(a), Some(b));
        assert_eq!(ArbiterKey::new(a, b).other(BodyHandle(1)), None);
    }
}
