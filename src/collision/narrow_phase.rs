use crate::bodies::RigidBody;
use crate::collision::contact_manifold::{Contact, Edge, FeaturePair};
use crate::math::{sign_nonzero, Matrix2, Vector2};

/// Exact contact generation between two bodies.
///
/// Implementations return at most two contacts with normals pointing from `body_a`
/// toward `body_b`. Contacts for the same geometric configuration must come back in
/// the same order with the same feature ids every frame, otherwise warm starting
/// silently degrades to starting every contact from zero.
pub trait NarrowPhase: Send + Sync {
    fn collide(&self, body_a: &RigidBody, body_b: &RigidBody) -> Vec<Contact>;
}

/// Oriented box versus oriented box, via separating axes and reference-face clipping
#[derive(Debug, Default, Clone, Copy)]
pub struct BoxNarrowPhase;

impl BoxNarrowPhase {
    /// Creates a new box-box narrow phase
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    FaceAX,
    FaceAY,
    FaceBX,
    FaceBY,
}

#[derive(Debug, Clone, Copy, Default)]
struct ClipVertex {
    v: Vector2,
    fp: FeaturePair,
}

// Prefer box A's faces and the x axis unless another axis is clearly better, so the
// chosen reference face doesn't flicker between frames.
const RELATIVE_TOL: f32 = 0.95;
const ABSOLUTE_TOL: f32 = 0.01;

/// Clips the segment `v_in` against the half-plane `normal . x <= offset`
fn clip_segment_to_line(v_in: &[ClipVertex; 2], normal: Vector2, offset: f32, clip_edge: Edge) -> Vec<ClipVertex> {
    let mut v_out = Vec::with_capacity(2);

    let distance0 = normal.dot(&v_in[0].v) - offset;
    let distance1 = normal.dot(&v_in[1].v) - offset;

    if distance0 <= 0.0 {
        v_out.push(v_in[0]);
    }
    if distance1 <= 0.0 {
        v_out.push(v_in[1]);
    }

    if distance0 * distance1 < 0.0 {
        let interp = distance0 / (distance0 - distance1);
        let v = v_in[0].v + interp * (v_in[1].v - v_in[0].v);
        let fp = if distance0 > 0.0 {
            let mut fp = v_in[0].fp;
            fp.in_edge1 = clip_edge;
            fp.in_edge2 = Edge::None;
            fp
        } else {
            let mut fp = v_in[1].fp;
            fp.out_edge1 = clip_edge;
            fp.out_edge2 = Edge::None;
            fp
        };
        v_out.push(ClipVertex { v, fp });
    }

    v_out
}

/// Finds the edge of the incident box most anti-parallel to the reference normal
fn compute_incident_edge(h: Vector2, pos: Vector2, rot: Matrix2, normal: Vector2) -> [ClipVertex; 2] {
    let mut c = [ClipVertex::default(); 2];

    // The normal is from the reference box. Convert it to the incident box's frame and flip sign.
    let n = -(rot.transpose() * normal);
    let n_abs = n.abs();

    if n_abs.x > n_abs.y {
        if sign_nonzero(n.x) > 0.0 {
            c[0].v = Vector2::new(h.x, -h.y);
            c[0].fp.in_edge2 = Edge::Edge3;
            c[0].fp.out_edge2 = Edge::Edge4;

            c[1].v = Vector2::new(h.x, h.y);
            c[1].fp.in_edge2 = Edge::Edge4;
            c[1].fp.out_edge2 = Edge::Edge1;
        } else {
            c[0].v = Vector2::new(-h.x, h.y);
            c[0].fp.in_edge2 = Edge::Edge1;
            c[0].fp.out_edge2 = Edge::Edge2;

            c[1].v = Vector2::new(-h.x, -h.y);
            c[1].fp.in_edge2 = Edge::Edge2;
            c[1].fp.out_edge2 = Edge::Edge3;
        }
    } else if sign_nonzero(n.y) > 0.0 {
        c[0].v = Vector2::new(h.x, h.y);
        c[0].fp.in_edge2 = Edge::Edge4;
        c[0].fp.out_edge2 = Edge::Edge1;

        c[1].v = Vector2::new(-h.x, h.y);
        c[1].fp.in_edge2 = Edge::Edge1;
        c[1].fp.out_edge2 = Edge::Edge2;
    } else {
        c[0].v = Vector2::new(-h.x, -h.y);
        c[0].fp.in_edge2 = Edge::Edge2;
        c[0].fp.out_edge2 = Edge::Edge3;

        c[1].v = Vector2::new(h.x, -h.y);
        c[1].fp.in_edge2 = Edge::Edge3;
        c[1].fp.out_edge2 = Edge::Edge4;
    }

    c[0].v = pos + rot * c[0].v;
    c[1].v = pos + rot * c[1].v;
    c
}

impl NarrowPhase for BoxNarrowPhase {
    fn collide(&self, body_a: &RigidBody, body_b: &RigidBody) -> Vec<Contact> {
        let h_a = body_a.get_half_extents();
        let h_b = body_b.get_half_extents();

        let pos_a = body_a.get_position();
        let pos_b = body_b.get_position();

        let rot_a = body_a.get_rotation_matrix();
        let rot_b = body_b.get_rotation_matrix();

        let rot_a_t = rot_a.transpose();
        let rot_b_t = rot_b.transpose();

        let dp = pos_b - pos_a;
        let d_a = rot_a_t * dp;
        let d_b = rot_b_t * dp;

        let c = rot_a_t * rot_b;
        let abs_c = c.abs();
        let abs_c_t = abs_c.transpose();

        // Box A faces
        let face_a = d_a.abs() - h_a - abs_c * h_b;
        if face_a.x > 0.0 || face_a.y > 0.0 {
            return Vec::new();
        }

        // Box B faces
        let face_b = d_b.abs() - abs_c_t * h_a - h_b;
        if face_b.x > 0.0 || face_b.y > 0.0 {
            return Vec::new();
        }

        // Find best axis
        let mut axis = Axis::FaceAX;
        let mut separation = face_a.x;
        let mut normal = if d_a.x > 0.0 { rot_a.col1 } else { -rot_a.col1 };

        if face_a.y > RELATIVE_TOL * separation + ABSOLUTE_TOL * h_a.y {
            axis = Axis::FaceAY;
            separation = face_a.y;
            normal = if d_a.y > 0.0 { rot_a.col2 } else { -rot_a.col2 };
        }

        if face_b.x > RELATIVE_TOL * separation + ABSOLUTE_TOL * h_b.x {
            axis = Axis::FaceBX;
            separation = face_b.x;
            normal = if d_b.x > 0.0 { rot_b.col1 } else { -rot_b.col1 };
        }

        if face_b.y > RELATIVE_TOL * separation + ABSOLUTE_TOL * h_b.y {
            axis = Axis::FaceBY;
            normal = if d_b.y > 0.0 { rot_b.col2 } else { -rot_b.col2 };
        }

        // Reference face planes and the incident segment to clip against them
        let (front_normal, front, side_normal, neg_side, pos_side, neg_edge, pos_edge, incident_edge) = match axis {
            Axis::FaceAX => {
                let front_normal = normal;
                let side_normal = rot_a.col2;
                let side = pos_a.dot(&side_normal);
                (
                    front_normal,
                    pos_a.dot(&front_normal) + h_a.x,
                    side_normal,
                    -side + h_a.y,
                    side + h_a.y,
                    Edge::Edge3,
                    Edge::Edge1,
                    compute_incident_edge(h_b, pos_b, rot_b, front_normal),
                )
            }
            Axis::FaceAY => {
                let front_normal = normal;
                let side_normal = rot_a.col1;
                let side = pos_a.dot(&side_normal);
                (
                    front_normal,
                    pos_a.dot(&front_normal) + h_a.y,
                    side_normal,
                    -side + h_a.x,
                    side + h_a.x,
                    Edge::Edge2,
                    Edge::Edge4,
                    compute_incident_edge(h_b, pos_b, rot_b, front_normal),
                )
            }
            Axis::FaceBX => {
                let front_normal = -normal;
                let side_normal = rot_b.col2;
                let side = pos_b.dot(&side_normal);
                (
                    front_normal,
                    pos_b.dot(&front_normal) + h_b.x,
                    side_normal,
                    -side + h_b.y,
                    side + h_b.y,
                    Edge::Edge3,
                    Edge::Edge1,
                    compute_incident_edge(h_a, pos_a, rot_a, front_normal),
                )
            }
            Axis::FaceBY => {
                let front_normal = -normal;
                let side_normal = rot_b.col1;
                let side = pos_b.dot(&side_normal);
                (
                    front_normal,
                    pos_b.dot(&front_normal) + h_b.y,
                    side_normal,
                    -side + h_b.x,
                    side + h_b.x,
                    Edge::Edge2,
                    Edge::Edge4,
                    compute_incident_edge(h_a, pos_a, rot_a, front_normal),
                )
            }
        };

        // Clip the incident edge to both side planes of the reference face
        let clip_points1 = clip_segment_to_line(&incident_edge, -side_normal, neg_side, neg_edge);
        if clip_points1.len() < 2 {
            return Vec::new();
        }

        let clip_points2 = clip_segment_to_line(&[clip_points1[0], clip_points1[1]], side_normal, pos_side, pos_edge);
        if clip_points2.len() < 2 {
            return Vec::new();
        }

        // Keep the points behind the reference face. Roundoff may remove both.
        clip_points2
            .iter()
            .take(2)
            .filter_map(|cv| {
                let separation = front_normal.dot(&cv.v) - front;
                if separation > 0.0 {
                    return None;
                }

                let mut feature = cv.fp;
                if matches!(axis, Axis::FaceBX | Axis::FaceBY) {
                    feature.flip();
                }

                // Slide the point onto the reference face
                let position = cv.v - separation * front_normal;
                Some(Contact::new(position, normal, separation, feature))
            })
            .collect()
    }
}
