//! Vector helpers shared by every joint angle computation.

use nalgebra::Vector3;

use crate::body::JointPoint;

pub type Vec3 = Vector3<f64>;

/// Magnitudes below this are left unnormalized
pub const NORMALIZE_EPSILON: f64 = 1e-8;

/// Vector from `p` to `q`.
pub fn vector(p: &JointPoint, q: &JointPoint) -> Vec3 {
    q.to_vector() - p.to_vector()
}

/// Unit vector, or `v` unchanged when its magnitude is below `NORMALIZE_EPSILON`.
pub fn normalize(v: Vec3) -> Vec3 {
    let norm = v.norm();
    if norm < NORMALIZE_EPSILON {
        v
    } else {
        v / norm
    }
}

/// Removes the component of `v` along `normal`. `normal` must be unit length.
pub fn project_onto_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(&normal)
}

/// Angle between two vectors in radians.
pub fn angle_between(v1: Vec3, v2: Vec3) -> f64 {
    let cos = normalize(v1).dot(&normalize(v2)).clamp(-1.0, 1.0);
    cos.acos()
}
