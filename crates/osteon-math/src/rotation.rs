//! Rodrigues rotation for prescribed rigid-body motion.

use glam::DVec3;

/// Rotate `v` about the unit `axis` by `angle` radians (Rodrigues formula):
///
/// `v' = v cosθ + (k × v) sinθ + k (k·v)(1 − cosθ)`
///
/// A zero-length axis or zero angle returns `v` unchanged.
pub fn rodrigues(v: DVec3, axis: DVec3, angle: f64) -> DVec3 {
    let len = axis.length();
    if len < osteon_types::constants::EPSILON || angle == 0.0 {
        return v;
    }
    let k = axis / len;
    let (sin, cos) = angle.sin_cos();
    v * cos + k.cross(v) * sin + k * k.dot(v) * (1.0 - cos)
}

/// Rotate `point` about `pivot` (Rodrigues about an axis through the pivot).
pub fn rotate_about(point: DVec3, pivot: DVec3, axis: DVec3, angle: f64) -> DVec3 {
    pivot + rodrigues(point - pivot, axis, angle)
}
