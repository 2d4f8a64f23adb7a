//! Boundary snapshots handed to detection and response.

use osteon_domain::{Domain, Geometry, Spacing};
use osteon_math::DVec3;

/// The free surface of one body at the current configuration.
///
/// Every per-point vector is indexed by slot, parallel to `indices`.
#[derive(Debug, Clone)]
pub struct ContactSurface {
    /// Point indices in the owning body.
    pub indices: Vec<usize>,
    pub positions: Vec<DVec3>,
    pub velocities: Vec<DVec3>,
    /// Outward unit normals.
    pub normals: Vec<DVec3>,
    /// Lumped masses; `f64::INFINITY` for rigid bodies.
    pub masses: Vec<f64>,
    /// Tributary contact area of one point.
    pub area: f64,
    pub spacing: Spacing,
}

impl ContactSurface {
    /// Snapshots the boundary points `indices` of `domain`.
    ///
    /// `current` and `velocities` are full per-point arrays of the body.
    /// `masses` is `None` for a rigid body.
    pub fn new(
        domain: &Domain,
        indices: Vec<usize>,
        current: &[DVec3],
        velocities: &[DVec3],
        masses: Option<&[f64]>,
    ) -> Self {
        let spacing = domain.spacing();
        let normals = domain.surface_normals(current, &indices);
        let area = match domain.geometry() {
            Geometry::Mesh(mesh) if !mesh.kind.is_solid() => spacing.mean,
            _ => spacing.mean * spacing.mean,
        };
        Self {
            positions: indices.iter().map(|&i| current[i]).collect(),
            velocities: indices.iter().map(|&i| velocities[i]).collect(),
            masses: match masses {
                Some(m) => indices.iter().map(|&i| m[i]).collect(),
                None => vec![f64::INFINITY; indices.len()],
            },
            normals,
            indices,
            area,
            spacing,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn is_rigid(&self) -> bool {
        self.masses.iter().all(|m| m.is_infinite())
    }
}

/// Reduced mass of a point pair. Infinite (rigid) sides drop out.
pub fn effective_mass(ma: f64, mb: f64) -> f64 {
    match (ma.is_finite(), mb.is_finite()) {
        (true, true) if ma + mb > 0.0 => ma * mb / (ma + mb),
        (true, false) => ma,
        (false, true) => mb,
        _ => 0.0,
    }
}
