//! Structured domain generators for tests, benchmarks, and requests that
//! describe simple primitives.
//!
//! All generators are deterministic. Node numbering is x-fastest, then y,
//! then z.

use osteon_math::DVec3;
use osteon_types::{OsteonError, OsteonResult};

use crate::domain::Domain;
use crate::element::ElementKind;

fn grid_nodes(nx: usize, ny: usize, nz: usize, origin: DVec3, size: DVec3) -> Vec<DVec3> {
    let step = DVec3::new(
        size.x / nx.max(1) as f64,
        size.y / ny.max(1) as f64,
        if nz == 0 { 0.0 } else { size.z / nz as f64 },
    );
    let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                nodes.push(origin + DVec3::new(i as f64, j as f64, k as f64) * step);
            }
        }
    }
    nodes
}

/// Global node indices of hex cell `(i, j, k)` in VTK order.
fn hex_cell(i: usize, j: usize, k: usize, nx: usize, ny: usize) -> [usize; 8] {
    let id = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);
    [
        id(i, j, k),
        id(i + 1, j, k),
        id(i + 1, j + 1, k),
        id(i, j + 1, k),
        id(i, j, k + 1),
        id(i + 1, j, k + 1),
        id(i + 1, j + 1, k + 1),
        id(i, j + 1, k + 1),
    ]
}

/// Box of `nx × ny × nz` hexahedra spanning `[origin, origin + size]`.
///
/// # Example
/// ```
/// use osteon_domain::generators::box_hex_mesh;
/// use osteon_math::DVec3;
/// let domain = box_hex_mesh(2, 2, 2, DVec3::ZERO, DVec3::ONE).unwrap();
/// assert_eq!(domain.point_count(), 27);
/// ```
pub fn box_hex_mesh(nx: usize, ny: usize, nz: usize, origin: DVec3, size: DVec3) -> OsteonResult<Domain> {
    let nodes = grid_nodes(nx, ny, nz, origin, size);
    let mut connectivity = Vec::with_capacity(nx * ny * nz * 8);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                connectivity.extend_from_slice(&hex_cell(i, j, k, nx, ny));
            }
        }
    }
    Domain::from_mesh(&nodes, ElementKind::Hex8, &connectivity)
}

/// Box of `nx × ny × nz` cells, each split into six tetrahedra around the
/// 0–6 diagonal. The split is conforming across neighboring cells.
pub fn box_tet_mesh(nx: usize, ny: usize, nz: usize, origin: DVec3, size: DVec3) -> OsteonResult<Domain> {
    const SPLIT: [[usize; 4]; 6] = [
        [0, 1, 2, 6],
        [0, 2, 3, 6],
        [0, 3, 7, 6],
        [0, 7, 4, 6],
        [0, 4, 5, 6],
        [0, 5, 1, 6],
    ];
    let nodes = grid_nodes(nx, ny, nz, origin, size);
    let mut connectivity = Vec::with_capacity(nx * ny * nz * 24);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let cell = hex_cell(i, j, k, nx, ny);
                for tet in SPLIT {
                    connectivity.extend(tet.iter().map(|&l| cell[l]));
                }
            }
        }
    }
    Domain::from_mesh(&nodes, ElementKind::Tet4, &connectivity)
}

fn rect_nodes(nx: usize, ny: usize, width: f64, height: f64) -> Vec<DVec3> {
    grid_nodes(nx, ny, 0, DVec3::ZERO, DVec3::new(width, height, 0.0))
}

/// Plane-strain rectangle `[0, width] × [0, height]` of quadrilaterals.
pub fn rect_quad_mesh(nx: usize, ny: usize, width: f64, height: f64) -> OsteonResult<Domain> {
    let nodes = rect_nodes(nx, ny, width, height);
    let id = |i: usize, j: usize| i + (nx + 1) * j;
    let mut connectivity = Vec::with_capacity(nx * ny * 4);
    for j in 0..ny {
        for i in 0..nx {
            connectivity.extend_from_slice(&[id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)]);
        }
    }
    Domain::from_mesh(&nodes, ElementKind::Quad4, &connectivity)
}

/// Plane-strain rectangle of triangles, two per grid cell.
pub fn rect_tri_mesh(nx: usize, ny: usize, width: f64, height: f64) -> OsteonResult<Domain> {
    let nodes = rect_nodes(nx, ny, width, height);
    let id = |i: usize, j: usize| i + (nx + 1) * j;
    let mut connectivity = Vec::with_capacity(nx * ny * 6);
    for j in 0..ny {
        for i in 0..nx {
            connectivity.extend_from_slice(&[id(i, j), id(i + 1, j), id(i + 1, j + 1)]);
            connectivity.extend_from_slice(&[id(i, j), id(i + 1, j + 1), id(i, j + 1)]);
        }
    }
    Domain::from_mesh(&nodes, ElementKind::Tri3, &connectivity)
}

/// Particles at the centers of an `nx × ny × nz` cell grid over
/// `[origin, origin + size]`, each carrying its cell volume.
pub fn particle_box(nx: usize, ny: usize, nz: usize, origin: DVec3, size: DVec3) -> OsteonResult<Domain> {
    let h = size / DVec3::new(nx.max(1) as f64, ny.max(1) as f64, nz.max(1) as f64);
    let volume = h.x * h.y * h.z;
    let mut positions = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                positions.push(origin + (DVec3::new(i as f64, j as f64, k as f64) + 0.5) * h);
            }
        }
    }
    let volumes = vec![volume; positions.len()];
    Domain::from_particles(&positions, &volumes)
}

/// Particles on a cubic lattice of pitch `spacing` clipped to a sphere.
pub fn particle_sphere(center: DVec3, radius: f64, spacing: f64) -> OsteonResult<Domain> {
    if !(spacing > 0.0 && radius >= 0.0 && radius.is_finite()) {
        return Err(OsteonError::InvalidDomain(format!(
            "sphere radius {radius} / spacing {spacing} out of range"
        )));
    }
    let n = (radius / spacing).floor() as i64;
    let volume = spacing.powi(3);
    let mut positions = Vec::new();
    for k in -n..=n {
        for j in -n..=n {
            for i in -n..=n {
                let offset = DVec3::new(i as f64, j as f64, k as f64) * spacing;
                if offset.length() <= radius + 1e-9 * spacing {
                    positions.push(center + offset);
                }
            }
        }
    }
    let volumes = vec![volume; positions.len()];
    Domain::from_particles(&positions, &volumes)
}
