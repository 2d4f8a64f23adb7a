//! The [`Domain`] type: geometry plus boundary conditions.

use std::collections::HashMap;

use osteon_math::DVec3;
use osteon_types::{Axis, OsteonError, OsteonResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::boundary::{BoundaryCondition, BoundaryKind};
use crate::element::ElementKind;
use crate::spatial_hash::SpatialHash;

/// Node/element mesh stored in SoA layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub pos_x: Vec<f64>,
    pub pos_y: Vec<f64>,
    pub pos_z: Vec<f64>,
    /// Single element family for the whole mesh.
    pub kind: ElementKind,
    /// Flat connectivity, `kind.nodes_per_element()` entries per element.
    pub connectivity: Vec<usize>,
}

impl Mesh {
    #[inline]
    pub fn node_count(&self) -> usize {
        self.pos_x.len()
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.connectivity.len() / self.kind.nodes_per_element()
    }

    /// Global node indices of element `e`.
    #[inline]
    pub fn element(&self, e: usize) -> &[usize] {
        let npe = self.kind.nodes_per_element();
        &self.connectivity[e * npe..(e + 1) * npe]
    }

    #[inline]
    pub fn position(&self, i: usize) -> DVec3 {
        DVec3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i])
    }
}

/// Particle cloud with per-particle volumes, SoA layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleCloud {
    pub pos_x: Vec<f64>,
    pub pos_y: Vec<f64>,
    pub pos_z: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl ParticleCloud {
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.pos_x.len()
    }

    #[inline]
    pub fn position(&self, i: usize) -> DVec3 {
        DVec3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i])
    }
}

/// The two geometry representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Mesh(Mesh),
    Particles(ParticleCloud),
}

/// A mesh facet referenced by exactly one element.
///
/// For solid elements this is a face, for plane elements an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryFace {
    /// Global node indices in the owning element's local order.
    pub nodes: Vec<usize>,
    /// Owning element.
    pub element: usize,
}

/// Point spacing statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Discretized geometry plus the boundary conditions applied to it.
///
/// Topology never changes after construction. Derived topology (boundary
/// facets, spacing) is computed once in the constructor.
#[derive(Debug, Clone)]
pub struct Domain {
    geometry: Geometry,
    boundary_conditions: Vec<BoundaryCondition>,
    boundary_faces: Vec<BoundaryFace>,
    spacing: Spacing,
}

impl Domain {
    /// Builds a mesh domain after validating indices and coordinates.
    pub fn from_mesh(nodes: &[DVec3], kind: ElementKind, connectivity: &[usize]) -> OsteonResult<Self> {
        if nodes.is_empty() {
            return Err(OsteonError::EmptyDomain("mesh has no nodes".into()));
        }
        if connectivity.is_empty() {
            return Err(OsteonError::EmptyDomain("mesh has no elements".into()));
        }
        let npe = kind.nodes_per_element();
        if connectivity.len() % npe != 0 {
            return Err(OsteonError::InvalidDomain(format!(
                "connectivity length {} is not a multiple of {} ({})",
                connectivity.len(),
                npe,
                kind.name()
            )));
        }
        check_finite(nodes)?;
        let n = nodes.len();
        for (e, element) in connectivity.chunks(npe).enumerate() {
            for (k, &node) in element.iter().enumerate() {
                if node >= n {
                    return Err(OsteonError::InvalidDomain(format!(
                        "element {e} references node {node} but the mesh has {n} nodes"
                    )));
                }
                if element[..k].contains(&node) {
                    return Err(OsteonError::InvalidDomain(format!(
                        "element {e} repeats node {node}"
                    )));
                }
            }
        }

        let mesh = Mesh {
            pos_x: nodes.iter().map(|p| p.x).collect(),
            pos_y: nodes.iter().map(|p| p.y).collect(),
            pos_z: nodes.iter().map(|p| p.z).collect(),
            kind,
            connectivity: connectivity.to_vec(),
        };
        let boundary_faces = extract_boundary_faces(&mesh);
        let spacing = mesh_spacing(&mesh);
        debug!(
            nodes = n,
            elements = mesh.element_count(),
            kind = kind.name(),
            boundary_faces = boundary_faces.len(),
            "mesh domain built"
        );
        Ok(Self {
            geometry: Geometry::Mesh(mesh),
            boundary_conditions: Vec::new(),
            boundary_faces,
            spacing,
        })
    }

    /// Builds a particle domain after validating positions and volumes.
    pub fn from_particles(positions: &[DVec3], volumes: &[f64]) -> OsteonResult<Self> {
        if positions.is_empty() {
            return Err(OsteonError::EmptyDomain("particle cloud is empty".into()));
        }
        if positions.len() != volumes.len() {
            return Err(OsteonError::InvalidDomain(format!(
                "{} particle positions but {} volumes",
                positions.len(),
                volumes.len()
            )));
        }
        check_finite(positions)?;
        if let Some(i) = volumes.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(OsteonError::InvalidDomain(format!(
                "particle {i} has non-positive volume {}",
                volumes[i]
            )));
        }
        let spacing = particle_spacing(positions, volumes);
        let cloud = ParticleCloud {
            pos_x: positions.iter().map(|p| p.x).collect(),
            pos_y: positions.iter().map(|p| p.y).collect(),
            pos_z: positions.iter().map(|p| p.z).collect(),
            volumes: volumes.to_vec(),
        };
        debug!(particles = positions.len(), spacing = spacing.mean, "particle domain built");
        Ok(Self {
            geometry: Geometry::Particles(cloud),
            boundary_conditions: Vec::new(),
            boundary_faces: Vec::new(),
            spacing,
        })
    }

    // ─── Accessors ────────────────────────────────────────────

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.geometry {
            Geometry::Mesh(m) => Some(m),
            Geometry::Particles(_) => None,
        }
    }

    pub fn particles(&self) -> Option<&ParticleCloud> {
        match &self.geometry {
            Geometry::Particles(p) => Some(p),
            Geometry::Mesh(_) => None,
        }
    }

    #[inline]
    pub fn is_mesh(&self) -> bool {
        matches!(self.geometry, Geometry::Mesh(_))
    }

    /// Number of nodes or particles.
    pub fn point_count(&self) -> usize {
        match &self.geometry {
            Geometry::Mesh(m) => m.node_count(),
            Geometry::Particles(p) => p.particle_count(),
        }
    }

    /// Reference position of point `i`.
    pub fn position(&self, i: usize) -> DVec3 {
        match &self.geometry {
            Geometry::Mesh(m) => m.position(i),
            Geometry::Particles(p) => p.position(i),
        }
    }

    /// All reference positions.
    pub fn positions(&self) -> Vec<DVec3> {
        (0..self.point_count()).map(|i| self.position(i)).collect()
    }

    /// Axis-aligned bounding box `(min, max)` of the reference positions.
    pub fn bounds(&self) -> (DVec3, DVec3) {
        let mut lo = DVec3::splat(f64::INFINITY);
        let mut hi = DVec3::splat(f64::NEG_INFINITY);
        for i in 0..self.point_count() {
            let p = self.position(i);
            lo = lo.min(p);
            hi = hi.max(p);
        }
        (lo, hi)
    }

    pub fn boundary_conditions(&self) -> &[BoundaryCondition] {
        &self.boundary_conditions
    }

    /// Facets referenced by exactly one element. Empty for particle domains.
    pub fn boundary_faces(&self) -> &[BoundaryFace] {
        &self.boundary_faces
    }

    /// Point spacing: element edge lengths for meshes, nearest-neighbor
    /// distances for particle clouds.
    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    // ─── Selection ────────────────────────────────────────────

    /// Points whose `axis` coordinate lies within `tolerance` of `value`.
    ///
    /// A negative or non-finite tolerance is an empty window and selects nothing.
    pub fn select(&self, axis: Axis, value: f64, tolerance: f64) -> Vec<usize> {
        if !(tolerance >= 0.0) || !value.is_finite() {
            return Vec::new();
        }
        let a = axis.index();
        (0..self.point_count())
            .filter(|&i| (self.position(i)[a] - value).abs() <= tolerance)
            .collect()
    }

    /// Points inside the closed box `[min, max]`.
    pub fn select_box(&self, min: DVec3, max: DVec3) -> Vec<usize> {
        (0..self.point_count())
            .filter(|&i| {
                let p = self.position(i);
                p.cmpge(min).all() && p.cmple(max).all()
            })
            .collect()
    }

    /// Points on the free surface, ascending.
    ///
    /// Meshes use the nodes of facets referenced by exactly one element.
    /// Particle clouds use points with fewer neighbors than the interior
    /// count (the maximum neighbor count within 1.5 × mean spacing).
    pub fn select_boundary(&self) -> Vec<usize> {
        match &self.geometry {
            Geometry::Mesh(m) => {
                let mut on_surface = vec![false; m.node_count()];
                for face in &self.boundary_faces {
                    for &n in &face.nodes {
                        on_surface[n] = true;
                    }
                }
                on_surface
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &b)| b.then_some(i))
                    .collect()
            }
            Geometry::Particles(_) => {
                let positions = self.positions();
                let radius = 1.5 * self.spacing.mean;
                let hash = SpatialHash::build(&positions, radius);
                let counts: Vec<usize> = hash.neighbor_lists(radius).iter().map(Vec::len).collect();
                let interior = counts.iter().copied().max().unwrap_or(0);
                if interior == 0 {
                    return (0..counts.len()).collect();
                }
                counts
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &c)| (c < interior).then_some(i))
                    .collect()
            }
        }
    }

    // ─── Boundary conditions ──────────────────────────────────

    /// Appends a condition after checking its indices.
    pub fn add_boundary_condition(&mut self, bc: BoundaryCondition) -> OsteonResult<()> {
        let n = self.point_count();
        if let Some(&bad) = bc.indices.iter().find(|&&i| i >= n) {
            return Err(OsteonError::InvalidDomain(format!(
                "boundary condition references point {bad} but the domain has {n} points"
            )));
        }
        if !bc.value.is_finite() {
            return Err(OsteonError::InvalidDomain("boundary condition value is not finite".into()));
        }
        if bc.indices.is_empty() {
            debug!(kind = ?bc.kind, "boundary condition with empty index set");
        }
        self.boundary_conditions.push(bc);
        Ok(())
    }

    /// Clamps every axis of `indices`.
    pub fn set_fixed(&mut self, indices: &[usize]) -> OsteonResult<()> {
        self.add_boundary_condition(BoundaryCondition::new(BoundaryKind::Fixed, indices, DVec3::ZERO))
    }

    /// Clamps only the flagged axes of `indices`.
    pub fn set_fixed_axes(&mut self, indices: &[usize], axes: [bool; 3]) -> OsteonResult<()> {
        self.add_boundary_condition(BoundaryCondition::new(BoundaryKind::FixedAxes(axes), indices, DVec3::ZERO))
    }

    /// Applies a total force `force` distributed over `indices`.
    pub fn set_force(&mut self, indices: &[usize], force: DVec3) -> OsteonResult<()> {
        self.add_boundary_condition(BoundaryCondition::new(BoundaryKind::Force, indices, force))
    }

    pub fn clear_boundary_conditions(&mut self) {
        self.boundary_conditions.clear();
    }

    /// Per-point, per-axis constraint mask.
    pub fn fixed_mask(&self) -> Vec<[bool; 3]> {
        let mut mask = vec![[false; 3]; self.point_count()];
        for bc in &self.boundary_conditions {
            let axes = bc.constrained_axes();
            for &i in &bc.indices {
                for a in 0..3 {
                    mask[i][a] |= axes[a];
                }
            }
        }
        mask
    }

    /// True when at least one condition constrains at least one point.
    pub fn has_constraint(&self) -> bool {
        self.boundary_conditions
            .iter()
            .any(|bc| bc.is_constraint() && !bc.indices.is_empty())
    }

    /// Sum of every `Force` condition, distributed to points.
    ///
    /// On meshes a condition whose points cover whole boundary facets is
    /// distributed by lumped facet area, which is the consistent nodal load
    /// of a uniform traction on linear facets. Otherwise the total is split
    /// equally.
    pub fn nodal_forces(&self) -> Vec<DVec3> {
        let mut forces = vec![DVec3::ZERO; self.point_count()];
        for bc in &self.boundary_conditions {
            if bc.kind != BoundaryKind::Force || bc.indices.is_empty() {
                continue;
            }
            let weights = self.load_weights(&bc.indices);
            for (&i, w) in bc.indices.iter().zip(weights) {
                forces[i] += bc.value * w;
            }
        }
        forces
    }

    fn load_weights(&self, indices: &[usize]) -> Vec<f64> {
        let equal = vec![1.0 / indices.len() as f64; indices.len()];
        let Geometry::Mesh(mesh) = &self.geometry else {
            return equal;
        };

        let mut member = vec![false; mesh.node_count()];
        for &i in indices {
            member[i] = true;
        }
        let mut lumped: HashMap<usize, f64> = HashMap::new();
        for face in &self.boundary_faces {
            if !face.nodes.iter().all(|&n| member[n]) {
                continue;
            }
            let pts: Vec<DVec3> = face.nodes.iter().map(|&n| mesh.position(n)).collect();
            let share = facet_measure(&pts) / pts.len() as f64;
            for &n in &face.nodes {
                *lumped.entry(n).or_insert(0.0) += share;
            }
        }

        let weights: Vec<f64> = indices
            .iter()
            .map(|i| lumped.get(i).copied().unwrap_or(0.0))
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || weights.iter().any(|&w| w <= 0.0) {
            return equal;
        }
        weights.into_iter().map(|w| w / total).collect()
    }

    // ─── Surface geometry ─────────────────────────────────────

    /// Outward unit normals at `indices`, evaluated on `current` positions.
    ///
    /// Meshes accumulate area-weighted facet normals, oriented away from the
    /// owning element. Particle clouds use the direction away from the local
    /// neighbor centroid. Points without a usable normal fall back to the
    /// direction away from the body centroid.
    pub fn surface_normals(&self, current: &[DVec3], indices: &[usize]) -> Vec<DVec3> {
        let centroid = current.iter().copied().sum::<DVec3>() / current.len().max(1) as f64;
        let fallback = |i: usize| (current[i] - centroid).normalize_or_zero();

        match &self.geometry {
            Geometry::Mesh(mesh) => {
                let mut accum: HashMap<usize, DVec3> = HashMap::new();
                for face in &self.boundary_faces {
                    let pts: Vec<DVec3> = face.nodes.iter().map(|&n| current[n]).collect();
                    let mut normal = facet_normal(&pts);
                    let face_center = pts.iter().copied().sum::<DVec3>() / pts.len() as f64;
                    let element = mesh.element(face.element);
                    let elem_center =
                        element.iter().map(|&n| current[n]).sum::<DVec3>() / element.len() as f64;
                    if normal.dot(face_center - elem_center) < 0.0 {
                        normal = -normal;
                    }
                    for &n in &face.nodes {
                        *accum.entry(n).or_insert(DVec3::ZERO) += normal;
                    }
                }
                indices
                    .iter()
                    .map(|&i| {
                        let n = accum.get(&i).copied().unwrap_or(DVec3::ZERO).normalize_or_zero();
                        if n == DVec3::ZERO { fallback(i) } else { n }
                    })
                    .collect()
            }
            Geometry::Particles(_) => {
                let radius = 1.5 * self.spacing.mean;
                let hash = SpatialHash::build(current, radius);
                let mut scratch = Vec::new();
                indices
                    .iter()
                    .map(|&i| {
                        scratch.clear();
                        hash.query_radius(current[i], radius, &mut scratch);
                        let others: Vec<DVec3> =
                            scratch.iter().filter(|&&j| j != i).map(|&j| current[j]).collect();
                        if others.is_empty() {
                            return fallback(i);
                        }
                        let local = others.iter().copied().sum::<DVec3>() / others.len() as f64;
                        let n = (current[i] - local).normalize_or_zero();
                        if n.length_squared() < 0.5 { fallback(i) } else { n }
                    })
                    .collect()
            }
        }
    }
}

fn check_finite(points: &[DVec3]) -> OsteonResult<()> {
    match points.iter().position(|p| !p.is_finite()) {
        Some(i) => Err(OsteonError::InvalidDomain(format!("point {i} has a non-finite coordinate"))),
        None => Ok(()),
    }
}

/// Area of a face (3 or 4 points) or length of an edge (2 points, unit thickness).
pub fn facet_measure(pts: &[DVec3]) -> f64 {
    facet_normal(pts).length()
}

/// Area-weighted facet normal. Edges get the in-plane normal `(dy, -dx, 0)`.
pub fn facet_normal(pts: &[DVec3]) -> DVec3 {
    match pts.len() {
        2 => {
            let e = pts[1] - pts[0];
            DVec3::new(e.y, -e.x, 0.0)
        }
        3 => 0.5 * (pts[1] - pts[0]).cross(pts[2] - pts[0]),
        4 => 0.5 * (pts[2] - pts[0]).cross(pts[3] - pts[1]),
        _ => DVec3::ZERO,
    }
}

fn extract_boundary_faces(mesh: &Mesh) -> Vec<BoundaryFace> {
    let mut seen: HashMap<Vec<usize>, (usize, Vec<usize>, usize)> = HashMap::new();
    let mut order = Vec::new();
    for e in 0..mesh.element_count() {
        let element = mesh.element(e);
        for local in mesh.kind.facets() {
            let nodes: Vec<usize> = local.iter().map(|&k| element[k]).collect();
            let mut key = nodes.clone();
            key.sort_unstable();
            let entry = seen.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                (0, nodes, e)
            });
            entry.0 += 1;
        }
    }
    order
        .into_iter()
        .filter_map(|key| {
            let (count, nodes, element) = seen.remove(&key)?;
            (count == 1).then_some(BoundaryFace { nodes, element })
        })
        .collect()
}

fn mesh_spacing(mesh: &Mesh) -> Spacing {
    let mut stats = Stats::default();
    for e in 0..mesh.element_count() {
        let element = mesh.element(e);
        for [a, b] in mesh.kind.edges() {
            stats.push((mesh.position(element[*a]) - mesh.position(element[*b])).length());
        }
    }
    stats.finish()
}

fn particle_spacing(positions: &[DVec3], volumes: &[f64]) -> Spacing {
    if positions.len() < 2 {
        let h = volumes.first().map(|v| v.cbrt()).unwrap_or(1.0);
        return Spacing { mean: h, min: h, max: h };
    }
    let mean_volume = volumes.iter().sum::<f64>() / volumes.len() as f64;
    let guess = mean_volume.cbrt();
    let hash = SpatialHash::build(positions, guess);
    let mut stats = Stats::default();
    let mut scratch = Vec::new();
    for (i, p) in positions.iter().enumerate() {
        let mut radius = 1.5 * guess;
        let nearest = loop {
            scratch.clear();
            hash.query_radius(*p, radius, &mut scratch);
            let best = scratch
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (positions[j] - *p).length())
                .fold(f64::INFINITY, f64::min);
            if best.is_finite() || radius > 64.0 * guess {
                break best;
            }
            radius *= 2.0;
        };
        if nearest.is_finite() {
            stats.push(nearest);
        }
    }
    if stats.count == 0 {
        return Spacing { mean: guess, min: guess, max: guess };
    }
    stats.finish()
}

#[derive(Default)]
struct Stats {
    sum: f64,
    min: f64,
    max: f64,
    count: usize,
}

impl Stats {
    fn push(&mut self, v: f64) {
        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.sum += v;
        self.count += 1;
    }

    fn finish(self) -> Spacing {
        let mean = if self.count == 0 { 0.0 } else { self.sum / self.count as f64 };
        Spacing { mean, min: self.min, max: self.max }
    }
}
