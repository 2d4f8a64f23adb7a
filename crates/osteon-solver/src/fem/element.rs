//! Isoparametric element data for the mesh-based adapter.
//!
//! Precomputes, per element and quadrature point, the physical shape
//! function gradients `∇N_a = J⁻ᵀ ∂N_a/∂ξ`, the shape function values and
//! the integration weight `|det J| · w`. Plane elements (Tri3, Quad4) are
//! treated in plane strain with unit thickness: the Jacobian's third
//! column is `e_z` and the out-of-plane gradient vanishes.
//!
//! Supported rules:
//! - Tet4: 1 point at the centroid, weight 1/6
//! - Hex8: 2×2×2 Gauss
//! - Tri3: 1 point at the centroid, weight 1/2
//! - Quad4: 2×2 Gauss

use osteon_domain::{ElementKind, Mesh};
use osteon_math::{DMat3, DVec3};
use osteon_types::{OsteonError, OsteonResult};

/// Data at one quadrature point.
#[derive(Debug, Clone)]
pub struct QuadraturePoint {
    /// `|det J| · w`, the reference volume represented by the point.
    pub volume: f64,
    /// Shape function values, one per element node.
    pub shape: Vec<f64>,
    /// Physical gradients, one per element node.
    pub grads: Vec<DVec3>,
}

/// Rest-state data of one element.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub nodes: Vec<usize>,
    pub points: Vec<QuadraturePoint>,
    /// Shortest edge, for the explicit stability estimate.
    pub min_edge: f64,
}

impl ElementData {
    pub fn volume(&self) -> f64 {
        self.points.iter().map(|q| q.volume).sum()
    }

    /// Deformation gradient `F = I + Σ_a u_a ⊗ ∇N_a` at point `q`.
    pub fn deformation_gradient(&self, q: usize, disp: &[DVec3]) -> DMat3 {
        let point = &self.points[q];
        let mut h = DMat3::ZERO;
        for (a, &node) in self.nodes.iter().enumerate() {
            h += osteon_math::tensor::outer(disp[node], point.grads[a]);
        }
        DMat3::IDENTITY + h
    }
}

/// Natural coordinates, weights, shape values and natural derivatives of
/// the rule for `kind`.
struct Rule {
    weights: Vec<f64>,
    shape: Vec<Vec<f64>>,
    dshape: Vec<Vec<DVec3>>,
}

const HEX_CORNERS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

const QUAD_CORNERS: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

fn rule(kind: ElementKind) -> Rule {
    let g = 1.0 / 3.0_f64.sqrt();
    match kind {
        ElementKind::Tet4 => Rule {
            weights: vec![1.0 / 6.0],
            shape: vec![vec![0.25; 4]],
            dshape: vec![vec![
                DVec3::new(-1.0, -1.0, -1.0),
                DVec3::X,
                DVec3::Y,
                DVec3::Z,
            ]],
        },
        ElementKind::Tri3 => Rule {
            weights: vec![0.5],
            shape: vec![vec![1.0 / 3.0; 3]],
            dshape: vec![vec![DVec3::new(-1.0, -1.0, 0.0), DVec3::X, DVec3::Y]],
        },
        ElementKind::Hex8 => {
            let mut rule = Rule { weights: Vec::new(), shape: Vec::new(), dshape: Vec::new() };
            for &z in &[-g, g] {
                for &y in &[-g, g] {
                    for &x in &[-g, g] {
                        rule.weights.push(1.0);
                        rule.shape.push(
                            HEX_CORNERS
                                .iter()
                                .map(|c| 0.125 * (1.0 + x * c[0]) * (1.0 + y * c[1]) * (1.0 + z * c[2]))
                                .collect(),
                        );
                        rule.dshape.push(
                            HEX_CORNERS
                                .iter()
                                .map(|c| {
                                    DVec3::new(
                                        0.125 * c[0] * (1.0 + y * c[1]) * (1.0 + z * c[2]),
                                        0.125 * c[1] * (1.0 + x * c[0]) * (1.0 + z * c[2]),
                                        0.125 * c[2] * (1.0 + x * c[0]) * (1.0 + y * c[1]),
                                    )
                                })
                                .collect(),
                        );
                    }
                }
            }
            rule
        }
        ElementKind::Quad4 => {
            let mut rule = Rule { weights: Vec::new(), shape: Vec::new(), dshape: Vec::new() };
            for &y in &[-g, g] {
                for &x in &[-g, g] {
                    rule.weights.push(1.0);
                    rule.shape.push(
                        QUAD_CORNERS
                            .iter()
                            .map(|c| 0.25 * (1.0 + x * c[0]) * (1.0 + y * c[1]))
                            .collect(),
                    );
                    rule.dshape.push(
                        QUAD_CORNERS
                            .iter()
                            .map(|c| {
                                DVec3::new(0.25 * c[0] * (1.0 + y * c[1]), 0.25 * c[1] * (1.0 + x * c[0]), 0.0)
                            })
                            .collect(),
                    );
                }
            }
            rule
        }
    }
}

/// Precomputes rest-state data for every element of `mesh`.
///
/// Returns `InvalidDomain` for a degenerate element (`det J = 0`).
pub fn precompute(mesh: &Mesh) -> OsteonResult<Vec<ElementData>> {
    let rule = rule(mesh.kind);
    let solid = mesh.kind.is_solid();
    let mut elements = Vec::with_capacity(mesh.element_count());

    for e in 0..mesh.element_count() {
        let nodes = mesh.element(e).to_vec();
        let coords: Vec<DVec3> = nodes.iter().map(|&n| mesh.position(n)).collect();
        let mut points = Vec::with_capacity(rule.weights.len());

        for (q, &w) in rule.weights.iter().enumerate() {
            let mut cols = [DVec3::ZERO; 3];
            for (a, x) in coords.iter().enumerate() {
                let d = rule.dshape[q][a];
                cols[0] += *x * d.x;
                cols[1] += *x * d.y;
                cols[2] += *x * d.z;
            }
            if !solid {
                cols[2] = DVec3::Z;
            }
            let jac = DMat3::from_cols(cols[0], cols[1], cols[2]);
            let det = jac.determinant();
            let scale = cols[0].length() * cols[1].length() * cols[2].length();
            if !det.is_finite() || det.abs() <= 1e-10 * scale {
                return Err(OsteonError::InvalidDomain(format!("element {e} is degenerate")));
            }
            let inv_t = jac.inverse().transpose();
            points.push(QuadraturePoint {
                volume: det.abs() * w,
                shape: rule.shape[q].clone(),
                grads: rule.dshape[q].iter().map(|d| inv_t * *d).collect(),
            });
        }

        let min_edge = mesh
            .kind
            .edges()
            .iter()
            .map(|[a, b]| (coords[*a] - coords[*b]).length())
            .fold(f64::INFINITY, f64::min);

        elements.push(ElementData { nodes, points, min_edge });
    }
    Ok(elements)
}

/// Lumped nodal volumes `Σ_e Σ_q N_a · vol_q`.
pub fn lumped_volumes(node_count: usize, elements: &[ElementData]) -> Vec<f64> {
    let mut volumes = vec![0.0; node_count];
    for elem in elements {
        for q in &elem.points {
            for (a, &node) in elem.nodes.iter().enumerate() {
                volumes[node] += q.shape[a] * q.volume;
            }
        }
    }
    volumes
}
