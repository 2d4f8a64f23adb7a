//! Global assembly for the mesh-based adapter.
//!
//! Element kernels run through [`RuntimeContext::map_points`] and return
//! local contributions; the scatter into global arrays is serial and in
//! element order, so results do not depend on thread count.
//!
//! DOF numbering is `3 · node + axis`.

use osteon_material::{ConstitutiveLaw, InternalMaterial};
use osteon_math::sparse::CsrMatrix;
use osteon_math::tensor::entry;
use osteon_math::{DMat3, DVec3, StressTensor};
use osteon_runtime::RuntimeContext;

use super::element::ElementData;

/// Step of the central-difference material tangent.
const TANGENT_STEP: f64 = 1e-6;

/// Resisting nodal forces `r_a = Σ_q vol_q · P(F_q) · ∇N_a`.
pub fn internal_forces(
    ctx: &RuntimeContext,
    elements: &[ElementData],
    law: &InternalMaterial,
    disp: &[DVec3],
) -> Vec<DVec3> {
    let local = ctx.map_points(elements.len(), |e| {
        let elem = &elements[e];
        let mut f = vec![DVec3::ZERO; elem.nodes.len()];
        for (q, point) in elem.points.iter().enumerate() {
            let p = law.first_piola(&elem.deformation_gradient(q, disp));
            for (a, grad) in point.grads.iter().enumerate() {
                f[a] += (p * *grad) * point.volume;
            }
        }
        f
    });

    let mut forces = vec![DVec3::ZERO; disp.len()];
    for (elem, f) in elements.iter().zip(local) {
        for (a, &node) in elem.nodes.iter().enumerate() {
            forces[node] += f[a];
        }
    }
    forces
}

/// Total strain energy `Σ_e Σ_q vol_q · W(F_q)`.
pub fn strain_energy(
    ctx: &RuntimeContext,
    elements: &[ElementData],
    law: &InternalMaterial,
    disp: &[DVec3],
) -> f64 {
    ctx.map_points(elements.len(), |e| {
        let elem = &elements[e];
        elem.points
            .iter()
            .enumerate()
            .map(|(q, point)| point.volume * law.strain_energy_density(&elem.deformation_gradient(q, disp)))
            .sum::<f64>()
    })
    .into_iter()
    .sum()
}

/// Volume-averaged nodal Cauchy stress.
pub fn nodal_stress(
    ctx: &RuntimeContext,
    elements: &[ElementData],
    law: &InternalMaterial,
    disp: &[DVec3],
) -> Vec<StressTensor> {
    let local = ctx.map_points(elements.len(), |e| {
        let elem = &elements[e];
        let mut sigma = StressTensor::ZERO;
        for (q, point) in elem.points.iter().enumerate() {
            let s = StressTensor::from_mat(&law.cauchy(&elem.deformation_gradient(q, disp)));
            sigma.add_scaled(&s, point.volume);
        }
        sigma
    });

    let mut stress = vec![StressTensor::ZERO; disp.len()];
    let mut weight = vec![0.0; disp.len()];
    for (elem, sigma) in elements.iter().zip(local) {
        let vol = elem.volume();
        for &node in &elem.nodes {
            stress[node].add_scaled(&sigma, 1.0);
            weight[node] += vol;
        }
    }
    for (s, w) in stress.iter_mut().zip(weight) {
        s.normalize(w);
    }
    stress
}

/// `∂P_iJ/∂F_kL` by central differences, indexed `[(3i + J) * 9 + 3k + L]`.
fn numeric_tangent(law: &InternalMaterial, f: &DMat3) -> [f64; 81] {
    let mut a = [0.0; 81];
    for k in 0..3 {
        for l in 0..3 {
            let mut bump = DMat3::ZERO;
            bump.col_mut(l)[k] = TANGENT_STEP;
            let plus = law.first_piola(&(*f + bump));
            let minus = law.first_piola(&(*f - bump));
            for i in 0..3 {
                for j in 0..3 {
                    a[(3 * i + j) * 9 + 3 * k + l] =
                        (entry(&plus, i, j) - entry(&minus, i, j)) / (2.0 * TANGENT_STEP);
                }
            }
        }
    }
    a
}

/// Dense element tangent, row-major `(3·npe)²`.
fn element_tangent(elem: &ElementData, law: &InternalMaterial, disp: &[DVec3]) -> Vec<f64> {
    let npe = elem.nodes.len();
    let dim = 3 * npe;
    let mut k = vec![0.0; dim * dim];

    for (q, point) in elem.points.iter().enumerate() {
        let vol = point.volume;
        let g = &point.grads;
        match law.linear() {
            Some(lin) => {
                let (lambda, mu) = (lin.lambda, lin.mu);
                for a in 0..npe {
                    for b in 0..npe {
                        let dot = g[a].dot(g[b]);
                        for i in 0..3 {
                            for m in 0..3 {
                                let delta = if i == m { dot } else { 0.0 };
                                k[(3 * a + i) * dim + 3 * b + m] += vol
                                    * (lambda * g[a][i] * g[b][m] + mu * (delta + g[a][m] * g[b][i]));
                            }
                        }
                    }
                }
            }
            None => {
                let t = numeric_tangent(law, &elem.deformation_gradient(q, disp));
                for a in 0..npe {
                    for b in 0..npe {
                        for i in 0..3 {
                            for m in 0..3 {
                                let mut sum = 0.0;
                                for j in 0..3 {
                                    for l in 0..3 {
                                        sum += g[a][j] * t[(3 * i + j) * 9 + 3 * m + l] * g[b][l];
                                    }
                                }
                                k[(3 * a + i) * dim + 3 * b + m] += vol * sum;
                            }
                        }
                    }
                }
            }
        }
    }
    k
}

/// Tangent stiffness triplets over all DOFs, in element order.
pub fn tangent_triplets(
    ctx: &RuntimeContext,
    elements: &[ElementData],
    law: &InternalMaterial,
    disp: &[DVec3],
) -> Vec<(usize, usize, f64)> {
    let local = ctx.map_points(elements.len(), |e| element_tangent(&elements[e], law, disp));
    let mut triplets = Vec::new();
    for (elem, k) in elements.iter().zip(local) {
        let dim = 3 * elem.nodes.len();
        for (a, &na) in elem.nodes.iter().enumerate() {
            for i in 0..3 {
                let row = 3 * na + i;
                for (b, &nb) in elem.nodes.iter().enumerate() {
                    for m in 0..3 {
                        let v = k[(3 * a + i) * dim + 3 * b + m];
                        if v != 0.0 {
                            triplets.push((row, 3 * nb + m, v));
                        }
                    }
                }
            }
        }
    }
    triplets
}

/// Reduced system for the free DOFs.
///
/// `scale_k` multiplies the stiffness, `diagonal` (per DOF) is added on
/// the diagonal. Fixed rows and columns are removed; `free_index[d]` maps
/// a global DOF to its row in the reduced system.
pub fn reduced_system(
    dof_count: usize,
    triplets: &[(usize, usize, f64)],
    scale_k: f64,
    diagonal: Option<&[f64]>,
    free_index: &[Option<usize>],
    free_count: usize,
) -> CsrMatrix {
    let mut reduced = Vec::with_capacity(triplets.len() + dof_count);
    for &(r, c, v) in triplets {
        if let (Some(fr), Some(fc)) = (free_index[r], free_index[c]) {
            reduced.push((fr, fc, scale_k * v));
        }
    }
    if let Some(diag) = diagonal {
        for (d, m) in diag.iter().enumerate() {
            if let Some(f) = free_index[d] {
                reduced.push((f, f, *m));
            }
        }
    }
    CsrMatrix::from_triplets(free_count, free_count, &reduced)
}

/// Row sums of absolute values per node, a Gershgorin bound on each
/// node's stiffness block.
pub fn gershgorin_bounds(node_count: usize, triplets: &[(usize, usize, f64)]) -> Vec<f64> {
    let mut rows = vec![0.0; 3 * node_count];
    for &(r, _, v) in triplets {
        rows[r] += v.abs();
    }
    (0..node_count)
        .map(|n| rows[3 * n].max(rows[3 * n + 1]).max(rows[3 * n + 2]))
        .collect()
}
