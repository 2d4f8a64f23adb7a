//! Reproducing-kernel kernels for the stabilized nodally integrated
//! meshfree Galerkin method.
//!
//! Each particle `I` carries, for every neighbor `J` (itself included),
//! the implicit gradient
//!
//! ```text
//! M_I   = Σ_J H(ξ) H(ξ)ᵀ φ(|ξ|/a) V_J          ξ = X_J − X_I, H = [1, ξ]
//! G_IJ  = rows 1..3 of M_I⁻¹ H(ξ) φ V_J
//! F_I   = I + Σ_J u_J ⊗ G_IJ
//! ```
//!
//! which reproduces linear fields exactly. Internal forces follow from
//! nodal integration of `Π = Σ_I V_I W(F_I)`.

use nalgebra::{Matrix4, Vector4};
use osteon_math::tensor::outer;
use osteon_math::{DMat3, DVec3};
use osteon_runtime::RuntimeContext;

use crate::family::BondFamily;

/// Cubic B-spline kernel of normalized distance `z = r / a`.
pub fn cubic_spline(z: f64) -> f64 {
    let z = z.abs();
    if z <= 0.5 {
        2.0 / 3.0 - 4.0 * z * z + 4.0 * z * z * z
    } else if z <= 1.0 {
        4.0 / 3.0 - 4.0 * z + 4.0 * z * z - 4.0 / 3.0 * z * z * z
    } else {
        0.0
    }
}

/// Implicit gradients per bond. Broken bonds and particles with a
/// singular moment matrix get zero gradients.
pub fn implicit_gradients(ctx: &RuntimeContext, family: &BondFamily, volumes: &[f64]) -> Vec<DVec3> {
    let per_point = ctx.map_points(family.point_count(), |i| {
        let bonds = family.bonds(i);
        let mut m = Matrix4::<f64>::zeros();
        for b in bonds.clone() {
            if family.intact[b] {
                let h = basis(family.xi[b]);
                m += h * h.transpose() * (family.weight[b] * volumes[family.neighbors[b]]);
            }
        }
        let mut grads = vec![DVec3::ZERO; bonds.len()];
        let Some(m_inv) = m.try_inverse() else { return grads };
        for (slot, b) in bonds.enumerate() {
            if family.intact[b] {
                let g = m_inv * basis(family.xi[b]) * (family.weight[b] * volumes[family.neighbors[b]]);
                grads[slot] = DVec3::new(g[1], g[2], g[3]);
            }
        }
        grads
    });
    per_point.into_iter().flatten().collect()
}

fn basis(xi: DVec3) -> Vector4<f64> {
    Vector4::new(1.0, xi.x, xi.y, xi.z)
}

/// `F_I = I + Σ_J u_J ⊗ G_IJ`.
pub fn deformation_gradients(
    ctx: &RuntimeContext,
    family: &BondFamily,
    grads: &[DVec3],
    disp: &[DVec3],
) -> Vec<DMat3> {
    ctx.map_points(family.point_count(), |i| {
        let mut h = DMat3::ZERO;
        for b in family.bonds(i) {
            h += outer(disp[family.neighbors[b]], grads[b]);
        }
        DMat3::IDENTITY + h
    })
}

/// Inputs of the force kernel.
pub struct ForceInput<'a> {
    pub family: &'a BondFamily,
    pub volumes: &'a [f64],
    pub grads: &'a [DVec3],
    pub current: &'a [DVec3],
    pub def_grad: &'a [DMat3],
    /// First Piola-Kirchhoff stress per particle.
    pub piola: &'a [DMat3],
    /// `stabilization · M_p`, scaled per bond by the normalized kernel.
    pub penalty: f64,
}

/// Pair penalty stiffness of bond `b`.
#[inline]
pub fn pair_stiffness(family: &BondFamily, volumes: &[f64], penalty: f64, b: usize) -> f64 {
    let (i, j) = (family.owner[b], family.neighbors[b]);
    let normalized = family.weight[b] / cubic_spline(0.0);
    penalty * normalized * (volumes[i] * volumes[j]).sqrt() / (family.length[b] * family.length[b])
}

/// Force on every particle: `−Σ_K V_K P_K G_KJ` plus the pair penalty.
pub fn internal_forces(ctx: &RuntimeContext, input: &ForceInput<'_>) -> Vec<DVec3> {
    let family = input.family;
    ctx.map_points(family.point_count(), |j| {
        let mut f = DVec3::ZERO;
        for b in family.bonds(j) {
            let k = family.neighbors[b];
            let g = input.grads[family.mirror[b]];
            f -= (input.piola[k] * g) * input.volumes[k];

            if k == j || !family.intact[b] || input.penalty == 0.0 {
                continue;
            }
            let xi = family.xi[b];
            let y = input.current[k] - input.current[j];
            let zj = y - input.def_grad[j] * xi;
            let zk = y - input.def_grad[k] * xi;
            f += (zj + zk) * (0.5 * pair_stiffness(family, input.volumes, input.penalty, b));
        }
        f
    })
}

/// Gershgorin bound on each particle's stiffness row.
pub fn stiffness_bounds(
    ctx: &RuntimeContext,
    family: &BondFamily,
    volumes: &[f64],
    grads: &[DVec3],
    modulus: f64,
    penalty: f64,
) -> Vec<f64> {
    let spread: Vec<f64> = ctx.map_points(family.point_count(), |i| {
        family.bonds(i).map(|b| grads[b].length()).sum()
    });
    ctx.map_points(family.point_count(), |j| {
        let mut k = 0.0;
        for b in family.bonds(j) {
            let n = family.neighbors[b];
            k += modulus * volumes[n] * grads[family.mirror[b]].length() * spread[n];
            if n != j && family.intact[b] {
                k += pair_stiffness(family, volumes, penalty, b)
                    * (2.0 + family.length[b] * (spread[j] + spread[n]));
            }
        }
        2.0 * k
    })
}
