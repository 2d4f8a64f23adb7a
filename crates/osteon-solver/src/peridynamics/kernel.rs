//! Non-ordinary state-based correspondence kernels.
//!
//! For a particle `i` with family `H_i`, bond `ξ = X_j − X_i` and
//! deformed bond `Y = y_j − y_i`:
//!
//! ```text
//! K_i = Σ_j ω ξ⊗ξ V_j                     shape tensor
//! F_i = (Σ_j ω Y⊗ξ V_j) K_i⁻¹             deformation gradient
//! T_i<ξ> = ω P_i K_i⁻¹ ξ                  force state
//! f_i = Σ_j (T_i<ξ> − T_j<−ξ>) V_i V_j    pairwise, in gather form
//! ```
//!
//! Zero-energy modes are suppressed with a bond-level penalty on the
//! non-uniform part of the deformation, `z = Y − F ξ`.

use osteon_math::tensor::outer;
use osteon_math::{DMat3, DVec3};
use osteon_runtime::RuntimeContext;

use crate::family::BondFamily;

/// `m⁻¹`, or zero when `m` is singular relative to its scale.
pub fn safe_inverse(m: &DMat3) -> DMat3 {
    let scale = (m.x_axis.length() * m.y_axis.length() * m.z_axis.length()).max(f64::MIN_POSITIVE);
    let det = m.determinant();
    if !det.is_finite() || det.abs() <= 1e-10 * scale {
        DMat3::ZERO
    } else {
        m.inverse()
    }
}

/// Inverse shape tensors over intact bonds.
pub fn inverse_shape_tensors(ctx: &RuntimeContext, family: &BondFamily, volumes: &[f64]) -> Vec<DMat3> {
    ctx.map_points(family.point_count(), |i| {
        let mut k = DMat3::ZERO;
        for b in family.bonds(i) {
            if family.intact[b] {
                let xi = family.xi[b];
                k += outer(xi, xi) * (family.weight[b] * volumes[family.neighbors[b]]);
            }
        }
        safe_inverse(&k)
    })
}

/// Nonlocal deformation gradients. Particles with a singular shape
/// tensor report the identity.
pub fn deformation_gradients(
    ctx: &RuntimeContext,
    family: &BondFamily,
    volumes: &[f64],
    k_inv: &[DMat3],
    current: &[DVec3],
) -> Vec<DMat3> {
    ctx.map_points(family.point_count(), |i| {
        if k_inv[i] == DMat3::ZERO {
            return DMat3::IDENTITY;
        }
        let mut n = DMat3::ZERO;
        for b in family.bonds(i) {
            if family.intact[b] {
                let j = family.neighbors[b];
                n += outer(current[j] - current[i], family.xi[b]) * (family.weight[b] * volumes[j]);
            }
        }
        n * k_inv[i]
    })
}

/// Inputs of the force kernel.
pub struct ForceInput<'a> {
    pub family: &'a BondFamily,
    pub volumes: &'a [f64],
    pub current: &'a [DVec3],
    pub def_grad: &'a [DMat3],
    /// `P_i K_i⁻¹` per particle.
    pub stress_map: &'a [DMat3],
    /// `G c` stabilization modulus.
    pub stabilization: f64,
    /// Per-particle stabilization scale `n_i / n_max`.
    pub scale: &'a [f64],
}

/// Force on every particle from its family.
pub fn internal_forces(ctx: &RuntimeContext, input: &ForceInput<'_>) -> Vec<DVec3> {
    let family = input.family;
    ctx.map_points(family.point_count(), |i| {
        let mut f = DVec3::ZERO;
        for b in family.bonds(i) {
            if !family.intact[b] {
                continue;
            }
            let j = family.neighbors[b];
            let xi = family.xi[b];
            let w = family.weight[b] * input.volumes[i] * input.volumes[j];
            f += (input.stress_map[i] * xi + input.stress_map[j] * xi) * w;

            if input.stabilization > 0.0 {
                let y = input.current[j] - input.current[i];
                let zi = y - input.def_grad[i] * xi;
                let zj = y - input.def_grad[j] * xi;
                f += (zi * input.scale[i] + zj * input.scale[j])
                    * (input.stabilization * w / family.length[b]);
            }
        }
        f
    })
}

/// Gershgorin bound on each particle's stiffness row.
pub fn stiffness_bounds(
    ctx: &RuntimeContext,
    family: &BondFamily,
    volumes: &[f64],
    k_inv: &[DMat3],
    modulus: f64,
    stabilization: f64,
) -> Vec<f64> {
    let spread: Vec<f64> = ctx.map_points(family.point_count(), |i| {
        family
            .bonds(i)
            .filter(|&b| family.intact[b])
            .map(|b| family.weight[b] * volumes[family.neighbors[b]] * (k_inv[i] * family.xi[b]).length())
            .sum()
    });
    ctx.map_points(family.point_count(), |i| {
        let mut k = spread[i] * spread[i];
        let mut stab = 0.0;
        for b in family.bonds(i) {
            if !family.intact[b] {
                continue;
            }
            let j = family.neighbors[b];
            let xi = family.xi[b];
            k += family.weight[b] * volumes[j] * (k_inv[j] * xi).length() * spread[j];
            stab += family.weight[b] * volumes[j] / family.length[b]
                * (2.0 + family.length[b] * (spread[i] + spread[j]));
        }
        2.0 * volumes[i] * (2.0 * modulus * k + stabilization * stab)
    })
}
