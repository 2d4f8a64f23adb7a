//! Second-order tensor helpers and the Voigt stress tensor.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

/// Outer product `a ⊗ b` (entry `(i, j) = a_i b_j`).
#[inline]
pub fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Double contraction `A : B = Σ A_ij B_ij`.
#[inline]
pub fn ddot(a: &DMat3, b: &DMat3) -> f64 {
    a.x_axis.dot(b.x_axis) + a.y_axis.dot(b.y_axis) + a.z_axis.dot(b.z_axis)
}

/// Trace of a 3×3 matrix.
#[inline]
pub fn trace(m: &DMat3) -> f64 {
    m.x_axis.x + m.y_axis.y + m.z_axis.z
}

/// Symmetric part `(A + Aᵀ) / 2`.
#[inline]
pub fn sym(m: &DMat3) -> DMat3 {
    (*m + m.transpose()) * 0.5
}

/// Entry `(row, col)` of a column-major glam matrix.
#[inline]
pub fn entry(m: &DMat3, row: usize, col: usize) -> f64 {
    m.col(col)[row]
}

/// True when every entry is finite.
#[inline]
pub fn is_finite(m: &DMat3) -> bool {
    m.x_axis.is_finite() && m.y_axis.is_finite() && m.z_axis.is_finite()
}

/// Symmetric stress tensor in Voigt order `[xx, yy, zz, yz, xz, xy]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StressTensor(pub [f64; 6]);

impl StressTensor {
    /// The zero tensor.
    pub const ZERO: Self = Self([0.0; 6]);

    /// Builds the tensor from a (nominally symmetric) matrix; the
    /// off-diagonal entries are symmetrized.
    pub fn from_mat(m: &DMat3) -> Self {
        let s = sym(m);
        Self([
            s.x_axis.x,
            s.y_axis.y,
            s.z_axis.z,
            s.z_axis.y,
            s.z_axis.x,
            s.y_axis.x,
        ])
    }

    /// Expands back to a full symmetric matrix.
    pub fn to_mat(&self) -> DMat3 {
        let [xx, yy, zz, yz, xz, xy] = self.0;
        DMat3::from_cols(
            DVec3::new(xx, xy, xz),
            DVec3::new(xy, yy, yz),
            DVec3::new(xz, yz, zz),
        )
    }

    /// Mean normal stress (positive in tension).
    pub fn hydrostatic(&self) -> f64 {
        (self.0[0] + self.0[1] + self.0[2]) / 3.0
    }

    /// Von Mises equivalent stress.
    pub fn von_mises(&self) -> f64 {
        let [xx, yy, zz, yz, xz, xy] = self.0;
        let normal = (xx - yy).powi(2) + (yy - zz).powi(2) + (zz - xx).powi(2);
        let shear = 6.0 * (yz * yz + xz * xz + xy * xy);
        (0.5 * (normal + shear)).sqrt()
    }

    /// Weighted accumulation used for nodal stress recovery.
    pub fn add_scaled(&mut self, other: &StressTensor, weight: f64) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += weight * b;
        }
    }

    /// Divides every component by `w` (no-op when `w` is zero).
    pub fn normalize(&mut self, w: f64) {
        if w.abs() > 0.0 {
            for a in &mut self.0 {
                *a /= w;
            }
        }
    }
}
