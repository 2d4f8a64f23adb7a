//! Symmetric eigen-decompositions backed by `nalgebra`.
//!
//! Two uses in the core:
//! - principal stretches of `C = FᵀF` / `b = FFᵀ` for the Ogden model
//! - the generalized eigenproblem `K φ = ω² M φ` with lumped (diagonal) `M`,
//!   reduced to the standard form `M^{-1/2} K M^{-1/2}` for natural frequencies

use glam::{DMat3, DVec3};
use nalgebra::{DMatrix, Matrix3};

/// Eigen-decomposition of a symmetric 3×3 matrix.
///
/// Returns eigenvalues and the matching unit eigenvectors, in ascending order
/// of eigenvalue.
pub fn symmetric_eigen3(m: &DMat3) -> ([f64; 3], [DVec3; 3]) {
    let a = Matrix3::new(
        m.x_axis.x, m.y_axis.x, m.z_axis.x,
        m.x_axis.y, m.y_axis.y, m.z_axis.y,
        m.x_axis.z, m.y_axis.z, m.z_axis.z,
    );
    let eig = a.symmetric_eigen();

    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));

    let mut values = [0.0; 3];
    let mut vectors = [DVec3::ZERO; 3];
    for (slot, &k) in order.iter().enumerate() {
        values[slot] = eig.eigenvalues[k];
        let col = eig.eigenvectors.column(k);
        vectors[slot] = DVec3::new(col[0], col[1], col[2]);
    }
    (values, vectors)
}

/// Eigenvalues of a dense symmetric matrix given in row-major order,
/// sorted ascending.
pub fn symmetric_eigenvalues(n: usize, row_major: &[f64]) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let a = DMatrix::from_row_slice(n, n, row_major);
    let eig = a.symmetric_eigen();
    let mut values: Vec<f64> = eig.eigenvalues.iter().copied().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}
