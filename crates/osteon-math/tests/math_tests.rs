//! Integration tests for osteon-math.

use std::f64::consts::PI;

use osteon_math::eigen::{symmetric_eigen3, symmetric_eigenvalues};
use osteon_math::faer_solver::FaerSolver;
use osteon_math::rotation::{rodrigues, rotate_about};
use osteon_math::sparse::{CsrMatrix, SparseSolver};
use osteon_math::tensor::{ddot, outer, trace};
use osteon_math::{DMat3, DVec3, StressTensor};
use osteon_types::OsteonError;

// ─── CSR Tests ────────────────────────────────────────────────

#[test]
fn csr_merges_duplicates() {
    let m = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 0, 2.0), (1, 1, 4.0), (0, 1, -1.0)]);
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.get(0, 0), 3.0);
    assert_eq!(m.get(0, 1), -1.0);
    assert_eq!(m.get(1, 0), 0.0);
    assert_eq!(m.diagonal(), vec![3.0, 4.0]);
}

#[test]
fn csr_mul_vec() {
    let m = CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)]);
    let y = m.mul_vec(&[1.0, 2.0]);
    assert_eq!(y, vec![4.0, 7.0]);
}

// ─── Faer Cholesky Tests ──────────────────────────────────────

#[test]
fn faer_solves_spd_system() {
    // 1D Laplacian with Dirichlet ends: tridiagonal [-1, 2, -1]
    let n = 5;
    let mut triplets = Vec::new();
    for i in 0..n {
        triplets.push((i, i, 2.0));
        if i > 0 {
            triplets.push((i, i - 1, -1.0));
        }
        if i + 1 < n {
            triplets.push((i, i + 1, -1.0));
        }
    }
    let a = CsrMatrix::from_triplets(n, n, &triplets);
    let x_true = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let b = a.mul_vec(&x_true);

    let mut solver = FaerSolver::new();
    assert!(!solver.is_factorized());
    solver.factorize(&a).unwrap();
    assert!(solver.is_factorized());

    let mut x = vec![0.0; n];
    solver.solve(&b, &mut x).unwrap();
    for i in 0..n {
        assert!((x[i] - x_true[i]).abs() < 1e-10, "x[{i}] = {}", x[i]);
    }
}

#[test]
fn faer_rejects_wrong_rhs_length() {
    let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 1.0)]);
    let mut solver = FaerSolver::new();
    solver.factorize(&a).unwrap();
    let mut x = vec![0.0; 2];
    assert!(solver.solve(&[1.0], &mut x).is_err());
}

#[test]
fn faer_rejects_empty_matrix() {
    let a = CsrMatrix::new(0, 0);
    let mut solver = FaerSolver::new();
    assert!(matches!(solver.factorize(&a), Err(OsteonError::SingularSystem(_))));
}

#[test]
fn faer_rejects_indefinite_matrix() {
    let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 2.0), (1, 0, 2.0), (1, 1, 1.0)]);
    let mut solver = FaerSolver::new();
    assert!(matches!(solver.factorize(&a), Err(OsteonError::SingularSystem(_))));
    assert!(!solver.is_factorized());
}

#[test]
fn faer_reuses_symbolic_analysis_for_same_pattern() {
    let pattern = |k: f64| CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0 * k), (0, 1, -k), (1, 0, -k), (1, 1, 2.0 * k)]);
    let mut solver = FaerSolver::new();
    solver.factorize(&pattern(1.0)).unwrap();
    solver.factorize(&pattern(4.0)).unwrap();
    assert_eq!(solver.symbolic_count(), 1);

    let mut x = vec![0.0; 2];
    solver.solve(&[4.0, 4.0], &mut x).unwrap();
    assert!((x[0] - 1.0).abs() < 1e-12 && (x[1] - 1.0).abs() < 1e-12);

    solver.factorize(&CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 1.0)])).unwrap();
    assert_eq!(solver.symbolic_count(), 2);
}

// ─── Rotation Tests ───────────────────────────────────────────

#[test]
fn rodrigues_quarter_turn() {
    let v = rodrigues(DVec3::X, DVec3::Z, PI / 2.0);
    assert!((v - DVec3::Y).length() < 1e-12);
}

#[test]
fn rodrigues_preserves_length_and_axis() {
    let axis = DVec3::new(1.0, 1.0, 0.0);
    let v = DVec3::new(0.3, -2.0, 1.5);
    let r = rodrigues(v, axis, 0.7);
    assert!((r.length() - v.length()).abs() < 1e-12);

    let along = rodrigues(axis * 2.0, axis, 1.3);
    assert!((along - axis * 2.0).length() < 1e-12);
}

#[test]
fn rotate_about_pivot() {
    let p = rotate_about(DVec3::new(2.0, 1.0, 0.0), DVec3::new(1.0, 1.0, 0.0), DVec3::Z, PI);
    assert!((p - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-12);
}

// ─── Tensor Tests ─────────────────────────────────────────────

#[test]
fn outer_and_contraction() {
    let m = outer(DVec3::new(1.0, 2.0, 3.0), DVec3::new(4.0, 5.0, 6.0));
    // (i, j) = a_i b_j → (1, 2) = 2 * 6
    assert_eq!(m.col(2)[1], 12.0);
    assert_eq!(trace(&m), 4.0 + 10.0 + 18.0);
    assert_eq!(ddot(&DMat3::IDENTITY, &m), trace(&m));
}

#[test]
fn von_mises_uniaxial() {
    let s = StressTensor([100.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    assert!((s.von_mises() - 100.0).abs() < 1e-10);
    assert!((s.hydrostatic() - 100.0 / 3.0).abs() < 1e-10);
}

#[test]
fn von_mises_pure_shear() {
    let s = StressTensor([0.0, 0.0, 0.0, 0.0, 0.0, 10.0]);
    assert!((s.von_mises() - 10.0 * 3.0_f64.sqrt()).abs() < 1e-10);
}

#[test]
fn stress_tensor_matrix_round_trip() {
    let s = StressTensor([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let back = StressTensor::from_mat(&s.to_mat());
    assert_eq!(back, s);
}

#[test]
fn stress_tensor_serializes_in_voigt_order() {
    let s = StressTensor([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(serde_json::to_string(&s).unwrap(), "[1.0,2.0,3.0,4.0,5.0,6.0]");
    let v: DVec3 = serde_json::from_str("[0.5, 1, 2]").unwrap();
    assert_eq!(v, DVec3::new(0.5, 1.0, 2.0));
}

// ─── Eigen Tests ──────────────────────────────────────────────

#[test]
fn eigen3_diagonal() {
    let m = DMat3::from_diagonal(DVec3::new(3.0, 1.0, 2.0));
    let (values, vectors) = symmetric_eigen3(&m);
    assert!((values[0] - 1.0).abs() < 1e-12);
    assert!((values[1] - 2.0).abs() < 1e-12);
    assert!((values[2] - 3.0).abs() < 1e-12);
    assert!(vectors[0].dot(DVec3::Y).abs() > 1.0 - 1e-12);
}

#[test]
fn dense_eigenvalues_sorted() {
    // [[2, 1], [1, 2]] → eigenvalues 1 and 3
    let values = symmetric_eigenvalues(2, &[2.0, 1.0, 1.0, 2.0]);
    assert!((values[0] - 1.0).abs() < 1e-12);
    assert!((values[1] - 3.0).abs() < 1e-12);
}
