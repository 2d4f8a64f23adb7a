//! # osteon-math
//!
//! Linear algebra primitives for the osteon core.
//!
//! Provides:
//! - Re-exports of the double-precision `glam` types (`DVec3`, `DMat3`, `DQuat`)
//! - Sparse matrix representation (CSR) and a faer-backed Cholesky solver
//! - Rodrigues rotation for prescribed rigid motion
//! - Voigt stress tensors and small tensor helpers
//! - Symmetric eigen-decomposition (nalgebra) for modal analysis and principal stretches

pub mod eigen;
pub mod faer_solver;
pub mod rotation;
pub mod sparse;
pub mod tensor;

// Re-export glam f64 types as the canonical math types for osteon.
pub use glam::{DMat3, DQuat, DVec3};
pub use tensor::StressTensor;
