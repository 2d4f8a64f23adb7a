//! Sparse Cholesky solver backed by `faer`.
//!
//! The FEM adapter re-factorizes the reduced tangent stiffness on every
//! Newton iteration, but the sparsity pattern only changes when the free
//! DOF set does. [`FaerSolver`] therefore keeps the symbolic analysis
//! (ordering + elimination tree) keyed by the CSR pattern and repeats only
//! the numeric LLᵀ while the pattern matches.
//!
//! Only the upper triangle of the CSR input is handed to faer.

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use faer::sparse::{SparseColMat, Triplet};
use faer::Side;

use osteon_types::{OsteonError, OsteonResult};

use crate::sparse::{CsrMatrix, SparseSolver};

/// Symbolic analysis together with the pattern it was computed for.
struct CachedPattern {
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    symbolic: SymbolicLlt<usize>,
}

impl CachedPattern {
    fn matches(&self, matrix: &CsrMatrix) -> bool {
        self.row_ptr == matrix.row_ptr && self.col_idx == matrix.col_idx
    }
}

/// Sparse Cholesky (LLᵀ) solver for symmetric positive-definite systems.
#[derive(Default)]
pub struct FaerSolver {
    pattern: Option<CachedPattern>,
    factorization: Option<Llt<usize, f64>>,
    dimension: usize,
    symbolic_count: usize,
}

impl FaerSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of symbolic analyses performed so far.
    pub fn symbolic_count(&self) -> usize {
        self.symbolic_count
    }

    /// Upper triangle of `matrix` in faer's CSC layout.
    fn upper_csc(matrix: &CsrMatrix) -> OsteonResult<SparseColMat<usize, f64>> {
        let mut triplets = Vec::with_capacity(matrix.nnz() / 2 + matrix.rows);
        for row in 0..matrix.rows {
            for idx in matrix.row_ptr[row]..matrix.row_ptr[row + 1] {
                let col = matrix.col_idx[idx];
                if col >= row {
                    triplets.push(Triplet { row, col, val: matrix.values[idx] });
                }
            }
        }
        SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets)
            .map_err(|e| OsteonError::SingularSystem(format!("cannot build CSC matrix: {e:?}")))
    }
}

impl SparseSolver for FaerSolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> OsteonResult<()> {
        if matrix.rows != matrix.cols {
            return Err(OsteonError::SingularSystem(format!(
                "matrix must be square, got {}×{}",
                matrix.rows, matrix.cols
            )));
        }
        if matrix.rows == 0 {
            return Err(OsteonError::SingularSystem("empty system".into()));
        }

        self.factorization = None;
        self.dimension = matrix.rows;
        let csc = Self::upper_csc(matrix)?;

        if !self.pattern.as_ref().is_some_and(|p| p.matches(matrix)) {
            let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
                .map_err(|e| OsteonError::SingularSystem(format!("symbolic analysis failed: {e:?}")))?;
            self.symbolic_count += 1;
            self.pattern = Some(CachedPattern {
                row_ptr: matrix.row_ptr.clone(),
                col_idx: matrix.col_idx.clone(),
                symbolic,
            });
        }
        let Some(pattern) = self.pattern.as_ref() else {
            return Err(OsteonError::SingularSystem("missing symbolic analysis".into()));
        };

        let llt = Llt::try_new_with_symbolic(pattern.symbolic.clone(), csc.as_ref(), Side::Upper)
            .map_err(|e| OsteonError::SingularSystem(format!("matrix is not positive definite: {e:?}")))?;
        self.factorization = Some(llt);
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> OsteonResult<()> {
        let Some(llt) = self.factorization.as_ref() else {
            return Err(OsteonError::SingularSystem("solve called before factorize".into()));
        };
        if rhs.len() != self.dimension || solution.len() != self.dimension {
            return Err(OsteonError::InvalidConfig(format!(
                "vector lengths {}/{} do not match system size {}",
                rhs.len(),
                solution.len(),
                self.dimension
            )));
        }

        let b = faer::Mat::<f64>::from_fn(self.dimension, 1, |i, _| rhs[i]);
        let x = llt.solve(&b);
        for (i, out) in solution.iter_mut().enumerate() {
            *out = x[(i, 0)];
        }
        Ok(())
    }

    fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}
