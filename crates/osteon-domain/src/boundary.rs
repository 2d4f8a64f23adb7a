//! Boundary conditions.

use osteon_math::DVec3;
use serde::{Deserialize, Serialize};

/// What a boundary condition does to its points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// Zero displacement on every axis for all steps.
    Fixed,
    /// Zero displacement on the flagged axes only (roller / symmetry).
    FixedAxes([bool; 3]),
    /// Constant external load, `value` is the total force distributed over the points.
    Force,
}

/// A boundary condition applied to a set of point indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub kind: BoundaryKind,
    /// Sorted, de-duplicated point indices.
    pub indices: Vec<usize>,
    /// Total force for `Force`; unused otherwise.
    pub value: DVec3,
}

impl BoundaryCondition {
    /// Builds a condition, normalizing the index set.
    pub fn new(kind: BoundaryKind, indices: &[usize], value: DVec3) -> Self {
        let mut indices = indices.to_vec();
        indices.sort_unstable();
        indices.dedup();
        Self { kind, indices, value }
    }

    /// Axes this condition constrains, if any.
    pub fn constrained_axes(&self) -> [bool; 3] {
        match self.kind {
            BoundaryKind::Fixed => [true; 3],
            BoundaryKind::FixedAxes(axes) => axes,
            BoundaryKind::Force => [false; 3],
        }
    }

    /// True for `Fixed` and `FixedAxes` with at least one axis.
    pub fn is_constraint(&self) -> bool {
        self.constrained_axes().iter().any(|&a| a)
    }
}
