//! Solve results and warnings.

use osteon_math::{DVec3, StressTensor};
use osteon_runtime::{BackendKind, Precision};
use osteon_types::AdapterKind;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisType;

/// A documented, non-fatal deviation from what was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum SolveWarning {
    /// A hyperelastic model was replaced by its linear-elastic projection.
    MaterialProjected { model: String, adapter: AdapterKind },
    /// The requested analysis is not offered by the adapter.
    AnalysisSubstituted { requested: AnalysisType, used: AnalysisType },
    /// The requested backend was unavailable.
    BackendFallback { requested: BackendKind, used: BackendKind },
    /// The body has no Dirichlet condition and was regularized with soft springs.
    SoftSprings,
    /// The requested time step exceeded the stable estimate and was reduced.
    TimeStepClamped { requested: f64, used: f64 },
}

/// Outcome of one adapter step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Nonlinear iterations inside the step (1 for explicit steps).
    pub iterations: u32,
    /// Relative out-of-balance force at the end of the step.
    pub residual: f64,
    /// Whether an iterative step met its tolerance.
    pub converged: bool,
    /// Kinetic energy during the step, before any kinetic-damping reset.
    pub kinetic_energy: f64,
    /// Bonds or connections broken during the step.
    pub broken: usize,
}

/// Result of a single-body solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    pub displacements: Vec<DVec3>,
    /// Cauchy stress per point. Empty when the adapter does not recover stress.
    pub stress: Vec<StressTensor>,
    /// Broken-bond fraction per point. Empty for the mesh-based adapter.
    pub damage: Vec<f64>,
    pub converged: bool,
    /// Newton iterations, relaxation steps, or time steps taken.
    pub iterations: u32,
    /// Wall-clock seconds.
    pub elapsed_time: f64,
    pub backend: BackendKind,
    pub precision: Precision,
    pub method: AdapterKind,
    pub analysis: AnalysisType,
    pub warnings: Vec<SolveWarning>,
    pub strain_energy: f64,
    pub final_residual: f64,
    pub kinetic_energy: f64,
    /// Natural frequencies in Hz, ascending, when requested.
    pub natural_frequencies: Vec<f64>,
}

impl SolveResult {
    /// Largest displacement magnitude.
    pub fn max_displacement(&self) -> f64 {
        self.displacements.iter().map(|u| u.length()).fold(0.0, f64::max)
    }

    /// Largest von Mises stress.
    pub fn max_von_mises(&self) -> f64 {
        self.stress.iter().map(|s| s.von_mises()).fold(0.0, f64::max)
    }

    /// Largest damage value.
    pub fn max_damage(&self) -> f64 {
        self.damage.iter().copied().fold(0.0, f64::max)
    }
}
