//! Solver configuration.
//!
//! Every struct deserializes with per-field defaults so partial TOML or
//! JSON configuration is accepted.

use osteon_types::constants::{
    DEFAULT_CFL, DEFAULT_HORIZON_FACTOR, DEFAULT_MAX_ITERATIONS,
    DEFAULT_SUPPORT_FACTOR, DEFAULT_TOLERANCE,
};
use osteon_types::{OsteonError, OsteonResult};
use serde::{Deserialize, Serialize};

/// What kind of solution is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    /// Equilibrium by Newton-Raphson (mesh-based adapter).
    #[default]
    Static,
    /// Equilibrium by damping out kinetic energy.
    QuasiStatic,
    /// Time history.
    Dynamic,
}

/// Time integrator for mesh-based dynamic analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    /// Implicit Newmark-β, average acceleration.
    #[default]
    Newmark,
    /// Explicit central difference.
    CentralDifference,
}

/// Stress measure for the particle adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressMeasure {
    #[default]
    SmallStrain,
    StVenantKirchhoff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FemConfig {
    /// Load increments for nonlinear static solves.
    pub load_steps: u32,
    /// Mass-proportional Rayleigh coefficient.
    pub rayleigh_alpha: f64,
    /// Stiffness-proportional Rayleigh coefficient.
    pub rayleigh_beta: f64,
    /// Soft-spring stiffness for unconstrained bodies, relative to the mean diagonal.
    pub soft_spring: f64,
    /// Largest free-DOF count accepted by the dense modal solver.
    pub max_modal_dofs: usize,
}

impl Default for FemConfig {
    fn default() -> Self {
        Self {
            load_steps: 1,
            rayleigh_alpha: 0.0,
            rayleigh_beta: 0.0,
            soft_spring: 1e-8,
            max_modal_dofs: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeridynamicsConfig {
    /// Horizon as a multiple of the mean particle spacing.
    pub horizon_factor: f64,
    /// Explicit critical bond stretch. Takes precedence over `fracture_energy`.
    pub critical_stretch: Option<f64>,
    /// Critical energy release rate `G0` (J/m²) used to derive the critical stretch.
    pub fracture_energy: Option<f64>,
    /// Zero-energy mode stabilization coefficient.
    pub stabilization: f64,
    pub stress_measure: StressMeasure,
    /// Zero velocities at kinetic-energy peaks during relaxation.
    pub kinetic_damping: bool,
}

impl Default for PeridynamicsConfig {
    fn default() -> Self {
        Self {
            horizon_factor: DEFAULT_HORIZON_FACTOR,
            critical_stretch: None,
            fracture_energy: None,
            stabilization: 1.0,
            stress_measure: StressMeasure::SmallStrain,
            kinetic_damping: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshfreeConfig {
    /// Kernel support radius as a multiple of the mean particle spacing.
    pub support_factor: f64,
    /// Pairwise penalty stabilization coefficient.
    pub stabilization: f64,
    /// Connection breaks past this stretch.
    pub critical_stretch: Option<f64>,
    pub stress_measure: StressMeasure,
    pub kinetic_damping: bool,
}

impl Default for MeshfreeConfig {
    fn default() -> Self {
        Self {
            support_factor: DEFAULT_SUPPORT_FACTOR,
            stabilization: 0.1,
            critical_stretch: None,
            stress_measure: StressMeasure::SmallStrain,
            kinetic_damping: true,
        }
    }
}

/// Configuration for a single-body solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub analysis: AnalysisType,
    pub integrator: Integrator,
    /// Time steps for dynamic analyses.
    pub steps: u32,
    /// Time step. `None` uses the adapter's stable estimate.
    pub dt: Option<f64>,
    /// Newton iterations per load step (or per implicit time step).
    pub max_iterations: u32,
    /// Relative residual tolerance for Newton iterations.
    pub tolerance: f64,
    /// Pseudo-time steps allowed for quasi-static relaxation.
    pub relaxation_steps: u32,
    /// Relative residual tolerance for quasi-static relaxation.
    pub relaxation_tolerance: f64,
    /// Fraction of the critical explicit time step.
    pub cfl: f64,
    /// Number of natural frequencies to report (mesh-based only).
    pub modes: usize,
    pub fem: FemConfig,
    pub peridynamics: PeridynamicsConfig,
    pub meshfree: MeshfreeConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisType::Static,
            integrator: Integrator::Newmark,
            steps: 100,
            dt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            relaxation_steps: 20_000,
            relaxation_tolerance: 1e-5,
            cfl: DEFAULT_CFL,
            modes: 0,
            fem: FemConfig::default(),
            peridynamics: PeridynamicsConfig::default(),
            meshfree: MeshfreeConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Loose tolerances and few iterations, for quick checks.
    pub fn debug() -> Self {
        Self {
            max_iterations: 5,
            tolerance: 1e-4,
            relaxation_steps: 2_000,
            relaxation_tolerance: 1e-3,
            ..Default::default()
        }
    }

    /// Tight tolerances, more load steps.
    pub fn high_quality() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
            relaxation_steps: 100_000,
            relaxation_tolerance: 1e-7,
            fem: FemConfig {
                load_steps: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn quasi_static() -> Self {
        Self {
            analysis: AnalysisType::QuasiStatic,
            ..Default::default()
        }
    }

    pub fn dynamic(integrator: Integrator, steps: u32) -> Self {
        Self {
            analysis: AnalysisType::Dynamic,
            integrator,
            steps,
            ..Default::default()
        }
    }
}

impl SolverConfig {
    /// Rejects values no solve can proceed with.
    pub fn validate(&self) -> OsteonResult<()> {
        let invalid = |msg: String| Err(OsteonError::InvalidConfig(msg));
        if !(self.tolerance > 0.0) || !(self.relaxation_tolerance > 0.0) {
            return invalid("tolerances must be positive".into());
        }
        if !(self.cfl > 0.0 && self.cfl <= 1.0) {
            return invalid(format!("cfl must lie in (0, 1], got {}", self.cfl));
        }
        if let Some(dt) = self.dt {
            if !(dt > 0.0) || !dt.is_finite() {
                return invalid(format!("time step must be positive, got {dt}"));
            }
        }
        if self.max_iterations == 0 || self.relaxation_steps == 0 {
            return invalid("iteration limits must be at least 1".into());
        }
        if self.analysis == AnalysisType::Dynamic && self.steps == 0 {
            return invalid("dynamic analysis needs at least one step".into());
        }
        if self.fem.load_steps == 0 {
            return invalid("load_steps must be at least 1".into());
        }
        if self.fem.rayleigh_alpha < 0.0 || self.fem.rayleigh_beta < 0.0 {
            return invalid("Rayleigh coefficients must be non-negative".into());
        }
        Ok(())
    }
}
