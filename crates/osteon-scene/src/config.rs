//! Scene configuration.

use osteon_solver::SolverConfig;
use osteon_types::constants::DEFAULT_KINETIC_ENERGY_TOLERANCE;
use osteon_types::{OsteonError, OsteonResult};
use serde::{Deserialize, Serialize};

/// How a scene is solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneMode {
    /// Two mesh-based bodies, staggered static solves until the contact
    /// forces stop changing.
    Static,
    /// Every body relaxes together; contact is recomputed every iteration.
    #[default]
    QuasiStatic,
    /// Lock-step explicit time marching for a fixed number of steps.
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub mode: SceneMode,
    /// Iteration cap for the static and quasi-static modes.
    pub max_iterations: u32,
    /// Time steps in explicit mode.
    pub steps: u32,
    /// Explicit time step. Estimated from the bodies and contacts when unset.
    pub dt: Option<f64>,
    /// Quasi-static convergence: kinetic energy relative to its peak.
    pub kinetic_energy_tolerance: f64,
    /// Static convergence: relative change of the contact forces.
    pub contact_tolerance: f64,
    /// Initial under-relaxation of contact forces between staggered solves.
    pub contact_relaxation: f64,
    /// Normal contact damping as a fraction of critical.
    pub damping_ratio: f64,
    /// Stick stiffness as a fraction of the normal penalty.
    pub tangential_stiffness_factor: f64,
    /// Settings for every deformable body. `analysis` is set by the mode.
    pub solver: SolverConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            mode: SceneMode::QuasiStatic,
            max_iterations: 20_000,
            steps: 1_000,
            dt: None,
            kinetic_energy_tolerance: DEFAULT_KINETIC_ENERGY_TOLERANCE,
            contact_tolerance: 1e-4,
            contact_relaxation: 0.3,
            damping_ratio: 0.1,
            tangential_stiffness_factor: 0.5,
            solver: SolverConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn static_pair() -> Self {
        Self { mode: SceneMode::Static, max_iterations: 100, ..Default::default() }
    }

    pub fn explicit(steps: u32) -> Self {
        Self { mode: SceneMode::Explicit, steps, ..Default::default() }
    }

    pub fn validate(&self) -> OsteonResult<()> {
        let invalid = |msg: String| Err(OsteonError::InvalidConfig(msg));
        if self.max_iterations == 0 {
            return invalid("scene max_iterations must be at least 1".into());
        }
        if self.mode == SceneMode::Explicit && self.steps == 0 {
            return invalid("explicit scene needs at least one step".into());
        }
        if let Some(dt) = self.dt {
            if !(dt > 0.0) || !dt.is_finite() {
                return invalid(format!("time step must be positive, got {dt}"));
            }
        }
        if !(self.kinetic_energy_tolerance > 0.0) || !(self.contact_tolerance > 0.0) {
            return invalid("scene tolerances must be positive".into());
        }
        if !(self.contact_relaxation > 0.0 && self.contact_relaxation <= 1.0) {
            return invalid(format!("contact_relaxation must lie in (0, 1], got {}", self.contact_relaxation));
        }
        if !(self.damping_ratio >= 0.0) || !(self.tangential_stiffness_factor >= 0.0) {
            return invalid("contact damping and tangential factor must be non-negative".into());
        }
        self.solver.validate()
    }
}
