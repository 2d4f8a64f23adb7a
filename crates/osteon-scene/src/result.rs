//! Scene results.

use osteon_math::DVec3;
use osteon_runtime::{BackendKind, Precision};
use osteon_solver::{SolveResult, SolveWarning};
use osteon_types::BodyId;
use serde::{Deserialize, Serialize};

use crate::config::SceneMode;

/// Final state of a rigid body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidReport {
    /// Net contact force of the last step.
    pub reaction: DVec3,
    /// Moment of `reaction` about the pivot.
    pub moment: DVec3,
    /// Contact force summed over every step.
    pub accumulated_reaction: DVec3,
    pub steps_applied: usize,
    pub displacements: Vec<DVec3>,
}

/// Per-body outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "body", rename_all = "snake_case")]
pub enum BodyResult {
    Deformable(SolveResult),
    Rigid(RigidReport),
}

impl BodyResult {
    pub fn as_deformable(&self) -> Option<&SolveResult> {
        match self {
            Self::Deformable(r) => Some(r),
            Self::Rigid(_) => None,
        }
    }

    pub fn as_rigid(&self) -> Option<&RigidReport> {
        match self {
            Self::Rigid(r) => Some(r),
            Self::Deformable(_) => None,
        }
    }
}

/// Last evaluation of one contact definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactReport {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub active_pairs: u32,
    pub max_penetration: f64,
    pub normal_force: f64,
    pub force_on_a: DVec3,
    pub force_on_b: DVec3,
    pub sticking: u32,
    pub slipping: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneResult {
    pub bodies: Vec<BodyResult>,
    pub contacts: Vec<ContactReport>,
    pub converged: bool,
    pub iterations: u32,
    /// Total kinetic energy of the deformable bodies at the end.
    pub kinetic_energy: f64,
    pub mode: SceneMode,
    pub elapsed_time: f64,
    pub backend: BackendKind,
    pub precision: Precision,
    /// Scene-level deviations (per-body ones live in each `SolveResult`).
    pub warnings: Vec<SolveWarning>,
}

impl SceneResult {
    /// Sum of the last-step reactions of every rigid body.
    pub fn net_rigid_reaction(&self) -> DVec3 {
        self.bodies
            .iter()
            .filter_map(BodyResult::as_rigid)
            .map(|r| r.reaction)
            .sum()
    }
}
