//! The mechanics-adapter contract.
//!
//! Every discretization (FEM, peridynamics, meshfree Galerkin) implements
//! [`MechanicsAdapter`]. Solvers and scenes drive adapters only through
//! this trait, plus the closed [`AdapterInstance`] enum that owns one of
//! the three concrete adapters.

use osteon_domain::Domain;
use osteon_material::Specialized;
use osteon_math::{DVec3, StressTensor};
use osteon_runtime::RuntimeContext;
use osteon_types::{AdapterKind, OsteonError, OsteonResult};

use crate::config::SolverConfig;
use crate::fem::FemAdapter;
use crate::meshfree::MeshfreeAdapter;
use crate::peridynamics::PeridynamicsAdapter;
use crate::result::{SolveWarning, StepReport};
use crate::state::PointState;

/// How an adapter advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Full equilibrium solve (Newton-Raphson).
    Static,
    /// One pseudo-time step of dynamic relaxation.
    QuasiStatic,
    /// One explicit time step.
    Explicit,
    /// One implicit (Newmark) time step.
    Implicit,
}

/// Uniform interface over the discretizations.
pub trait MechanicsAdapter: Send {
    fn kind(&self) -> AdapterKind;

    /// The domain this adapter was built from.
    fn domain(&self) -> &Domain;

    fn state(&self) -> &PointState;

    fn state_mut(&mut self) -> &mut PointState;

    fn supports(&self, step: StepKind) -> bool;

    /// Largest time step the adapter accepts for `step`, including the
    /// configured safety factor. Pseudo-time steps return `1.0`.
    fn stable_dt(&self, step: StepKind) -> f64;

    /// Advances the adapter once. `index` tags errors and events.
    fn step(&mut self, step: StepKind, dt: f64, index: u32) -> OsteonResult<StepReport>;

    /// Cauchy stress per point.
    fn stress(&self) -> Vec<StressTensor>;

    /// Broken fraction per point. Empty for adapters without bonds.
    fn damage(&self) -> Vec<f64>;

    fn strain_energy(&self) -> f64;

    /// Relative out-of-balance force at the current displacement.
    fn residual(&self) -> f64;

    /// Non-fatal deviations recorded while building the adapter.
    fn warnings(&self) -> &[SolveWarning];

    /// Forgets velocities and integrator history.
    fn reset_dynamics(&mut self);

    /// Replaces the external load. `forces.len()` must equal the point count.
    fn apply_force(&mut self, forces: &[DVec3]) -> OsteonResult<()> {
        let n = self.state().point_count;
        if forces.len() != n {
            return Err(OsteonError::InvalidDomain(format!(
                "force array has {} entries, expected {n}",
                forces.len()
            )));
        }
        if forces.iter().any(|f| !f.is_finite()) {
            return Err(OsteonError::InvalidDomain("non-finite applied force".into()));
        }
        self.state_mut().set_external(forces);
        Ok(())
    }

    /// Adds a contact force to point `i` for the next step. Every
    /// adapter clears injected contact when [`step`](Self::step) returns.
    fn inject_contact(&mut self, i: usize, force: DVec3) {
        self.state_mut().add_contact(i, force);
    }

    fn clear_contact(&mut self) {
        self.state_mut().clear_contact();
    }

    /// Adds contact penalty stiffness acting on point `i`. It raises the
    /// relaxation mass until [`clear_contact_stiffness`](Self::clear_contact_stiffness).
    fn add_contact_stiffness(&mut self, i: usize, stiffness: f64) {
        self.state_mut().contact_stiffness[i] += stiffness;
    }

    fn clear_contact_stiffness(&mut self) {
        self.state_mut().contact_stiffness.fill(0.0);
    }

    fn displacements(&self) -> Vec<DVec3> {
        self.state().displacements()
    }

    fn positions(&self) -> Vec<DVec3> {
        self.state().positions()
    }

    fn kinetic_energy(&self) -> f64 {
        self.state().kinetic_energy()
    }
}

/// One of the concrete adapters.
#[derive(Debug)]
pub enum AdapterInstance {
    Fem(FemAdapter),
    Peridynamics(PeridynamicsAdapter),
    Meshfree(MeshfreeAdapter),
}

macro_rules! delegate {
    ($self:ident, $a:ident => $body:expr) => {
        match $self {
            AdapterInstance::Fem($a) => $body,
            AdapterInstance::Peridynamics($a) => $body,
            AdapterInstance::Meshfree($a) => $body,
        }
    };
}

impl AdapterInstance {
    /// Builds the adapter for `kind`. The domain must match the method:
    /// a mesh for FEM, particles otherwise.
    pub fn build(
        ctx: &RuntimeContext,
        domain: &Domain,
        material: Specialized,
        kind: AdapterKind,
        config: &SolverConfig,
    ) -> OsteonResult<Self> {
        if kind.is_mesh_based() != domain.is_mesh() {
            return Err(OsteonError::InvalidConfig(format!(
                "{} adapter requires a {} domain",
                kind.name(),
                if kind.is_mesh_based() { "mesh" } else { "particle" }
            )));
        }
        Ok(match kind {
            AdapterKind::Fem => Self::Fem(FemAdapter::new(ctx, domain, material, config)?),
            AdapterKind::Peridynamics => {
                Self::Peridynamics(PeridynamicsAdapter::new(ctx, domain, material, config)?)
            }
            AdapterKind::Meshfree => Self::Meshfree(MeshfreeAdapter::new(ctx, domain, material, config)?),
        })
    }

    pub fn as_fem(&self) -> Option<&FemAdapter> {
        match self {
            Self::Fem(a) => Some(a),
            _ => None,
        }
    }
}

impl MechanicsAdapter for AdapterInstance {
    fn kind(&self) -> AdapterKind {
        delegate!(self, a => a.kind())
    }

    fn domain(&self) -> &Domain {
        delegate!(self, a => a.domain())
    }

    fn state(&self) -> &PointState {
        delegate!(self, a => a.state())
    }

    fn state_mut(&mut self) -> &mut PointState {
        delegate!(self, a => a.state_mut())
    }

    fn supports(&self, step: StepKind) -> bool {
        delegate!(self, a => a.supports(step))
    }

    fn stable_dt(&self, step: StepKind) -> f64 {
        delegate!(self, a => a.stable_dt(step))
    }

    fn step(&mut self, step: StepKind, dt: f64, index: u32) -> OsteonResult<StepReport> {
        delegate!(self, a => a.step(step, dt, index))
    }

    fn stress(&self) -> Vec<StressTensor> {
        delegate!(self, a => a.stress())
    }

    fn damage(&self) -> Vec<f64> {
        delegate!(self, a => a.damage())
    }

    fn strain_energy(&self) -> f64 {
        delegate!(self, a => a.strain_energy())
    }

    fn residual(&self) -> f64 {
        delegate!(self, a => a.residual())
    }

    fn warnings(&self) -> &[SolveWarning] {
        delegate!(self, a => a.warnings())
    }

    fn reset_dynamics(&mut self) {
        delegate!(self, a => a.reset_dynamics())
    }
}
