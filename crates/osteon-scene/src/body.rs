//! Bodies owned by a scene.

use osteon_contact::ContactSurface;
use osteon_domain::Domain;
use osteon_material::Material;
use osteon_math::DVec3;
use osteon_runtime::RuntimeContext;
use osteon_solver::{AdapterInstance, MechanicsAdapter, Solver, SolverConfig};
use osteon_types::{AdapterKind, OsteonResult};

use crate::rigid::RigidBody;

/// A body discretized by one of the mechanics adapters.
#[derive(Debug)]
pub struct DeformableBody {
    solver: Solver,
    boundary: Vec<usize>,
    youngs_modulus: f64,
}

impl DeformableBody {
    pub fn new(
        ctx: &RuntimeContext,
        domain: &Domain,
        material: &Material,
        kind: AdapterKind,
        config: SolverConfig,
    ) -> OsteonResult<Self> {
        let solver = Solver::new(ctx, domain, material, kind, config)?;
        Ok(Self {
            boundary: domain.select_boundary(),
            youngs_modulus: material.youngs_modulus,
            solver,
        })
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn adapter(&self) -> &AdapterInstance {
        self.solver.adapter()
    }

    pub fn adapter_mut(&mut self) -> &mut AdapterInstance {
        self.solver.adapter_mut()
    }

    /// Free-surface points used for contact.
    pub fn boundary(&self) -> &[usize] {
        &self.boundary
    }

    pub fn youngs_modulus(&self) -> f64 {
        self.youngs_modulus
    }
}

/// One participant of a scene.
#[derive(Debug)]
pub enum SceneBody {
    Deformable(Box<DeformableBody>),
    Rigid(Box<RigidBody>),
}

impl SceneBody {
    pub fn domain(&self) -> &Domain {
        match self {
            Self::Deformable(b) => b.adapter().domain(),
            Self::Rigid(r) => r.domain(),
        }
    }

    /// Discretization method, `None` for rigid bodies.
    pub fn method(&self) -> Option<AdapterKind> {
        match self {
            Self::Deformable(b) => Some(b.adapter().kind()),
            Self::Rigid(_) => None,
        }
    }

    /// Young's modulus, `None` for rigid bodies.
    pub fn modulus(&self) -> Option<f64> {
        match self {
            Self::Deformable(b) => Some(b.youngs_modulus()),
            Self::Rigid(_) => None,
        }
    }

    /// Whether the body carries a Dirichlet condition.
    pub fn has_constraint(&self) -> bool {
        self.domain().has_constraint()
    }

    pub fn as_deformable(&self) -> Option<&DeformableBody> {
        match self {
            Self::Deformable(b) => Some(b),
            Self::Rigid(_) => None,
        }
    }

    pub fn as_deformable_mut(&mut self) -> Option<&mut DeformableBody> {
        match self {
            Self::Deformable(b) => Some(b),
            Self::Rigid(_) => None,
        }
    }

    pub fn as_rigid(&self) -> Option<&RigidBody> {
        match self {
            Self::Rigid(r) => Some(r),
            Self::Deformable(_) => None,
        }
    }

    pub fn as_rigid_mut(&mut self) -> Option<&mut RigidBody> {
        match self {
            Self::Rigid(r) => Some(r),
            Self::Deformable(_) => None,
        }
    }

    /// Boundary snapshot at the current configuration.
    pub fn surface(&self) -> ContactSurface {
        match self {
            Self::Deformable(b) => {
                let state = b.adapter().state();
                ContactSurface::new(
                    b.adapter().domain(),
                    b.boundary.clone(),
                    &state.positions(),
                    &state.velocities(),
                    Some(&state.mass),
                )
            }
            Self::Rigid(r) => ContactSurface::new(r.domain(), r.boundary().to_vec(), r.positions(), r.velocities(), None),
        }
    }

    /// Forgets last step's contact forces.
    pub fn clear_contact(&mut self) {
        match self {
            Self::Deformable(b) => b.adapter_mut().clear_contact(),
            Self::Rigid(r) => r.begin_step(),
        }
    }

    /// Hands contact forces to the body: injected into a deformable body,
    /// tallied as reaction on a rigid one.
    pub fn apply_contact(&mut self, forces: &[(usize, DVec3)]) {
        match self {
            Self::Deformable(b) => {
                let adapter = b.adapter_mut();
                for &(i, f) in forces {
                    adapter.inject_contact(i, f);
                }
            }
            Self::Rigid(r) => r.apply_reaction(forces),
        }
    }
}
