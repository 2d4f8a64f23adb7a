//! # osteon-solver
//!
//! Mechanics adapters and the single-body solver.
//!
//! ## Key Types
//!
//! - [`PointState`] — SoA buffers for displacements, velocities, loads, masses
//! - [`MechanicsAdapter`] — uniform contract over the discretizations
//! - [`AdapterInstance`] — closed enum owning one concrete adapter
//! - [`FemAdapter`] — Tet4/Hex8/Tri3/Quad4 finite elements
//! - [`PeridynamicsAdapter`] — correspondence peridynamics with bond breakage
//! - [`MeshfreeAdapter`] — stabilized nodally integrated meshfree Galerkin
//! - [`Solver`] — binds domain and material to an adapter, returns a [`SolveResult`]

pub mod adapter;
pub mod config;
pub mod family;
pub mod fem;
pub mod measure;
pub mod meshfree;
pub mod peridynamics;
pub mod relaxation;
pub mod result;
pub mod solver;
pub mod state;

pub use adapter::{AdapterInstance, MechanicsAdapter, StepKind};
pub use config::{
    AnalysisType, FemConfig, Integrator, MeshfreeConfig, PeridynamicsConfig, SolverConfig, StressMeasure,
};
pub use fem::FemAdapter;
pub use meshfree::MeshfreeAdapter;
pub use peridynamics::PeridynamicsAdapter;
pub use result::{SolveResult, SolveWarning, StepReport};
pub use solver::Solver;
pub use state::PointState;
