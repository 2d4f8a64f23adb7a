//! Meshfree Galerkin adapter: reproducing-kernel implicit gradients,
//! nodal integration and pairwise stabilization.

pub mod adapter;
pub mod kernel;

pub use adapter::MeshfreeAdapter;
