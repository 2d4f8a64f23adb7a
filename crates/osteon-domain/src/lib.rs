//! # osteon-domain
//!
//! Discretized geometry consumed by every adapter.
//!
//! A [`Domain`] is either a node/element mesh (FEM) or a particle cloud with
//! per-particle volumes (peridynamics, meshfree). Topology is fixed at
//! construction; only the boundary-condition list mutates afterwards.
//!
//! Point data is stored in Structure-of-Arrays layout (`pos_x`, `pos_y`,
//! `pos_z`) so that per-point kernels read contiguous channels.

pub mod boundary;
pub mod domain;
pub mod element;
pub mod generators;
pub mod spatial_hash;

pub use boundary::{BoundaryCondition, BoundaryKind};
pub use domain::{BoundaryFace, Domain, Geometry, Mesh, ParticleCloud, Spacing};
pub use element::ElementKind;
pub use spatial_hash::SpatialHash;
