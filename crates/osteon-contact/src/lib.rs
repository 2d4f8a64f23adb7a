//! # osteon-contact
//!
//! Pairwise contact between two bodies' free surfaces, independent of how
//! either body is discretized.
//!
//! ## Pipeline
//!
//! 1. **Surface**: [`ContactSurface`] snapshots a body's boundary points
//!    (current positions, velocities, outward normals, lumped masses).
//! 2. **Detection**: [`detect`] matches each point of surface A with its
//!    nearest point on surface B and keeps pairs inside the gap tolerance.
//! 3. **Response**: a [`ContactResponse`] turns pairs into equal and
//!    opposite nodal forces. [`PenaltyFriction`] is the penalty normal law
//!    with viscous damping and penalty-regularized Coulomb friction.
//!
//! [`ContactPipeline`] chains the three for one [`ContactDefinition`].
//!
//! ## Key Types
//!
//! - [`ContactDefinition`] — Serializable pair definition with optional overrides.
//! - [`ContactParameters`] — Fully resolved penalty, tolerance and friction values.
//! - [`ContactPair`] — One detected point pair.
//! - [`ContactForces`] — Per-point forces on both bodies plus a [`ContactResult`] summary.

pub mod contact;
pub mod definition;
pub mod narrow;
pub mod pipeline;
pub mod response;
pub mod surface;

pub use contact::ContactPair;
pub use definition::{ContactDefinition, ContactParameters};
pub use narrow::detect;
pub use pipeline::ContactPipeline;
pub use response::{ContactForces, ContactResponse, ContactResult, PenaltyFriction};
pub use surface::ContactSurface;
