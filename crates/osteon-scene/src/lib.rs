//! # osteon-scene
//!
//! Multi-body analysis: any mix of FEM, peridynamics, meshfree and rigid
//! bodies coupled by penalty contact with friction.
//!
//! ## Modes
//!
//! - **static**: two mesh-based bodies, staggered Newton solves with
//!   relaxed contact forces until the forces stop changing.
//! - **quasi_static** (default): every body relaxes together while the
//!   contacts are recomputed each iteration; converges on kinetic energy
//!   and residual.
//! - **explicit**: lock-step time marching for a fixed step count.
//!
//! ## Key Types
//!
//! - [`Scene`] — Owns the bodies and contact definitions, runs a mode.
//! - [`RigidBody`] — Prescribed rotation + translation schedule, collects reactions.
//! - [`SceneConfig`] — Mode, iteration caps, tolerances, contact tuning.
//! - [`SceneResult`] — Per-body results, rigid reactions, contact reports.

pub mod body;
pub mod config;
pub mod result;
pub mod rigid;
pub mod scene;

pub use body::{DeformableBody, SceneBody};
pub use config::{SceneConfig, SceneMode};
pub use result::{BodyResult, ContactReport, RigidReport, SceneResult};
pub use rigid::{RigidBody, RigidMotion};
pub use scene::Scene;
