//! # osteon-types
//!
//! Shared types, identifiers, error types, and numerical constants
//! for the osteon structural-analysis core.
//!
//! This crate has zero domain logic — it defines the vocabulary
//! that all other osteon crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{OsteonError, OsteonResult};
pub use ids::{AdapterKind, Axis, BodyId};
pub use scalar::Real;
