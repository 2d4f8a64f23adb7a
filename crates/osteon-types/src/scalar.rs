//! Scalar type alias for the analysis core.
//!
//! Structural analysis needs double precision for the assembled stiffness
//! systems. Reduced precision is a runtime setting (see `osteon-runtime`)
//! applied when state is written back, not a compile-time switch.

/// The floating-point type used throughout the core.
pub type Real = f64;
