//! # osteon-telemetry
//!
//! Event bus for solver telemetry. Solvers and scenes emit structured
//! events (step timing, iterations, energies, contact, convergence,
//! fallbacks) that pluggable sinks consume.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SolverEvent};
pub use sinks::{EventSink, TracingSink, VecSink};
