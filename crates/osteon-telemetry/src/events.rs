//! Solver event types.
//!
//! Events are small value types tagged with the step (or iteration) index
//! they were emitted at.

use serde::{Deserialize, Serialize};

/// A solver event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverEvent {
    /// Step or outer-iteration number (0-indexed).
    pub step: u32,
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// Step started.
    StepBegin {
        /// Simulated time at the start of the step (seconds), or the load factor
        /// for load-stepped static solves.
        time: f64,
    },

    /// Step completed.
    StepEnd {
        /// Wall-clock time for the step (seconds).
        wall_time: f64,
    },

    /// One nonlinear iteration.
    Iteration { iteration: u32, residual: f64 },

    /// Energy snapshot.
    Energy {
        kinetic: f64,
        strain: f64,
        external_work: f64,
    },

    /// Contact evaluation for one contact pair.
    Contact {
        pair: u32,
        active_pairs: u32,
        /// Deepest interpenetration between the two surfaces (meters).
        max_penetration: f64,
        normal_force: f64,
    },

    /// Final convergence report.
    Convergence {
        iterations: u32,
        final_residual: f64,
        converged: bool,
    },

    /// A documented fallback was taken (backend, material projection, ...).
    Fallback { what: String, detail: String },

    /// Custom event for extensibility.
    Custom { label: String, payload: String },
}

impl SolverEvent {
    pub fn new(step: u32, kind: EventKind) -> Self {
        Self { step, kind }
    }
}
