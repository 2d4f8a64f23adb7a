//! Pluggable event sinks.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::events::{EventKind, SolverEvent};

/// Trait for event consumers.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SolverEvent);

    /// Called at the end of a solve.
    fn finalize(&mut self) {}

    fn name(&self) -> &str;
}

/// Collects events into a shared vector.
///
/// Clones share storage, so a caller can keep one clone for inspection and
/// hand another to the bus.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<SolverEvent>>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SolverEvent>> {
        // A panicking sink cannot leave the Vec in a torn state.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the collected events.
    pub fn events(&self) -> Vec<SolverEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of collected events matching `pred`.
    pub fn count(&self, pred: impl Fn(&EventKind) -> bool) -> usize {
        self.lock().iter().filter(|e| pred(&e.kind)).count()
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SolverEvent) {
        self.lock().push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards events to `tracing`.
pub struct TracingSink {
    level: tracing::Level,
}

impl TracingSink {
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(tracing::Level::DEBUG)
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SolverEvent) {
        // Fallbacks are always worth a warning regardless of the sink level.
        if let EventKind::Fallback { what, detail } = &event.kind {
            tracing::warn!(step = event.step, what = %what, detail = %detail, "fallback");
            return;
        }
        if self.level == tracing::Level::TRACE {
            tracing::trace!(step = event.step, event = ?event.kind, "solver_event");
        } else if self.level == tracing::Level::DEBUG {
            tracing::debug!(step = event.step, event = ?event.kind, "solver_event");
        } else {
            tracing::info!(step = event.step, event = ?event.kind, "solver_event");
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
