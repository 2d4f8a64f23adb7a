//! Integration tests for osteon-telemetry.

use osteon_telemetry::{EventBus, EventKind, EventSink, SolverEvent, TracingSink, VecSink};

// ─── Bus Tests ────────────────────────────────────────────────

#[test]
fn events_delivered_on_flush() {
    let sink = VecSink::new();
    let mut bus = EventBus::new().with_sink(Box::new(sink.clone()));
    bus.record(0, EventKind::StepBegin { time: 0.0 });
    bus.record(0, EventKind::Iteration { iteration: 1, residual: 0.5 });
    assert!(sink.is_empty());
    bus.flush();
    assert_eq!(sink.len(), 2);
    assert_eq!(sink.events()[1].kind, EventKind::Iteration { iteration: 1, residual: 0.5 });
}

#[test]
fn disabled_bus_drops_events() {
    let sink = VecSink::new();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink.clone()));
    bus.set_enabled(false);
    bus.emit(SolverEvent::new(3, EventKind::StepEnd { wall_time: 0.1 }));
    bus.flush();
    assert!(sink.is_empty());
    assert!(!bus.is_enabled());
}

#[test]
fn every_sink_sees_every_event() {
    let a = VecSink::new();
    let b = VecSink::new();
    let mut bus = EventBus::new()
        .with_sink(Box::new(a.clone()))
        .with_sink(Box::new(b.clone()))
        .with_sink(Box::new(TracingSink::default()));
    assert_eq!(bus.sink_count(), 3);
    for step in 0..5 {
        bus.record(step, EventKind::Energy { kinetic: 1.0, strain: 2.0, external_work: 3.0 });
    }
    bus.record(
        5,
        EventKind::Fallback { what: "backend".into(), detail: "cuda unavailable".into() },
    );
    bus.finish();
    assert_eq!(a.len(), 6);
    assert_eq!(b.len(), 6);
    assert_eq!(a.count(|k| matches!(k, EventKind::Fallback { .. })), 1);
}

// ─── Sink Tests ───────────────────────────────────────────────

#[test]
fn vec_sink_clones_share_storage() {
    let sink = VecSink::new();
    let mut writer = sink.clone();
    writer.handle(&SolverEvent::new(1, EventKind::Custom { label: "x".into(), payload: "{}".into() }));
    assert_eq!(sink.len(), 1);
    assert_eq!(writer.name(), "vec_sink");
}

#[test]
fn event_serde_round_trip() {
    let event = SolverEvent::new(
        7,
        EventKind::Convergence { iterations: 12, final_residual: 1e-9, converged: true },
    );
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"event\":\"convergence\""));
    let back: SolverEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}
