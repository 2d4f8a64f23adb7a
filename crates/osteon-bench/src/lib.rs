//! # osteon-bench
//!
//! Verification and benchmark suite for the osteon core.
//!
//! Provides 5 canonical scenarios with analytic references where one
//! exists, metric collection, and CSV export for regression tracking.
//! Every scenario is an ordinary [`osteon_io::AnalysisRequest`], so the
//! suite exercises the same path as external callers.

pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use metrics::BenchmarkMetrics;
pub use runner::BenchmarkRunner;
pub use scenarios::{Reference, Scenario, ScenarioKind};
