//! Benchmark runner: executes scenarios through the request runner and
//! collects metrics.

use std::time::Instant;

use osteon_io::AnalysisResponse;
use osteon_runtime::RuntimeContext;
use osteon_types::OsteonResult;
use tracing::info;

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Run a single scenario on `ctx`.
    ///
    /// Returns the metrics together with the full response.
    pub fn run(ctx: &RuntimeContext, scenario: &Scenario) -> OsteonResult<(BenchmarkMetrics, AnalysisResponse)> {
        let start = Instant::now();
        let response = osteon_io::run(ctx, &scenario.request)?;
        let total_wall_time = start.elapsed().as_secs_f64();

        let deformable: Vec<_> = response.regions.iter().filter_map(|r| r.result.as_deformable()).collect();
        let metrics = BenchmarkMetrics {
            scenario: scenario.kind.name().to_string(),
            point_count: scenario.point_count(),
            total_wall_time,
            iterations: response.summary.iterations,
            converged: response.summary.converged,
            max_displacement: deformable.iter().map(|r| r.max_displacement()).fold(0.0, f64::max),
            max_von_mises: deformable.iter().map(|r| r.max_von_mises()).fold(0.0, f64::max),
            max_damage: deformable.iter().map(|r| r.max_damage()).fold(0.0, f64::max),
            strain_energy: deformable.iter().map(|r| r.strain_energy).sum(),
            contact_force: response.contacts.iter().map(|c| c.normal_force).sum(),
            reference_error: scenario.reference.as_ref().and_then(|r| r.relative_error(&response)),
        };

        info!(
            scenario = %metrics.scenario,
            converged = metrics.converged,
            wall_time = metrics.total_wall_time,
            "benchmark scenario finished"
        );
        Ok((metrics, response))
    }

    /// Run all scenarios and return metrics for each.
    pub fn run_all(ctx: &RuntimeContext) -> OsteonResult<Vec<BenchmarkMetrics>> {
        let mut results = Vec::new();
        for &kind in ScenarioKind::all() {
            let scenario = Scenario::from_kind(kind)?;
            let (metrics, _) = Self::run(ctx, &scenario)?;
            results.push(metrics);
        }
        Ok(results)
    }
}
