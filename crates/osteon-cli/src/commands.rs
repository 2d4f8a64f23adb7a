//! CLI command implementations.

use std::path::Path;

use osteon_bench::metrics::BenchmarkMetrics;
use osteon_bench::runner::BenchmarkRunner;
use osteon_bench::scenarios::{Scenario, ScenarioKind};
use osteon_io::{execute, read_request, to_json, validate_request, write_response, AnalysisResponse};
use osteon_runtime::{BackendRequest, Precision, RuntimeConfig, RuntimeContext};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Solve a request file.
pub fn solve(path: &str, output: Option<&str>, binary: bool, threads: Option<usize>) -> CliResult {
    let mut request = read_request(Path::new(path))?;
    if threads.is_some() {
        request.runtime.threads = threads;
    }

    let response = execute(&request)?;

    match output {
        Some(out) => {
            write_response(Path::new(out), &response, binary)?;
            print_summary(&response);
            println!("Response written to: {out}");
        }
        None => println!("{}", to_json(&response)?),
    }
    Ok(())
}

fn print_summary(response: &AnalysisResponse) {
    let s = &response.summary;
    println!("osteon Solve");
    println!("────────────");
    println!("Backend:    {} ({:?}){}", s.backend.name(), s.precision, if s.fell_back { ", fell back" } else { "" });
    println!("Converged:  {} after {} iterations", s.converged, s.iterations);
    println!("Wall time:  {:.3}s", s.elapsed_time);
    if let Some(mode) = s.mode {
        println!("Scene mode: {mode:?}");
    }
    println!();
    for region in &response.regions {
        match (region.result.as_deformable(), region.result.as_rigid()) {
            (Some(r), _) => println!(
                "  {:<16} {:<13} max |u| {:.4e}  max σvm {:.4e}  max damage {:.3}",
                region.name,
                r.method.name(),
                r.max_displacement(),
                r.max_von_mises(),
                r.max_damage()
            ),
            (None, Some(r)) => println!(
                "  {:<16} {:<13} reaction [{:.4e}, {:.4e}, {:.4e}]",
                region.name, "rigid", r.reaction.x, r.reaction.y, r.reaction.z
            ),
            (None, None) => {}
        }
    }
    for c in &response.contacts {
        println!(
            "  contact {}-{}: {} pairs, normal force {:.4e}, max penetration {:.4e}",
            c.body_a.0, c.body_b.0, c.active_pairs, c.normal_force, c.max_penetration
        );
    }
    println!();
}

/// Run benchmark suite.
pub fn benchmark(scenario_name: &str, output_path: Option<&str>) -> CliResult {
    println!("osteon Benchmark Suite");
    println!("══════════════════════");
    println!();

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        match ScenarioKind::from_name(scenario_name) {
            Some(kind) => vec![kind],
            None => {
                let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
                eprintln!("Unknown scenario: {scenario_name}");
                eprintln!("Available: {}, all", available.join(", "));
                return Err("Unknown scenario".into());
            }
        }
    };

    let ctx = RuntimeContext::init(BackendRequest::Auto, Precision::Double, &RuntimeConfig::default())?;
    let mut all_metrics = Vec::new();

    for &kind in &scenarios {
        let scenario = Scenario::from_kind(kind)?;
        println!("Running: {} ({} points)", kind.name(), scenario.point_count());

        let (metrics, _) = BenchmarkRunner::run(&ctx, &scenario).map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Converged:     {} ({} iterations)", metrics.converged, metrics.iterations);
        println!("  Max displace:  {:.4e}m", metrics.max_displacement);
        if let Some(err) = metrics.reference_error {
            println!("  Ref. error:    {:.3}%", err * 100.0);
        }
        println!();

        all_metrics.push(metrics);
    }

    if let Some(path) = output_path {
        let csv = BenchmarkMetrics::to_csv(&all_metrics);
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{}", BenchmarkMetrics::to_csv(&all_metrics));
    }

    Ok(())
}

/// Validate a request file.
pub fn validate(path: &str) -> CliResult {
    println!("osteon Request Validator");
    println!("────────────────────────");
    println!("File: {path}");

    let request = read_request(Path::new(path))?;
    validate_request(&request)?;

    println!("Regions:  {}", request.regions.len());
    for region in &request.regions {
        let method = if region.is_rigid() { "rigid" } else { request.method_of(region).name() };
        println!("  {:<16} {:<13} {} boundary conditions", region.name, method, region.boundary_conditions.len());
    }
    match &request.scene {
        Some(scene) => println!("Scene:    {:?}, {} contacts", scene.config.mode, scene.contacts.len()),
        None => println!("Scene:    none (regions solved independently)"),
    }
    println!();
    println!("✓ Request is valid");
    Ok(())
}

/// Probe the compute backends.
pub fn backends() -> CliResult {
    println!("osteon Backends");
    println!("───────────────");

    let ctx = RuntimeContext::init(BackendRequest::Auto, Precision::Double, &RuntimeConfig::default())?;
    for outcome in ctx.probe_report() {
        let status = if outcome.available { "available" } else { "unavailable" };
        println!("  {:<6} {:<12} {}", outcome.backend.name(), status, outcome.detail);
    }
    println!();
    println!("Committed: {} with {} threads", ctx.backend().name(), ctx.threads());
    Ok(())
}
