//! Integration tests for osteon-bench.

use osteon_bench::metrics::BenchmarkMetrics;
use osteon_bench::runner::BenchmarkRunner;
use osteon_bench::scenarios::{Scenario, ScenarioKind};
use osteon_io::validate_request;
use osteon_runtime::RuntimeContext;
use osteon_types::{AdapterKind, Axis};

// ─── Scenario Tests ───────────────────────────────────────────

#[test]
fn uniaxial_bar_setup() {
    let s = Scenario::uniaxial_bar().unwrap();
    assert_eq!(s.kind, ScenarioKind::UniaxialBar);
    assert_eq!(s.point_count(), 9 * 5 * 5);
    assert_eq!(s.request.method, AdapterKind::Fem);
    let reference = s.reference.unwrap();
    assert_eq!(reference.axis, Axis::X);
    assert_eq!(reference.points.len(), 25);
    assert!((reference.expected - 2.0e-4).abs() < 1e-15);
}

#[test]
fn contact_press_setup() {
    let s = Scenario::contact_press().unwrap();
    assert_eq!(s.request.regions.len(), 2);
    assert!(s.request.regions[1].is_rigid());
    let scene = s.request.scene.as_ref().unwrap();
    assert_eq!(scene.contacts.len(), 1);
    assert!(s.reference.is_none());
}

#[test]
fn all_scenarios() {
    assert_eq!(ScenarioKind::all().len(), 5);
    for &kind in ScenarioKind::all() {
        assert_eq!(ScenarioKind::from_name(kind.name()), Some(kind));
        let scenario = Scenario::from_kind(kind).unwrap();
        assert_eq!(scenario.kind, kind);
        validate_request(&scenario.request).unwrap();
    }
    assert_eq!(ScenarioKind::from_name("hanging_sheet"), None);
}

// ─── Runner Tests ─────────────────────────────────────────────

#[test]
fn run_uniaxial_bar() {
    let ctx = RuntimeContext::cpu();
    let (metrics, _) = BenchmarkRunner::run(&ctx, &Scenario::uniaxial_bar().unwrap()).unwrap();
    assert_eq!(metrics.scenario, "uniaxial_bar");
    assert!(metrics.converged);
    assert!(metrics.total_wall_time > 0.0);
    assert!(metrics.strain_energy > 0.0);
    assert_eq!(metrics.max_damage, 0.0);
    let err = metrics.reference_error.unwrap();
    assert!(err.abs() < 0.02, "relative error {err}");
}

#[test]
fn run_neo_hookean_bar() {
    let ctx = RuntimeContext::cpu();
    let (metrics, response) = BenchmarkRunner::run(&ctx, &Scenario::neo_hookean_bar().unwrap()).unwrap();
    assert!(metrics.converged);
    let err = metrics.reference_error.unwrap();
    assert!(err.abs() < 0.02, "relative error {err}");
    let bar = response.regions[0].result.as_deformable().unwrap();
    assert!(bar.warnings.is_empty(), "FEM keeps the hyperelastic model: {:?}", bar.warnings);
}

#[test]
fn run_peridynamic_fracture() {
    let ctx = RuntimeContext::cpu();
    let mut scenario = Scenario::peridynamic_fracture().unwrap();
    scenario.request.solver.steps = 60;
    let (metrics, response) = BenchmarkRunner::run(&ctx, &scenario).unwrap();
    assert_eq!(metrics.iterations, 60);
    assert!(metrics.max_damage > 0.0);
    let bar = response.regions[0].result.as_deformable().unwrap();
    assert!(bar.damage.iter().all(|d| (0.0..=1.0).contains(d)));
    assert!(bar.displacements.iter().all(|u| u.is_finite()));
}

#[test]
fn run_meshfree_compression() {
    let ctx = RuntimeContext::cpu();
    let (metrics, _) = BenchmarkRunner::run(&ctx, &Scenario::meshfree_compression().unwrap()).unwrap();
    assert!(metrics.converged);
    let err = metrics.reference_error.unwrap();
    assert!(err.abs() < 0.3, "relative error {err}");
}

#[test]
fn run_contact_press() {
    let ctx = RuntimeContext::cpu();
    let (metrics, response) = BenchmarkRunner::run(&ctx, &Scenario::contact_press().unwrap()).unwrap();
    assert!(metrics.converged);
    assert!(metrics.contact_force > 0.0);
    assert!(metrics.reference_error.is_none());
    let plate = response.region("plate").unwrap().result.as_rigid().unwrap();
    assert!(plate.reaction.z > 0.0);
}

// ─── Metrics Tests ────────────────────────────────────────────

fn sample(reference_error: Option<f64>) -> BenchmarkMetrics {
    BenchmarkMetrics {
        scenario: "uniaxial_bar".into(),
        point_count: 225,
        total_wall_time: 0.5,
        iterations: 1,
        converged: true,
        max_displacement: 2.0e-4,
        max_von_mises: 100.0,
        max_damage: 0.0,
        strain_energy: 0.01,
        contact_force: 0.0,
        reference_error,
    }
}

#[test]
fn csv_format() {
    let csv = BenchmarkMetrics::to_csv(&[sample(Some(1e-3)), sample(None)]);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    let columns = lines[0].split(',').count();
    assert!(lines.iter().all(|l| l.split(',').count() == columns));
    assert!(lines[1].starts_with("uniaxial_bar,225,1,true,"));
    assert!(lines[2].ends_with(','));
}

#[test]
fn metrics_json_round_trip() {
    let json = serde_json::to_string(&sample(None)).unwrap();
    let recovered: BenchmarkMetrics = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered.point_count, 225);
    assert!(recovered.reference_error.is_none());
}
