//! Integration tests for osteon-solver.

use osteon_domain::generators::{box_hex_mesh, box_tet_mesh, particle_box, rect_quad_mesh};
use osteon_domain::Domain;
use osteon_material::{specialize, LinearElasticLaw, Material};
use osteon_math::{DMat3, DVec3, StressTensor};
use osteon_runtime::{BackendKind, BackendRequest, Precision, RuntimeConfig, RuntimeContext};
use osteon_solver::{
    AdapterInstance, AnalysisType, Integrator, MechanicsAdapter, SolveWarning, Solver, SolverConfig, StepKind,
};
use osteon_telemetry::{EventBus, EventKind, VecSink};
use osteon_types::{AdapterKind, Axis, OsteonError};

const E: f64 = 1.0e6;
const NU: f64 = 0.3;
const LOAD: f64 = 100.0;

fn steel_like() -> Material {
    Material::linear_elastic(E, NU, 1000.0)
}

fn mean_axis(values: &[DVec3], indices: &[usize], axis: usize) -> f64 {
    indices.iter().map(|&i| values[i][axis]).sum::<f64>() / indices.len() as f64
}

/// Symmetry rollers on the three minimum faces, uniform load on the top.
fn with_rollers(mut domain: Domain, min: DVec3, top: f64) -> (Domain, Vec<usize>) {
    let x0 = domain.select(Axis::X, min.x, 1e-9);
    let y0 = domain.select(Axis::Y, min.y, 1e-9);
    let z0 = domain.select(Axis::Z, min.z, 1e-9);
    domain.set_fixed_axes(&x0, [true, false, false]).unwrap();
    domain.set_fixed_axes(&y0, [false, true, false]).unwrap();
    domain.set_fixed_axes(&z0, [false, false, true]).unwrap();
    let loaded = domain.select(Axis::Z, top, 1e-9);
    domain.set_force(&loaded, DVec3::new(0.0, 0.0, LOAD)).unwrap();
    (domain, loaded)
}

fn roller_cube(n: usize) -> (Domain, Vec<usize>) {
    let domain = box_hex_mesh(n, n, n, DVec3::ZERO, DVec3::ONE).unwrap();
    with_rollers(domain, DVec3::ZERO, 1.0)
}

fn solve(domain: &Domain, material: &Material, kind: AdapterKind, config: SolverConfig) -> osteon_solver::SolveResult {
    let ctx = RuntimeContext::cpu();
    Solver::new(&ctx, domain, material, kind, config).unwrap().solve().unwrap()
}

// ─── FEM Static Tests ─────────────────────────────────────────

#[test]
fn fem_unit_cube_matches_bar_formula() {
    // Rollers leave lateral contraction free, so the cube is a uniaxial bar.
    let (domain, top) = roller_cube(4);
    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());

    let expected = LOAD * 1.0 / (E * 1.0);
    let uz = mean_axis(&result.displacements, &top, 2);
    assert!(result.converged);
    assert!(((uz - expected) / expected).abs() < 0.02, "uz={uz}, expected={expected}");
    // Uniaxial stress is reproduced exactly by trilinear elements.
    assert!(((uz - expected) / expected).abs() < 1e-6);
}

#[test]
fn fem_linear_static_takes_one_iteration() {
    let (domain, _) = roller_cube(3);
    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());
    assert!(result.converged);
    assert_eq!(result.iterations, 1);
    assert!(result.final_residual < 1e-8);
    assert!(result.damage.is_empty());
}

#[test]
fn fem_clamped_cube_is_stiffer_than_bar() {
    let mut domain = box_hex_mesh(4, 4, 4, DVec3::ZERO, DVec3::ONE).unwrap();
    let bottom = domain.select(Axis::Z, 0.0, 1e-9);
    let top = domain.select(Axis::Z, 1.0, 1e-9);
    domain.set_fixed(&bottom).unwrap();
    domain.set_force(&top, DVec3::new(0.0, 0.0, LOAD)).unwrap();

    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());
    let uz = mean_axis(&result.displacements, &top, 2);
    let bar = LOAD / E;
    assert!(uz < bar && uz > 0.74 * bar, "uz={uz}");
}

#[test]
fn fem_tet_mesh_matches_bar_formula() {
    let domain = box_tet_mesh(3, 3, 3, DVec3::ZERO, DVec3::ONE).unwrap();
    let (domain, top) = with_rollers(domain, DVec3::ZERO, 1.0);
    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());
    let uz = mean_axis(&result.displacements, &top, 2);
    assert!(((uz - LOAD / E) / (LOAD / E)).abs() < 1e-6, "uz={uz}");
}

#[test]
fn fem_uniform_stress_recovered_at_every_node() {
    let (domain, _) = roller_cube(3);
    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());
    for s in &result.stress {
        assert!((s.0[2] - LOAD).abs() < 1e-6 * LOAD, "szz={}", s.0[2]);
        assert!(s.0[0].abs() < 1e-6 * LOAD);
        assert!((s.von_mises() - LOAD).abs() < 1e-6 * LOAD);
    }
}

#[test]
fn fem_strain_energy_matches_bar_and_grows_with_refinement() {
    let (domain, _) = roller_cube(2);
    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());
    let analytic = LOAD * LOAD * 1.0 / (2.0 * E * 1.0);
    assert!(((result.strain_energy - analytic) / analytic).abs() < 0.02);

    let clamped_energy = |n: usize| {
        let mut domain = box_hex_mesh(n, n, 2 * n, DVec3::ZERO, DVec3::new(1.0, 1.0, 2.0)).unwrap();
        let bottom = domain.select(Axis::Z, 0.0, 1e-9);
        let top = domain.select(Axis::Z, 2.0, 1e-9);
        domain.set_fixed(&bottom).unwrap();
        domain.set_force(&top, DVec3::new(0.0, 0.0, LOAD)).unwrap();
        solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default()).strain_energy
    };
    let coarse = clamped_energy(1);
    let mid = clamped_energy(2);
    let fine = clamped_energy(4);
    assert!(coarse <= mid * (1.0 + 1e-12), "{coarse} > {mid}");
    assert!(mid <= fine * (1.0 + 1e-12), "{mid} > {fine}");
    let bar = LOAD * LOAD * 2.0 / (2.0 * E);
    assert!(fine < bar);
}

#[test]
fn fem_plane_strain_quad() {
    let mut domain = rect_quad_mesh(4, 4, 1.0, 1.0).unwrap();
    let left = domain.select(Axis::X, 0.0, 1e-9);
    let bottom = domain.select(Axis::Y, 0.0, 1e-9);
    let top = domain.select(Axis::Y, 1.0, 1e-9);
    domain.set_fixed_axes(&left, [true, false, false]).unwrap();
    domain.set_fixed_axes(&bottom, [false, true, false]).unwrap();
    domain.set_force(&top, DVec3::new(0.0, LOAD, 0.0)).unwrap();

    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());
    let uy = mean_axis(&result.displacements, &top, 1);
    let expected = LOAD * (1.0 - NU * NU) / E;
    assert!(((uy - expected) / expected).abs() < 1e-6, "uy={uy}, expected={expected}");
    assert!(result.displacements.iter().all(|u| u.z == 0.0));
}

#[test]
fn fem_neo_hookean_small_load_matches_linear() {
    let (domain, top) = roller_cube(2);
    let linear = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());
    let hyper = solve(&domain, &Material::neo_hookean(E, NU, 1000.0), AdapterKind::Fem, SolverConfig::default());

    assert!(hyper.converged);
    assert!(hyper.iterations >= 2);
    assert!(hyper.warnings.is_empty());
    let ul = mean_axis(&linear.displacements, &top, 2);
    let uh = mean_axis(&hyper.displacements, &top, 2);
    assert!(((uh - ul) / ul).abs() < 0.01, "linear={ul}, neo-hookean={uh}");
}

#[test]
fn fem_load_steps_reach_same_equilibrium() {
    let (domain, top) = roller_cube(2);
    let material = Material::mooney_rivlin(E, NU, 1000.0, 0.5);
    let one = solve(&domain, &material, AdapterKind::Fem, SolverConfig::default());
    let ten = solve(&domain, &material, AdapterKind::Fem, SolverConfig::high_quality());
    let a = mean_axis(&one.displacements, &top, 2);
    let b = mean_axis(&ten.displacements, &top, 2);
    assert!(((a - b) / a).abs() < 1e-6);
}

#[test]
fn fem_unconstrained_body_gets_soft_springs() {
    let mut domain = box_hex_mesh(2, 2, 2, DVec3::ZERO, DVec3::ONE).unwrap();
    let top = domain.select(Axis::Z, 1.0, 1e-9);
    let bottom = domain.select(Axis::Z, 0.0, 1e-9);
    domain.set_force(&top, DVec3::new(0.0, 0.0, LOAD)).unwrap();
    domain.set_force(&bottom, DVec3::new(0.0, 0.0, -LOAD)).unwrap();

    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());
    assert!(result.warnings.contains(&SolveWarning::SoftSprings));
    assert!(result.converged);
    let stretch = mean_axis(&result.displacements, &top, 2) - mean_axis(&result.displacements, &bottom, 2);
    assert!(((stretch - LOAD / E) / (LOAD / E)).abs() < 1e-3, "stretch={stretch}");
}

// ─── FEM Dynamic Tests ────────────────────────────────────────

#[test]
fn fem_natural_frequencies_scale_with_stiffness() {
    let mut domain = box_hex_mesh(2, 2, 2, DVec3::ZERO, DVec3::ONE).unwrap();
    let bottom = domain.select(Axis::Z, 0.0, 1e-9);
    domain.set_fixed(&bottom).unwrap();
    let ctx = RuntimeContext::cpu();

    let soft = Solver::new(&ctx, &domain, &steel_like(), AdapterKind::Fem, SolverConfig::default()).unwrap();
    let stiff = Solver::new(
        &ctx,
        &domain,
        &Material::linear_elastic(2.0 * E, NU, 1000.0),
        AdapterKind::Fem,
        SolverConfig::default(),
    )
    .unwrap();
    let f1 = soft.natural_frequencies(3).unwrap();
    let f2 = stiff.natural_frequencies(3).unwrap();
    assert_eq!(f1.len(), 3);
    assert!(f1[0] > 0.0);
    assert!(f1.windows(2).all(|w| w[0] <= w[1]));
    for (a, b) in f1.iter().zip(&f2) {
        assert!((b / a - 2.0_f64.sqrt()).abs() < 1e-6);
    }
}

#[test]
fn fem_modal_dof_cap_is_enforced() {
    let (domain, _) = roller_cube(3);
    let mut config = SolverConfig::default();
    config.fem.max_modal_dofs = 10;
    let ctx = RuntimeContext::cpu();
    let solver = Solver::new(&ctx, &domain, &steel_like(), AdapterKind::Fem, config).unwrap();
    assert!(matches!(solver.natural_frequencies(2), Err(OsteonError::InvalidConfig(_))));
}

#[test]
fn fem_central_difference_step_load_overshoot() {
    let (domain, top) = roller_cube(3);
    let ctx = RuntimeContext::cpu();
    let config = SolverConfig::dynamic(Integrator::CentralDifference, 400);
    let material = specialize(&steel_like(), AdapterKind::Fem).unwrap();
    let mut adapter = AdapterInstance::build(&ctx, &domain, material, AdapterKind::Fem, &config).unwrap();
    let dt = adapter.stable_dt(StepKind::Explicit);
    assert!(dt.is_finite() && dt > 0.0);

    let stat = LOAD / E;
    let mut peak: f64 = 0.0;
    for step in 0..400 {
        adapter.step(StepKind::Explicit, dt, step).unwrap();
        peak = peak.max(mean_axis(&adapter.displacements(), &top, 2));
    }
    assert!(peak > 1.6 * stat && peak < 2.2 * stat, "peak={peak}, static={stat}");
}

#[test]
fn fem_damped_newmark_settles_to_static() {
    let (domain, top) = roller_cube(2);
    let ctx = RuntimeContext::cpu();
    let probe = Solver::new(&ctx, &domain, &steel_like(), AdapterKind::Fem, SolverConfig::default()).unwrap();
    let f1 = probe.natural_frequencies(1).unwrap()[0];
    let omega = 2.0 * std::f64::consts::PI * f1;

    let mut config = SolverConfig::dynamic(Integrator::Newmark, 400);
    config.dt = Some(1.0 / (20.0 * f1));
    config.fem.rayleigh_alpha = 2.0 * omega;
    let result = solve(&domain, &steel_like(), AdapterKind::Fem, config);

    assert_eq!(result.analysis, AnalysisType::Dynamic);
    assert_eq!(result.iterations, 400);
    let uz = mean_axis(&result.displacements, &top, 2);
    assert!(((uz - LOAD / E) / (LOAD / E)).abs() < 0.01, "uz={uz}");
}

#[test]
fn fem_explicit_time_step_is_clamped() {
    let (domain, _) = roller_cube(2);
    let mut config = SolverConfig::dynamic(Integrator::CentralDifference, 5);
    config.dt = Some(1.0);
    let result = solve(&domain, &steel_like(), AdapterKind::Fem, config);
    assert!(result
        .warnings
        .iter()
        .any(|w| matches!(w, SolveWarning::TimeStepClamped { requested, .. } if *requested == 1.0)));
}

#[test]
fn fem_quasi_static_relaxation_converges() {
    let (domain, top) = roller_cube(3);
    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::quasi_static());
    assert!(result.converged, "residual={}", result.final_residual);
    let uz = mean_axis(&result.displacements, &top, 2);
    assert!(((uz - LOAD / E) / (LOAD / E)).abs() < 0.01, "uz={uz}");
}

// ─── Solver Contract Tests ────────────────────────────────────

#[test]
fn method_must_match_domain() {
    let ctx = RuntimeContext::cpu();
    let mesh = box_hex_mesh(1, 1, 1, DVec3::ZERO, DVec3::ONE).unwrap();
    let cloud = particle_box(3, 3, 3, DVec3::ZERO, DVec3::ONE).unwrap();
    let cfg = SolverConfig::default;
    assert!(matches!(
        Solver::new(&ctx, &cloud, &steel_like(), AdapterKind::Fem, cfg()),
        Err(OsteonError::InvalidConfig(_))
    ));
    assert!(matches!(
        Solver::new(&ctx, &mesh, &steel_like(), AdapterKind::Peridynamics, cfg()),
        Err(OsteonError::InvalidConfig(_))
    ));
    assert!(matches!(
        Solver::new(&ctx, &mesh, &steel_like(), AdapterKind::Meshfree, cfg()),
        Err(OsteonError::InvalidConfig(_))
    ));
}

#[test]
fn invalid_config_rejected() {
    let ctx = RuntimeContext::cpu();
    let (domain, _) = roller_cube(1);
    let config = SolverConfig { cfl: 1.5, ..Default::default() };
    assert!(matches!(
        Solver::new(&ctx, &domain, &steel_like(), AdapterKind::Fem, config),
        Err(OsteonError::InvalidConfig(_))
    ));
}

#[test]
fn solves_are_deterministic() {
    let (domain, _) = roller_cube(3);
    let material = Material::neo_hookean(E, NU, 1000.0);
    let a = solve(&domain, &material, AdapterKind::Fem, SolverConfig::default());
    let b = solve(&domain, &material, AdapterKind::Fem, SolverConfig::default());
    assert_eq!(a.displacements, b.displacements);
    assert_eq!(a.iterations, b.iterations);
}

#[test]
fn single_precision_rounds_results() {
    let ctx = RuntimeContext::init(BackendRequest::Auto, Precision::Single, &RuntimeConfig::default()).unwrap();
    let (domain, _) = roller_cube(2);
    let result = Solver::new(&ctx, &domain, &steel_like(), AdapterKind::Fem, SolverConfig::default())
        .unwrap()
        .solve()
        .unwrap();
    assert_eq!(result.precision, Precision::Single);
    for u in &result.displacements {
        for a in 0..3 {
            assert_eq!(u[a], u[a] as f32 as f64);
        }
    }
}

#[test]
fn gpu_request_on_cpu_host_warns_fallback() {
    let (domain, _) = roller_cube(1);
    let ctx = RuntimeContext::init(
        BackendRequest::Prefer(BackendKind::Cuda),
        Precision::Double,
        &RuntimeConfig::default(),
    )
    .unwrap();
    let result = Solver::new(&ctx, &domain, &steel_like(), AdapterKind::Fem, SolverConfig::default())
        .unwrap()
        .solve()
        .unwrap();
    assert!(result.warnings.iter().any(|w| matches!(
        w,
        SolveWarning::BackendFallback { requested: BackendKind::Cuda, used: BackendKind::Cpu }
    )));

    let auto = RuntimeContext::init(BackendRequest::Auto, Precision::Double, &RuntimeConfig::default()).unwrap();
    let result = Solver::new(&auto, &domain, &steel_like(), AdapterKind::Fem, SolverConfig::default())
        .unwrap()
        .solve()
        .unwrap();
    assert!(!result.warnings.iter().any(|w| matches!(w, SolveWarning::BackendFallback { .. })));
}

#[test]
fn injected_contact_lasts_one_step() {
    let ctx = RuntimeContext::cpu();
    let config = SolverConfig::default();
    let mut block = box_hex_mesh(2, 2, 2, DVec3::ZERO, DVec3::ONE).unwrap();
    let bottom = block.select(Axis::Z, 0.0, 1e-9);
    block.set_fixed(&bottom).unwrap();
    let (bar, _) = particle_bar();

    for (domain, kind) in [
        (&block, AdapterKind::Fem),
        (&bar, AdapterKind::Peridynamics),
        (&bar, AdapterKind::Meshfree),
    ] {
        let material = specialize(&steel_like(), kind).unwrap();
        let mut adapter = AdapterInstance::build(&ctx, domain, material, kind, &config).unwrap();
        let free = domain.fixed_mask().iter().position(|axes| !axes.iter().any(|&a| a)).unwrap();
        let push = DVec3::new(0.0, 0.0, 5.0);

        adapter.inject_contact(free, push);
        assert_eq!(adapter.state().applied(free), adapter.state().external(free) + push);
        let dt = adapter.stable_dt(StepKind::Explicit);
        adapter.step(StepKind::Explicit, dt, 0).unwrap();

        assert_eq!(adapter.state().contact(free), DVec3::ZERO, "{kind:?}");
        assert_eq!(adapter.state().applied(free), adapter.state().external(free), "{kind:?}");
        assert!(adapter.state().velocity(free).z > 0.0, "{kind:?}: contact was not applied");
    }
}

#[test]
fn cancelled_solve_reports_step() {
    let ctx = RuntimeContext::cpu();
    ctx.cancel_token().cancel();
    let (domain, _) = roller_cube(1);
    let mut solver = Solver::new(&ctx, &domain, &steel_like(), AdapterKind::Fem, SolverConfig::default()).unwrap();
    assert!(matches!(solver.solve(), Err(OsteonError::Cancelled { step: 0 })));
}

#[test]
fn non_finite_state_aborts_with_step() {
    let (domain, _) = roller_cube(2);
    let ctx = RuntimeContext::cpu();
    let config = SolverConfig::default();
    let material = specialize(&steel_like(), AdapterKind::Fem).unwrap();
    let mut adapter = AdapterInstance::build(&ctx, &domain, material, AdapterKind::Fem, &config).unwrap();
    let free = domain.select(Axis::Z, 1.0, 1e-9)[0];
    adapter.state_mut().disp_z[free] = f64::NAN;
    let err = adapter.step(StepKind::QuasiStatic, 1.0, 7).unwrap_err();
    assert!(matches!(err, OsteonError::NonFinite { step: 7, .. }), "{err:?}");
}

#[test]
fn telemetry_receives_convergence() {
    let (domain, _) = roller_cube(2);
    let sink = VecSink::new();
    let ctx = RuntimeContext::cpu();
    let mut solver = Solver::new(&ctx, &domain, &steel_like(), AdapterKind::Fem, SolverConfig::default())
        .unwrap()
        .with_telemetry(EventBus::new().with_sink(Box::new(sink.clone())));
    solver.solve().unwrap();
    assert_eq!(sink.count(|k| matches!(k, EventKind::Convergence { converged: true, .. })), 1);
    assert!(sink.count(|k| matches!(k, EventKind::Iteration { .. })) >= 1);
}

#[test]
fn config_accepts_partial_toml() {
    let config: SolverConfig = toml::from_str(
        r#"
        analysis = "quasi_static"
        relaxation_tolerance = 1e-4

        [peridynamics]
        critical_stretch = 0.02
        "#,
    )
    .unwrap();
    assert_eq!(config.analysis, AnalysisType::QuasiStatic);
    assert_eq!(config.peridynamics.critical_stretch, Some(0.02));
    assert_eq!(config.max_iterations, SolverConfig::default().max_iterations);
    assert!(config.validate().is_ok());
}

#[test]
fn solve_result_json_round_trip() {
    let (domain, _) = roller_cube(2);
    let result = solve(&domain, &steel_like(), AdapterKind::Fem, SolverConfig::default());
    let json = serde_json::to_string(&result).unwrap();
    let recovered: osteon_solver::SolveResult = serde_json::from_str(&json).unwrap();
    for (a, b) in recovered.displacements.iter().zip(&result.displacements) {
        assert!((*a - *b).length() <= 1e-12 * b.length().max(1e-12));
    }
    assert_eq!(recovered.method, AdapterKind::Fem);
    assert_eq!(recovered.analysis, AnalysisType::Static);
}

// ─── Particle Adapter Tests ───────────────────────────────────

const BAR: (usize, usize, usize) = (8, 4, 4);
const SPACING: f64 = 0.25;

/// 2 x 1 x 1 particle bar loaded along x with rollers at the minimum layers.
fn particle_bar() -> (Domain, Vec<usize>) {
    let mut domain = particle_box(BAR.0, BAR.1, BAR.2, DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0)).unwrap();
    let h = SPACING / 2.0;
    let x0 = domain.select(Axis::X, h, 1e-9);
    let y0 = domain.select(Axis::Y, h, 1e-9);
    let z0 = domain.select(Axis::Z, h, 1e-9);
    domain.set_fixed_axes(&x0, [true, false, false]).unwrap();
    domain.set_fixed_axes(&y0, [false, true, false]).unwrap();
    domain.set_fixed_axes(&z0, [false, false, true]).unwrap();
    let tip = domain.select(Axis::X, 2.0 - h, 1e-9);
    domain.set_force(&tip, DVec3::new(LOAD, 0.0, 0.0)).unwrap();
    (domain, tip)
}

fn particle_config() -> SolverConfig {
    let mut config = SolverConfig::quasi_static();
    config.relaxation_tolerance = 1e-4;
    config.relaxation_steps = 40_000;
    config.peridynamics.horizon_factor = 2.015;
    config
}

fn affine_stress_check(kind: AdapterKind) {
    let domain = particle_box(5, 5, 5, DVec3::ZERO, DVec3::ONE).unwrap();
    let ctx = RuntimeContext::cpu();
    let material = specialize(&steel_like(), kind).unwrap();
    let mut adapter = AdapterInstance::build(&ctx, &domain, material, kind, &SolverConfig::default()).unwrap();

    let grad = DMat3::from_cols(
        DVec3::new(1e-3, 3e-4, 0.0),
        DVec3::new(3e-4, -2e-4, 0.0),
        DVec3::new(0.0, 0.0, 5e-4),
    );
    for i in 0..domain.point_count() {
        adapter.state_mut().set_displacement(i, grad * domain.position(i));
    }
    let law = LinearElasticLaw::from_engineering(E, NU);
    let expected = StressTensor::from_mat(&law.stress(&grad));
    for s in adapter.stress() {
        for (a, b) in s.0.iter().zip(expected.0.iter()) {
            assert!((a - b).abs() < 1e-6 * expected.von_mises(), "{a} vs {b}");
        }
    }
}

#[test]
fn peridynamics_reproduces_affine_deformation() {
    affine_stress_check(AdapterKind::Peridynamics);
}

#[test]
fn meshfree_reproduces_affine_deformation() {
    affine_stress_check(AdapterKind::Meshfree);
}

#[test]
fn peridynamics_bar_quasi_static() {
    let (domain, tip) = particle_bar();
    let result = solve(&domain, &steel_like(), AdapterKind::Peridynamics, particle_config());
    assert!(result.converged, "residual={}", result.final_residual);
    assert_eq!(result.analysis, AnalysisType::QuasiStatic);
    let ux = mean_axis(&result.displacements, &tip, 0);
    let expected = LOAD * (2.0 - SPACING) / E;
    assert!(((ux - expected) / expected).abs() < 0.3, "ux={ux}, expected={expected}");
    assert!(result.damage.iter().all(|&d| d == 0.0));
}

#[test]
fn meshfree_bar_quasi_static() {
    let (domain, tip) = particle_bar();
    let result = solve(&domain, &steel_like(), AdapterKind::Meshfree, particle_config());
    assert!(result.converged, "residual={}", result.final_residual);
    let ux = mean_axis(&result.displacements, &tip, 0);
    let expected = LOAD * (2.0 - SPACING) / E;
    assert!(((ux - expected) / expected).abs() < 0.3, "ux={ux}, expected={expected}");
}

#[test]
fn particle_static_request_is_substituted() {
    let (domain, _) = particle_bar();
    let config = SolverConfig { analysis: AnalysisType::Static, ..particle_config() };
    let ctx = RuntimeContext::cpu();
    let solver = Solver::new(&ctx, &domain, &steel_like(), AdapterKind::Meshfree, config).unwrap();
    assert_eq!(solver.analysis(), AnalysisType::QuasiStatic);
    assert!(solver.warnings().iter().any(|w| matches!(w, SolveWarning::AnalysisSubstituted { .. })));
}

#[test]
fn hyperelastic_projection_is_reported() {
    let (domain, _) = particle_bar();
    let mut config = particle_config();
    config.relaxation_steps = 50;
    let linear = solve(&domain, &steel_like(), AdapterKind::Meshfree, config.clone());
    let projected = solve(&domain, &Material::neo_hookean(E, NU, 1000.0), AdapterKind::Meshfree, config);
    assert_eq!(linear.displacements, projected.displacements);
    assert!(projected.warnings.iter().any(|w| matches!(
        w,
        SolveWarning::MaterialProjected { adapter: AdapterKind::Meshfree, .. }
    )));
    assert!(linear.warnings.is_empty());
}

#[test]
fn peridynamics_damage_only_near_overstretched_bonds() {
    let domain = particle_box(8, 3, 3, DVec3::ZERO, DVec3::new(2.0, 0.75, 0.75)).unwrap();
    let mut config = SolverConfig::default();
    config.peridynamics.critical_stretch = Some(0.02);
    let ctx = RuntimeContext::cpu();
    let material = specialize(&steel_like(), AdapterKind::Peridynamics).unwrap();
    let mut adapter = AdapterInstance::build(&ctx, &domain, material, AdapterKind::Peridynamics, &config).unwrap();

    let jump = 0.05;
    let positions = domain.positions();
    for (i, p) in positions.iter().enumerate() {
        if p.x > 1.0 {
            adapter.state_mut().set_displacement(i, DVec3::new(jump, 0.0, 0.0));
        }
    }
    adapter.step(StepKind::Explicit, 1e-12, 0).unwrap();

    let horizon = match &adapter {
        AdapterInstance::Peridynamics(pd) => pd.horizon(),
        _ => unreachable!(),
    };
    let damage = adapter.damage();
    for (i, p) in positions.iter().enumerate() {
        let overstretched = positions.iter().enumerate().any(|(j, q)| {
            let l = (*q - *p).length();
            if j == i || l > horizon {
                return false;
            }
            let shift = |x: f64| if x > 1.0 { jump } else { 0.0 };
            let stretched = (*q - *p + DVec3::new(shift(q.x) - shift(p.x), 0.0, 0.0)).length();
            (stretched - l) / l > 0.02
        });
        assert_eq!(damage[i] > 0.0, overstretched, "particle {i} at {p:?}: damage {}", damage[i]);
    }
    assert!(damage.iter().any(|&d| d > 0.0));
    assert!(damage.iter().any(|&d| d == 0.0));

    let dt = adapter.stable_dt(StepKind::Explicit);
    let mut previous = damage;
    for step in 1..30 {
        adapter.step(StepKind::Explicit, dt, step).unwrap();
        let current = adapter.damage();
        assert!(current.iter().zip(&previous).all(|(c, p)| c >= p));
        assert!(current.iter().all(|&d| (0.0..=1.0).contains(&d)));
        previous = current;
    }
}

#[test]
fn particle_adapters_reject_implicit_steps() {
    let (domain, _) = particle_bar();
    let ctx = RuntimeContext::cpu();
    for kind in [AdapterKind::Peridynamics, AdapterKind::Meshfree] {
        let material = specialize(&steel_like(), kind).unwrap();
        let mut adapter = AdapterInstance::build(&ctx, &domain, material, kind, &particle_config()).unwrap();
        assert!(!adapter.supports(StepKind::Static));
        assert!(adapter.supports(StepKind::Explicit));
        assert!(matches!(adapter.step(StepKind::Implicit, 1e-6, 0), Err(OsteonError::InvalidConfig(_))));
    }
}

#[test]
fn meshfree_explicit_dynamics_stays_finite() {
    let (domain, _) = particle_bar();
    let config = SolverConfig::dynamic(Integrator::CentralDifference, 50);
    let result = solve(&domain, &steel_like(), AdapterKind::Meshfree, config);
    assert!(result.converged);
    assert!(result.kinetic_energy > 0.0);
    assert!(result.displacements.iter().all(|u| u.is_finite()));
}
