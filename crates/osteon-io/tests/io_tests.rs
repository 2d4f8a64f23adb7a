//! Integration tests for osteon-io.

use osteon_domain::generators::{box_hex_mesh, particle_box, particle_sphere};
use osteon_domain::{BoundaryKind, Domain};
use osteon_io::{
    execute, from_json, run, to_binary, to_json, validate_request, AnalysisRequest, AnalysisResponse,
    BoundaryRequest, BoundaryTarget, ContactRequest, GeometryRequest, MaterialRequest, RegionRequest, RigidRequest,
    SceneRequest,
};
use osteon_material::Material;
use osteon_math::DVec3;
use osteon_runtime::{BackendKind, BackendRequest, Precision, RuntimeContext};
use osteon_scene::{SceneConfig, SceneMode};
use osteon_solver::SolverConfig;
use osteon_types::{AdapterKind, Axis, OsteonError};

const E: f64 = 1.0e6;
const LOAD: f64 = 100.0;

fn plane(axis: Axis, value: f64, kind: BoundaryKind, force: DVec3) -> BoundaryRequest {
    BoundaryRequest {
        target: BoundaryTarget::Plane { axis, value, tolerance: Some(1e-9) },
        kind,
        value: force,
    }
}

fn region(name: &str, domain: &Domain, boundary_conditions: Vec<BoundaryRequest>) -> RegionRequest {
    RegionRequest {
        name: name.into(),
        geometry: GeometryRequest::from_domain(domain),
        material: Some(MaterialRequest::Explicit(Material::linear_elastic(E, 0.3, 1000.0))),
        method: None,
        boundary_conditions,
        rigid: None,
    }
}

fn cube_domain() -> Domain {
    box_hex_mesh(3, 3, 3, DVec3::ZERO, DVec3::ONE).unwrap()
}

/// Unit cube on symmetry rollers, pulled on its top face.
fn roller_cube(name: &str) -> RegionRequest {
    region(
        name,
        &cube_domain(),
        vec![
            plane(Axis::X, 0.0, BoundaryKind::FixedAxes([true, false, false]), DVec3::ZERO),
            plane(Axis::Y, 0.0, BoundaryKind::FixedAxes([false, true, false]), DVec3::ZERO),
            plane(Axis::Z, 0.0, BoundaryKind::FixedAxes([false, false, true]), DVec3::ZERO),
            plane(Axis::Z, 1.0, BoundaryKind::Force, DVec3::new(0.0, 0.0, LOAD)),
        ],
    )
}

fn request(regions: Vec<RegionRequest>) -> AnalysisRequest {
    AnalysisRequest {
        runtime: Default::default(),
        method: AdapterKind::Fem,
        regions,
        solver: SolverConfig::default(),
        scene: None,
    }
}

fn rigid_sphere(name: &str, center: DVec3) -> RegionRequest {
    let domain = particle_sphere(center, 0.5, 0.1).unwrap();
    RegionRequest {
        name: name.into(),
        geometry: GeometryRequest::from_domain(&domain),
        material: None,
        method: None,
        boundary_conditions: Vec::new(),
        rigid: Some(RigidRequest::default()),
    }
}

fn contact(a: &str, b: &str) -> ContactRequest {
    ContactRequest {
        region_a: a.into(),
        region_b: b.into(),
        penalty_stiffness: Some(1e6),
        gap_tolerance: None,
        static_friction: 0.0,
        dynamic_friction: 0.0,
    }
}

fn sphere_request() -> AnalysisRequest {
    let mut req = request(vec![
        rigid_sphere("left", DVec3::ZERO),
        rigid_sphere("right", DVec3::new(1.05, 0.0, 0.0)),
    ]);
    req.scene = Some(SceneRequest { config: SceneConfig::default(), contacts: vec![contact("left", "right")] });
    req
}

// ─── Contract Tests ───────────────────────────────────────────

#[test]
fn minimal_json_request_uses_defaults() {
    let json = r#"{
        "regions": [{
            "name": "bar",
            "geometry": { "type": "particles", "positions": [[0, 0, 0], [1, 0, 0]], "volumes": [1, 1] },
            "material": "cortical_bone"
        }]
    }"#;
    let req: AnalysisRequest = from_json(json).unwrap();
    assert_eq!(req.method, AdapterKind::Fem);
    assert_eq!(req.runtime.backend, BackendRequest::Auto);
    assert_eq!(req.runtime.precision, Precision::Double);
    assert!(req.scene.is_none());
    assert!(matches!(req.regions[0].material, Some(MaterialRequest::Preset(ref name)) if name == "cortical_bone"));
    assert!(req.regions[0].boundary_conditions.is_empty());
}

#[test]
fn explicit_material_and_boundary_json() {
    let json = r#"{
        "name": "block",
        "geometry": { "type": "particles", "positions": [[0, 0, 0]], "volumes": [1] },
        "material": { "model": { "type": "linear_elastic" }, "density": 1000, "youngs_modulus": 1e6, "poisson_ratio": 0.3 },
        "method": "meshfree",
        "boundary_conditions": [
            { "target": { "type": "plane", "axis": "z", "value": 0.0 }, "kind": "fixed" },
            { "target": { "type": "indices", "indices": [0] }, "kind": "force", "value": [0, 0, 5] },
            { "target": { "type": "boundary" }, "kind": { "fixed_axes": [true, false, false] } }
        ]
    }"#;
    let region: RegionRequest = from_json(json).unwrap();
    assert_eq!(region.method, Some(AdapterKind::Meshfree));
    match &region.material {
        Some(MaterialRequest::Explicit(m)) => assert_eq!(m.youngs_modulus, 1e6),
        other => panic!("expected explicit material, got {other:?}"),
    }
    let bcs = &region.boundary_conditions;
    assert!(matches!(bcs[0].target, BoundaryTarget::Plane { axis: Axis::Z, tolerance: None, .. }));
    assert_eq!(bcs[0].value, DVec3::ZERO);
    assert_eq!(bcs[1].value, DVec3::new(0.0, 0.0, 5.0));
    assert_eq!(bcs[2].kind, BoundaryKind::FixedAxes([true, false, false]));
}

#[test]
fn scene_request_from_partial_toml() {
    let text = r#"
        [config]
        mode = "explicit"
        steps = 25

        [[contacts]]
        region_a = "plate"
        region_b = "block"
        static_friction = 0.3
        dynamic_friction = 0.2
    "#;
    let scene: SceneRequest = toml::from_str(text).unwrap();
    assert_eq!(scene.config.mode, SceneMode::Explicit);
    assert_eq!(scene.config.steps, 25);
    assert_eq!(scene.contacts.len(), 1);
    assert!(scene.contacts[0].penalty_stiffness.is_none());
}

#[test]
fn malformed_json_is_a_serialization_error() {
    let err = from_json::<AnalysisRequest>("{ \"regions\": 3 }").unwrap_err();
    assert!(matches!(err, OsteonError::Serialization(_)));
}

// ─── Validator Tests ──────────────────────────────────────────

#[test]
fn valid_request_passes() {
    assert!(validate_request(&request(vec![roller_cube("cube")])).is_ok());
    assert!(validate_request(&sphere_request()).is_ok());
}

#[test]
fn empty_request_rejected() {
    let err = validate_request(&request(Vec::new())).unwrap_err();
    assert!(matches!(err, OsteonError::EmptyDomain(_)));
}

#[test]
fn duplicate_region_names_rejected() {
    let err = validate_request(&request(vec![roller_cube("a"), roller_cube("a")])).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidConfig(_)));
}

#[test]
fn out_of_range_boundary_index_rejected() {
    let mut cube = roller_cube("cube");
    cube.boundary_conditions.push(BoundaryRequest {
        target: BoundaryTarget::Indices { indices: vec![10_000] },
        kind: BoundaryKind::Fixed,
        value: DVec3::ZERO,
    });
    let err = validate_request(&request(vec![cube])).unwrap_err();
    match err {
        OsteonError::InvalidDomain(msg) => assert!(msg.contains("cube"), "{msg}"),
        other => panic!("expected InvalidDomain, got {other:?}"),
    }
}

#[test]
fn empty_selection_rejected() {
    let mut cube = roller_cube("cube");
    cube.boundary_conditions.push(plane(Axis::X, 5.0, BoundaryKind::Fixed, DVec3::ZERO));
    let err = validate_request(&request(vec![cube])).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidDomain(_)));
}

#[test]
fn element_index_out_of_range_rejected() {
    let mut cube = roller_cube("cube");
    if let GeometryRequest::Mesh { connectivity, .. } = &mut cube.geometry {
        connectivity[0] = 999;
    }
    let err = validate_request(&request(vec![cube])).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidDomain(_)));
}

#[test]
fn empty_particle_set_rejected() {
    let mut cube = roller_cube("cloud");
    cube.geometry = GeometryRequest::Particles { positions: Vec::new(), volumes: Vec::new() };
    cube.boundary_conditions.clear();
    let err = validate_request(&request(vec![cube])).unwrap_err();
    assert!(matches!(err, OsteonError::EmptyDomain(_)));
}

#[test]
fn unknown_preset_rejected() {
    let mut cube = roller_cube("cube");
    cube.material = Some(MaterialRequest::Preset("unobtainium".into()));
    let err = validate_request(&request(vec![cube])).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidMaterial(_)));
}

#[test]
fn missing_material_rejected() {
    let mut cube = roller_cube("cube");
    cube.material = None;
    let err = validate_request(&request(vec![cube])).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidMaterial(_)));
}

#[test]
fn method_must_match_geometry() {
    let mut cube = roller_cube("cube");
    cube.method = Some(AdapterKind::Peridynamics);
    let err = validate_request(&request(vec![cube])).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidConfig(_)));

    let cloud = particle_box(3, 3, 3, DVec3::ZERO, DVec3::ONE).unwrap();
    let err = validate_request(&request(vec![region("cloud", &cloud, Vec::new())])).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidConfig(_)));
}

#[test]
fn rigid_region_needs_scene() {
    let mut req = sphere_request();
    req.scene = None;
    let err = validate_request(&req).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidConfig(_)));
}

#[test]
fn friction_out_of_range_rejected() {
    let mut req = sphere_request();
    if let Some(scene) = &mut req.scene {
        scene.contacts[0].static_friction = 1.5;
    }
    let err = validate_request(&req).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidContact(_)));
}

#[test]
fn contact_with_unknown_region_rejected() {
    let mut req = sphere_request();
    if let Some(scene) = &mut req.scene {
        scene.contacts.push(contact("left", "ghost"));
    }
    let err = validate_request(&req).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidContact(_)));
}

#[test]
fn static_scene_without_constraint_is_singular() {
    let lower = box_hex_mesh(2, 2, 2, DVec3::ZERO, DVec3::ONE).unwrap();
    let upper = box_hex_mesh(2, 2, 2, DVec3::new(0.0, 0.0, 1.02), DVec3::ONE).unwrap();
    let mut req = request(vec![region("lower", &lower, Vec::new()), region("upper", &upper, Vec::new())]);
    req.scene = Some(SceneRequest { config: SceneConfig::static_pair(), contacts: vec![contact("upper", "lower")] });
    let err = validate_request(&req).unwrap_err();
    assert!(matches!(err, OsteonError::SingularSystem(_)));
}

#[test]
fn static_scene_rejects_rigid_regions() {
    let mut req = sphere_request();
    if let Some(scene) = &mut req.scene {
        scene.config = SceneConfig::static_pair();
    }
    let err = validate_request(&req).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidConfig(_)));
}

// ─── Runner Tests ─────────────────────────────────────────────

#[test]
fn unit_cube_request_matches_bar_formula() {
    // Rollers leave lateral contraction free, so the cube is a uniaxial bar.
    let ctx = RuntimeContext::cpu();
    let response = run(&ctx, &request(vec![roller_cube("cube")])).unwrap();
    assert!(response.summary.converged);
    assert_eq!(response.summary.mode, None);
    assert_eq!(response.summary.backend, BackendKind::Cpu);

    let result = response.region("cube").unwrap().result.as_deformable().unwrap();
    let expected = LOAD / E;
    let top = cube_domain().select(Axis::Z, 1.0, 1e-9);
    let uz = top.iter().map(|&i| result.displacements[i].z).sum::<f64>() / top.len() as f64;
    assert!(((uz - expected) / expected).abs() < 0.02, "uz={uz}, expected={expected}");
}

#[test]
fn independent_regions_keep_request_order() {
    let ctx = RuntimeContext::cpu();
    let response = run(&ctx, &request(vec![roller_cube("first"), roller_cube("second")])).unwrap();
    let names: Vec<&str> = response.regions.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["first", "second"]);
    assert!(response.contacts.is_empty());
    let a = response.regions[0].result.as_deformable().unwrap();
    let b = response.regions[1].result.as_deformable().unwrap();
    assert_eq!(a.displacements, b.displacements);
}

#[test]
fn rigid_sphere_scene_balances() {
    let ctx = RuntimeContext::cpu();
    let response = run(&ctx, &sphere_request()).unwrap();
    assert!(response.summary.converged);
    assert_eq!(response.summary.mode, Some(SceneMode::QuasiStatic));
    assert_eq!(response.contacts.len(), 1);
    assert!(response.contacts[0].active_pairs > 0);

    let left = response.region("left").unwrap().result.as_rigid().unwrap();
    let right = response.region("right").unwrap().result.as_rigid().unwrap();
    let net = left.reaction + right.reaction;
    assert!(left.reaction.x < 0.0);
    assert!(net.length() <= 1e-9 * left.reaction.length());
}

#[test]
fn execute_reports_backend_fallback() {
    let mut req = request(vec![roller_cube("cube")]);
    req.runtime.backend = BackendRequest::Prefer(BackendKind::Cuda);
    req.runtime.threads = Some(1);
    let response = execute(&req).unwrap();
    assert_eq!(response.summary.backend, BackendKind::Cpu);
    assert!(response.summary.fell_back);
}

#[test]
fn execute_validates_first() {
    let mut cube = roller_cube("cube");
    cube.material = Some(MaterialRequest::Preset("unobtainium".into()));
    assert!(matches!(execute(&request(vec![cube])), Err(OsteonError::InvalidMaterial(_))));
}

// ─── Encoding Tests ───────────────────────────────────────────

#[test]
fn response_json_round_trip() {
    let ctx = RuntimeContext::cpu();
    let response = run(&ctx, &sphere_request()).unwrap();
    let json = to_json(&response).unwrap();
    let recovered: AnalysisResponse = from_json(&json).unwrap();
    assert_eq!(recovered.regions.len(), 2);
    assert_eq!(recovered.summary.mode, Some(SceneMode::QuasiStatic));
    let before = response.region("right").unwrap().result.as_rigid().unwrap().reaction;
    let after = recovered.region("right").unwrap().result.as_rigid().unwrap().reaction;
    assert!((after - before).length() <= 1e-12 * before.length());
}

#[test]
fn binary_response_is_compact() {
    let ctx = RuntimeContext::cpu();
    let response = run(&ctx, &request(vec![roller_cube("cube")])).unwrap();
    let bytes = to_binary(&response).unwrap();
    let json = to_json(&response).unwrap();
    assert!(!bytes.is_empty());
    assert!(bytes.len() < json.len());
}

#[test]
fn request_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("osteon-io-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("request.json");
    std::fs::write(&path, to_json(&request(vec![roller_cube("cube")])).unwrap()).unwrap();

    let loaded = osteon_io::read_request(&path).unwrap();
    assert_eq!(loaded.regions[0].name, "cube");
    assert_eq!(loaded.regions[0].boundary_conditions.len(), 4);

    let missing = osteon_io::read_request(&dir.join("missing.json")).unwrap_err();
    assert!(matches!(missing, OsteonError::Io(_)));
    std::fs::remove_dir_all(&dir).unwrap();
}
