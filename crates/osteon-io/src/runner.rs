//! Turns an [`AnalysisRequest`] into an [`AnalysisResponse`].
//!
//! Without a scene every region is solved on its own with a [`Solver`].
//! With a scene all regions become bodies of one [`Scene`] and are solved
//! together.

use std::time::Instant;

use osteon_domain::{BoundaryCondition, Domain};
use osteon_material::{Material, MaterialDatabase};
use osteon_runtime::{RuntimeConfig, RuntimeContext};
use osteon_scene::{BodyResult, RigidBody, Scene};
use osteon_solver::Solver;
use osteon_types::{OsteonError, OsteonResult};
use tracing::{info, warn};

use crate::contract::{
    AnalysisRequest, AnalysisResponse, BoundaryTarget, GeometryRequest, MaterialRequest, RegionRequest, RegionResult,
    RunSummary, SceneRequest,
};
use crate::validator::validate_request;

/// Plane selections default to this fraction of the minimum point spacing.
const PLANE_TOLERANCE_FACTOR: f64 = 1e-3;

/// Validates the request, commits a runtime for it and runs it.
pub fn execute(request: &AnalysisRequest) -> OsteonResult<AnalysisResponse> {
    validate_request(request)?;
    let settings = &request.runtime;
    let ctx = RuntimeContext::init(
        settings.backend,
        settings.precision,
        &RuntimeConfig { threads: settings.threads },
    )?;
    run(&ctx, request)
}

/// Runs a request on an existing runtime context.
///
/// The request-level `runtime` settings are ignored here; `ctx` decides
/// backend, precision and threads.
pub fn run(ctx: &RuntimeContext, request: &AnalysisRequest) -> OsteonResult<AnalysisResponse> {
    let start = Instant::now();
    let mut response = match &request.scene {
        None => run_independent(ctx, request)?,
        Some(scene) => run_scene(ctx, request, scene)?,
    };
    response.summary.elapsed_time = start.elapsed().as_secs_f64();

    if response.summary.converged {
        info!(
            regions = response.regions.len(),
            iterations = response.summary.iterations,
            elapsed = response.summary.elapsed_time,
            "analysis complete"
        );
    } else {
        warn!(
            regions = response.regions.len(),
            iterations = response.summary.iterations,
            "analysis finished without converging"
        );
    }
    Ok(response)
}

fn run_independent(ctx: &RuntimeContext, request: &AnalysisRequest) -> OsteonResult<AnalysisResponse> {
    let db = MaterialDatabase::with_defaults();
    let mut regions = Vec::with_capacity(request.regions.len());
    let mut converged = true;
    let mut iterations = 0;

    for region in &request.regions {
        if region.is_rigid() {
            return Err(OsteonError::InvalidConfig(format!(
                "region '{}' is rigid but the request has no scene",
                region.name
            )));
        }
        let domain = build_domain(region)?;
        let material = resolve_material(region, &db)?;
        let mut solver = Solver::new(ctx, &domain, &material, request.method_of(region), request.solver.clone())?;
        let result = solver.solve()?;
        converged &= result.converged;
        iterations = iterations.max(result.iterations);
        regions.push(RegionResult { name: region.name.clone(), result: BodyResult::Deformable(result) });
    }

    Ok(AnalysisResponse {
        regions,
        contacts: Vec::new(),
        summary: RunSummary {
            backend: ctx.backend(),
            precision: ctx.precision(),
            fell_back: ctx.fell_back(),
            elapsed_time: 0.0,
            converged,
            iterations,
            mode: None,
            warnings: Vec::new(),
        },
    })
}

fn run_scene(ctx: &RuntimeContext, request: &AnalysisRequest, scene_req: &SceneRequest) -> OsteonResult<AnalysisResponse> {
    let db = MaterialDatabase::with_defaults();
    let mut config = scene_req.config.clone();
    config.solver = request.solver.clone();
    let mut scene = Scene::new(ctx, config)?;

    for region in &request.regions {
        let domain = build_domain(region)?;
        match &region.rigid {
            Some(rigid) => {
                let mut body = RigidBody::new(domain).with_schedule(rigid.schedule.clone());
                if let Some(pivot) = rigid.pivot {
                    body = body.with_pivot(pivot);
                }
                scene.add_rigid(body);
            }
            None => {
                let material = resolve_material(region, &db)?;
                scene.add_body(&domain, &material, request.method_of(region))?;
            }
        }
    }

    for contact in &scene_req.contacts {
        let a = region_index(request, &contact.region_a)?;
        let b = region_index(request, &contact.region_b)?;
        scene.add_contact(contact.definition(a, b))?;
    }

    let result = scene.solve()?;
    let regions = request
        .regions
        .iter()
        .zip(result.bodies)
        .map(|(region, body)| RegionResult { name: region.name.clone(), result: body })
        .collect();

    Ok(AnalysisResponse {
        regions,
        contacts: result.contacts,
        summary: RunSummary {
            backend: result.backend,
            precision: result.precision,
            fell_back: ctx.fell_back(),
            elapsed_time: 0.0,
            converged: result.converged,
            iterations: result.iterations,
            mode: Some(result.mode),
            warnings: result.warnings,
        },
    })
}

fn region_index(request: &AnalysisRequest, name: &str) -> OsteonResult<usize> {
    request
        .region_index(name)
        .ok_or_else(|| OsteonError::InvalidContact(format!("contact references unknown region '{name}'")))
}

// ─── Region assembly ──────────────────────────────────────────

/// Builds a region's domain and applies its boundary conditions.
pub(crate) fn build_domain(region: &RegionRequest) -> OsteonResult<Domain> {
    let mut domain = match &region.geometry {
        GeometryRequest::Mesh { nodes, element, connectivity } => Domain::from_mesh(nodes, *element, connectivity),
        GeometryRequest::Particles { positions, volumes } => Domain::from_particles(positions, volumes),
    }
    .map_err(|e| in_region(&region.name, e))?;

    for (i, bc) in region.boundary_conditions.iter().enumerate() {
        let indices = select(&domain, &bc.target);
        if indices.is_empty() {
            return Err(OsteonError::InvalidDomain(format!(
                "region '{}': boundary condition {i} selects no points",
                region.name
            )));
        }
        domain
            .add_boundary_condition(BoundaryCondition::new(bc.kind, &indices, bc.value))
            .map_err(|e| in_region(&region.name, e))?;
    }
    Ok(domain)
}

/// Point indices a target resolves to. Out-of-range explicit indices are
/// passed through for the domain to reject.
fn select(domain: &Domain, target: &BoundaryTarget) -> Vec<usize> {
    match target {
        BoundaryTarget::Indices { indices } => indices.clone(),
        BoundaryTarget::Plane { axis, value, tolerance } => {
            let tol = tolerance.unwrap_or(PLANE_TOLERANCE_FACTOR * domain.spacing().min);
            domain.select(*axis, *value, tol)
        }
        BoundaryTarget::Box { min, max } => domain.select_box(*min, *max),
        BoundaryTarget::Boundary => domain.select_boundary(),
    }
}

/// Looks up or validates a region's material.
pub(crate) fn resolve_material(region: &RegionRequest, db: &MaterialDatabase) -> OsteonResult<Material> {
    let material = match &region.material {
        None => {
            return Err(OsteonError::InvalidMaterial(format!("region '{}' has no material", region.name)));
        }
        Some(MaterialRequest::Preset(name)) => db.get(name).cloned().ok_or_else(|| {
            OsteonError::InvalidMaterial(format!(
                "region '{}': unknown material preset '{name}' (known: {})",
                region.name,
                db.names().join(", ")
            ))
        })?,
        Some(MaterialRequest::Explicit(material)) => material.clone(),
    };
    material.validate().map_err(|e| in_region(&region.name, e))?;
    Ok(material)
}

/// Prefixes geometry and material messages with the region name.
fn in_region(name: &str, err: OsteonError) -> OsteonError {
    match err {
        OsteonError::InvalidDomain(msg) => OsteonError::InvalidDomain(format!("region '{name}': {msg}")),
        OsteonError::EmptyDomain(msg) => OsteonError::EmptyDomain(format!("region '{name}': {msg}")),
        OsteonError::InvalidMaterial(msg) => OsteonError::InvalidMaterial(format!("region '{name}': {msg}")),
        other => other,
    }
}
