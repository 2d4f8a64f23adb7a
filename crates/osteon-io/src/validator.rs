//! Request validation.
//!
//! Catches caller-side errors before any solve starts.

use std::collections::HashSet;

use osteon_domain::Domain;
use osteon_material::MaterialDatabase;
use osteon_scene::SceneMode;
use osteon_types::{AdapterKind, OsteonError, OsteonResult};

use crate::contract::{AnalysisRequest, RegionRequest, SceneRequest};
use crate::runner::{build_domain, resolve_material};

/// Validates a complete analysis request.
///
/// Checks:
/// - At least one region, unique non-empty names
/// - Solver settings are usable
/// - Geometry indices, volumes and boundary-condition selections
/// - Materials resolve and are physically valid
/// - Each region's geometry matches its method (mesh for FEM, particles otherwise)
/// - Rigid regions only appear in scenes
/// - Contacts name existing regions, friction lies in [0, 1]
/// - Static scenes have two FEM regions and a constrained body in every pair
pub fn validate_request(request: &AnalysisRequest) -> OsteonResult<()> {
    if request.regions.is_empty() {
        return Err(OsteonError::EmptyDomain("request has no regions".into()));
    }

    let mut names = HashSet::new();
    for region in &request.regions {
        if region.name.trim().is_empty() {
            return Err(OsteonError::InvalidConfig("region names must not be empty".into()));
        }
        if !names.insert(region.name.as_str()) {
            return Err(OsteonError::InvalidConfig(format!("duplicate region name '{}'", region.name)));
        }
    }

    request.solver.validate()?;

    let db = MaterialDatabase::with_defaults();
    let mut domains = Vec::with_capacity(request.regions.len());
    for region in &request.regions {
        let domain = build_domain(region)?;
        validate_region(request, region, &domain, &db)?;
        domains.push(domain);
    }

    if let Some(scene) = &request.scene {
        validate_scene(request, scene, &domains)?;
    }
    Ok(())
}

fn validate_region(
    request: &AnalysisRequest,
    region: &RegionRequest,
    domain: &Domain,
    db: &MaterialDatabase,
) -> OsteonResult<()> {
    if let Some(rigid) = &region.rigid {
        if request.scene.is_none() {
            return Err(OsteonError::InvalidConfig(format!(
                "region '{}' is rigid but the request has no scene",
                region.name
            )));
        }
        let finite = rigid.pivot.map_or(true, |p| p.is_finite())
            && rigid
                .schedule
                .iter()
                .all(|m| m.axis.is_finite() && m.angle.is_finite() && m.translation.is_finite());
        if !finite {
            return Err(OsteonError::InvalidConfig(format!(
                "region '{}': rigid pivot or schedule is not finite",
                region.name
            )));
        }
        return Ok(());
    }

    resolve_material(region, db)?;

    let method = request.method_of(region);
    if method.is_mesh_based() != domain.is_mesh() {
        let expected = if method.is_mesh_based() { "a mesh" } else { "particles" };
        return Err(OsteonError::InvalidConfig(format!(
            "region '{}': method {} needs {expected}",
            region.name,
            method.name()
        )));
    }
    Ok(())
}

fn validate_scene(request: &AnalysisRequest, scene: &SceneRequest, domains: &[Domain]) -> OsteonResult<()> {
    scene.config.validate()?;

    let mut pairs = Vec::with_capacity(scene.contacts.len());
    for contact in &scene.contacts {
        let a = index_of(request, &contact.region_a)?;
        let b = index_of(request, &contact.region_b)?;
        contact.definition(a, b).validate(request.regions.len())?;
        pairs.push((a, b));
    }

    if scene.config.mode != SceneMode::Static {
        return Ok(());
    }

    if request.regions.len() != 2 {
        return Err(OsteonError::InvalidConfig(format!(
            "static scenes take exactly two regions, got {}",
            request.regions.len()
        )));
    }
    for region in &request.regions {
        if region.is_rigid() || request.method_of(region) != AdapterKind::Fem {
            return Err(OsteonError::InvalidConfig(format!(
                "static scenes need FEM regions, '{}' is not one",
                region.name
            )));
        }
    }
    for (a, b) in pairs {
        if !domains[a].has_constraint() && !domains[b].has_constraint() {
            return Err(OsteonError::SingularSystem(format!(
                "neither '{}' nor '{}' has a fixed boundary condition",
                request.regions[a].name, request.regions[b].name
            )));
        }
    }
    Ok(())
}

fn index_of(request: &AnalysisRequest, name: &str) -> OsteonResult<usize> {
    request
        .region_index(name)
        .ok_or_else(|| OsteonError::InvalidContact(format!("contact references unknown region '{name}'")))
}
