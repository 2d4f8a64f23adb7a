//! Analysis input/output contract.
//!
//! Defines the boundary types that external systems use to submit an
//! analysis and read back its results.

use osteon_contact::ContactDefinition;
use osteon_domain::{BoundaryKind, Domain, ElementKind, Geometry};
use osteon_material::Material;
use osteon_math::DVec3;
use osteon_runtime::{BackendKind, BackendRequest, Precision};
use osteon_scene::{BodyResult, ContactReport, RigidMotion, SceneConfig, SceneMode};
use osteon_solver::{SolveWarning, SolverConfig};
use osteon_types::{AdapterKind, Axis};
use serde::{Deserialize, Serialize};

// ─── Request ──────────────────────────────────────────────────

/// Complete input for one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub runtime: RuntimeSettings,
    /// Method for regions that do not name one.
    #[serde(default = "default_method")]
    pub method: AdapterKind,
    pub regions: Vec<RegionRequest>,
    /// Settings shared by every deformable region.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Present for multi-body analyses with contact or rigid regions.
    #[serde(default)]
    pub scene: Option<SceneRequest>,
}

fn default_method() -> AdapterKind {
    AdapterKind::Fem
}

impl AnalysisRequest {
    /// Method a region is solved with.
    pub fn method_of(&self, region: &RegionRequest) -> AdapterKind {
        region.method.unwrap_or(self.method)
    }

    /// Index of the region called `name`.
    pub fn region_index(&self, name: &str) -> Option<usize> {
        self.regions.iter().position(|r| r.name == name)
    }
}

/// Backend selection for the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub backend: BackendRequest,
    pub precision: Precision,
    /// Worker threads. `None` uses all cores.
    pub threads: Option<usize>,
}

/// One region: a discretized body with its material and loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRequest {
    pub name: String,
    pub geometry: GeometryRequest,
    /// Required for deformable regions, ignored for rigid ones.
    #[serde(default)]
    pub material: Option<MaterialRequest>,
    /// Overrides the request-level method.
    #[serde(default)]
    pub method: Option<AdapterKind>,
    #[serde(default)]
    pub boundary_conditions: Vec<BoundaryRequest>,
    /// Makes the region a rigid body driven by a motion schedule.
    #[serde(default)]
    pub rigid: Option<RigidRequest>,
}

impl RegionRequest {
    pub fn is_rigid(&self) -> bool {
        self.rigid.is_some()
    }
}

/// Pre-discretized geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryRequest {
    Mesh {
        nodes: Vec<DVec3>,
        element: ElementKind,
        /// Flat element connectivity, `element.nodes_per_element()` per element.
        connectivity: Vec<usize>,
    },
    Particles {
        positions: Vec<DVec3>,
        volumes: Vec<f64>,
    },
}

impl GeometryRequest {
    /// Geometry of an existing domain. Boundary conditions are not carried.
    pub fn from_domain(domain: &Domain) -> Self {
        match domain.geometry() {
            Geometry::Mesh(mesh) => Self::Mesh {
                nodes: domain.positions(),
                element: mesh.kind,
                connectivity: mesh.connectivity.clone(),
            },
            Geometry::Particles(cloud) => Self::Particles {
                positions: domain.positions(),
                volumes: cloud.volumes.clone(),
            },
        }
    }
}

/// A preset name from the material database or a full material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialRequest {
    Preset(String),
    Explicit(Material),
}

/// A boundary condition applied to a selection of points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryRequest {
    pub target: BoundaryTarget,
    pub kind: BoundaryKind,
    /// Total force for `force` conditions.
    #[serde(default)]
    pub value: DVec3,
}

/// Which points a boundary condition applies to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryTarget {
    Indices {
        indices: Vec<usize>,
    },
    /// Points whose `axis` coordinate is within `tolerance` of `value`.
    Plane {
        axis: Axis,
        value: f64,
        /// Defaults to a small fraction of the minimum point spacing.
        #[serde(default)]
        tolerance: Option<f64>,
    },
    Box {
        min: DVec3,
        max: DVec3,
    },
    /// The extracted free surface.
    Boundary,
}

/// Rigid-body settings of a region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidRequest {
    /// Rotation pivot. Defaults to the bounding-box center.
    pub pivot: Option<DVec3>,
    /// One motion per scene step.
    pub schedule: Vec<RigidMotion>,
}

/// Multi-body settings. The request-level `solver` replaces `config.solver`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneRequest {
    pub config: SceneConfig,
    pub contacts: Vec<ContactRequest>,
}

/// A contact between two regions named in the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub region_a: String,
    pub region_b: String,
    #[serde(default)]
    pub penalty_stiffness: Option<f64>,
    #[serde(default)]
    pub gap_tolerance: Option<f64>,
    #[serde(default)]
    pub static_friction: f64,
    #[serde(default)]
    pub dynamic_friction: f64,
}

impl ContactRequest {
    /// Contact definition between the two resolved region indices.
    pub fn definition(&self, a: usize, b: usize) -> ContactDefinition {
        ContactDefinition {
            body_a: (a as u32).into(),
            body_b: (b as u32).into(),
            penalty_stiffness: self.penalty_stiffness,
            gap_tolerance: self.gap_tolerance,
            static_friction: self.static_friction,
            dynamic_friction: self.dynamic_friction,
        }
    }
}

// ─── Response ─────────────────────────────────────────────────

/// Output of one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// One entry per request region, in request order.
    pub regions: Vec<RegionResult>,
    /// Last evaluation of every contact. Empty without a scene.
    pub contacts: Vec<ContactReport>,
    pub summary: RunSummary,
}

impl AnalysisResponse {
    /// Result of the region called `name`.
    pub fn region(&self, name: &str) -> Option<&RegionResult> {
        self.regions.iter().find(|r| r.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionResult {
    pub name: String,
    pub result: BodyResult,
}

/// Backend and timing summary of the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub backend: BackendKind,
    pub precision: Precision,
    /// True when the requested backend was unavailable.
    pub fell_back: bool,
    /// Wall-clock seconds for the whole run.
    pub elapsed_time: f64,
    /// All regions (or the scene) converged.
    pub converged: bool,
    /// Largest iteration count over the solves that ran.
    pub iterations: u32,
    /// Scene mode, `None` when regions were solved independently.
    pub mode: Option<SceneMode>,
    /// Scene-level warnings. Per-region ones live in each result.
    pub warnings: Vec<SolveWarning>,
}
