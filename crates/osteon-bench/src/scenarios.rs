//! Benchmark scenarios: geometry + loads + settings for each test case.
//!
//! Five canonical scenarios for regression testing:
//! 1. **Uniaxial bar**: linear-elastic FEM bar on rollers, `F·L/(E·A)` reference
//! 2. **Neo-Hookean bar**: same bar, hyperelastic Newton iterations
//! 3. **Peridynamic fracture**: particle bar pulled past its critical stretch
//! 4. **Meshfree compression**: SPG particle block under a top load
//! 5. **Contact press**: rigid plate pushed into a clamped FEM block

use osteon_domain::generators::{box_hex_mesh, particle_box};
use osteon_domain::{BoundaryKind, Domain};
use osteon_io::{
    AnalysisRequest, AnalysisResponse, BoundaryRequest, BoundaryTarget, ContactRequest, GeometryRequest,
    MaterialRequest, RegionRequest, RigidRequest, SceneRequest,
};
use osteon_material::Material;
use osteon_math::DVec3;
use osteon_scene::{RigidMotion, SceneConfig};
use osteon_solver::{Integrator, SolverConfig};
use osteon_types::{AdapterKind, Axis, OsteonResult};
use serde::{Deserialize, Serialize};

/// Young's modulus shared by every scenario [Pa].
const E: f64 = 1.0e6;
const NU: f64 = 0.3;
const DENSITY: f64 = 1000.0;
/// Tip load of the bar scenarios [N].
const LOAD: f64 = 100.0;
/// Particle spacing of the particle scenarios.
const SPACING: f64 = 0.25;

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Linear-elastic FEM bar under uniaxial tension.
    UniaxialBar,
    /// Neo-Hookean FEM bar under uniaxial tension.
    NeoHookeanBar,
    /// Peridynamic bar loaded past its critical bond stretch.
    PeridynamicFracture,
    /// Meshfree particle block under compression.
    MeshfreeCompression,
    /// Rigid plate pressed into a clamped FEM block.
    ContactPress,
}

impl ScenarioKind {
    /// Returns all scenario kinds.
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::UniaxialBar,
            ScenarioKind::NeoHookeanBar,
            ScenarioKind::PeridynamicFracture,
            ScenarioKind::MeshfreeCompression,
            ScenarioKind::ContactPress,
        ]
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::UniaxialBar => "uniaxial_bar",
            ScenarioKind::NeoHookeanBar => "neo_hookean_bar",
            ScenarioKind::PeridynamicFracture => "peridynamic_fracture",
            ScenarioKind::MeshfreeCompression => "meshfree_compression",
            ScenarioKind::ContactPress => "contact_press",
        }
    }

    /// Looks a kind up by [`ScenarioKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// Analytic expectation for the mean displacement of a point set.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Index of the region in the request.
    pub region: usize,
    pub points: Vec<usize>,
    pub axis: Axis,
    pub expected: f64,
}

impl Reference {
    /// Signed relative error of the mean displacement, `None` when the
    /// region is missing or rigid.
    pub fn relative_error(&self, response: &AnalysisResponse) -> Option<f64> {
        let result = response.regions.get(self.region)?.result.as_deformable()?;
        if self.points.is_empty() {
            return None;
        }
        let axis = self.axis.index();
        let mean = self.points.iter().map(|&i| result.displacements[i][axis]).sum::<f64>() / self.points.len() as f64;
        Some((mean - self.expected) / self.expected)
    }
}

/// A fully specified benchmark scenario.
pub struct Scenario {
    /// Scenario type.
    pub kind: ScenarioKind,
    /// The request handed to the runner.
    pub request: AnalysisRequest,
    /// Analytic reference, when the scenario has one.
    pub reference: Option<Reference>,
}

fn plane(axis: Axis, value: f64, kind: BoundaryKind, force: DVec3) -> BoundaryRequest {
    BoundaryRequest { target: BoundaryTarget::Plane { axis, value, tolerance: Some(1e-9) }, kind, value: force }
}

/// Symmetry rollers on the planes through `min`.
fn rollers(min: DVec3) -> Vec<BoundaryRequest> {
    vec![
        plane(Axis::X, min.x, BoundaryKind::FixedAxes([true, false, false]), DVec3::ZERO),
        plane(Axis::Y, min.y, BoundaryKind::FixedAxes([false, true, false]), DVec3::ZERO),
        plane(Axis::Z, min.z, BoundaryKind::FixedAxes([false, false, true]), DVec3::ZERO),
    ]
}

fn deformable(name: &str, domain: &Domain, material: Material, bcs: Vec<BoundaryRequest>) -> RegionRequest {
    RegionRequest {
        name: name.into(),
        geometry: GeometryRequest::from_domain(domain),
        material: Some(MaterialRequest::Explicit(material)),
        method: None,
        boundary_conditions: bcs,
        rigid: None,
    }
}

fn single(method: AdapterKind, region: RegionRequest, solver: SolverConfig) -> AnalysisRequest {
    AnalysisRequest { runtime: Default::default(), method, regions: vec![region], solver, scene: None }
}

/// Relaxation settings the particle scenarios converge with.
fn relaxation_config() -> SolverConfig {
    let mut config = SolverConfig::quasi_static();
    config.relaxation_tolerance = 1e-4;
    config.relaxation_steps = 40_000;
    config.peridynamics.horizon_factor = 2.015;
    config
}

impl Scenario {
    /// Create the uniaxial bar scenario.
    ///
    /// A 2 × 1 × 1 bar of 8 × 4 × 4 hexahedra on symmetry rollers, pulled
    /// with 100 N on its far face. Reference: tip displacement `F·L/(E·A)`.
    pub fn uniaxial_bar() -> OsteonResult<Self> {
        Self::fem_bar(ScenarioKind::UniaxialBar, Material::linear_elastic(E, NU, DENSITY))
    }

    /// Create the Neo-Hookean bar scenario.
    ///
    /// Same bar and load as [`Scenario::uniaxial_bar`]; at this strain the
    /// hyperelastic response stays within the linear reference.
    pub fn neo_hookean_bar() -> OsteonResult<Self> {
        let mut scenario = Self::fem_bar(ScenarioKind::NeoHookeanBar, Material::neo_hookean(E, NU, DENSITY))?;
        scenario.request.solver.fem.load_steps = 2;
        Ok(scenario)
    }

    fn fem_bar(kind: ScenarioKind, material: Material) -> OsteonResult<Self> {
        let length = 2.0;
        let domain = box_hex_mesh(8, 4, 4, DVec3::ZERO, DVec3::new(length, 1.0, 1.0))?;
        let mut bcs = rollers(DVec3::ZERO);
        bcs.push(plane(Axis::X, length, BoundaryKind::Force, DVec3::new(LOAD, 0.0, 0.0)));
        let tip = domain.select(Axis::X, length, 1e-9);

        Ok(Self {
            kind,
            request: single(AdapterKind::Fem, deformable("bar", &domain, material, bcs), SolverConfig::default()),
            reference: Some(Reference { region: 0, points: tip, axis: Axis::X, expected: LOAD * length / E }),
        })
    }

    /// Create the peridynamic fracture scenario.
    ///
    /// A clamped 2 × 0.75 × 0.75 particle bar, pulled with a load far past
    /// the one that stretches bonds to the 2 % critical stretch, time
    /// marched explicitly.
    pub fn peridynamic_fracture() -> OsteonResult<Self> {
        let domain = particle_box(8, 3, 3, DVec3::ZERO, DVec3::new(2.0, 0.75, 0.75))?;
        let h = SPACING / 2.0;
        let bcs = vec![
            plane(Axis::X, h, BoundaryKind::Fixed, DVec3::ZERO),
            plane(Axis::X, 2.0 - h, BoundaryKind::Force, DVec3::new(1.0e5, 0.0, 0.0)),
        ];
        let mut solver = SolverConfig::dynamic(Integrator::CentralDifference, 200);
        solver.peridynamics.critical_stretch = Some(0.02);

        Ok(Self {
            kind: ScenarioKind::PeridynamicFracture,
            request: single(
                AdapterKind::Peridynamics,
                deformable("bar", &domain, Material::linear_elastic(E, NU, DENSITY), bcs),
                solver,
            ),
            reference: None,
        })
    }

    /// Create the meshfree compression scenario.
    ///
    /// A unit particle block on rollers with 100 N pushing down on its top
    /// layer. Reference: `F·L/(E·A)` over the distance between the outer
    /// particle layers.
    pub fn meshfree_compression() -> OsteonResult<Self> {
        let domain = particle_box(4, 4, 4, DVec3::ZERO, DVec3::ONE)?;
        let h = SPACING / 2.0;
        let mut bcs = rollers(DVec3::splat(h));
        bcs.push(plane(Axis::Z, 1.0 - h, BoundaryKind::Force, DVec3::new(0.0, 0.0, -LOAD)));
        let top = domain.select(Axis::Z, 1.0 - h, 1e-9);

        Ok(Self {
            kind: ScenarioKind::MeshfreeCompression,
            request: single(
                AdapterKind::Meshfree,
                deformable("block", &domain, Material::linear_elastic(E, NU, DENSITY), bcs),
                relaxation_config(),
            ),
            reference: Some(Reference { region: 0, points: top, axis: Axis::Z, expected: -LOAD * (1.0 - SPACING) / E }),
        })
    }

    /// Create the contact press scenario.
    ///
    /// A rigid plate starts 0.04 above a clamped unit FEM block and is
    /// moved down 0.01 in five steps, solved quasi-statically.
    pub fn contact_press() -> OsteonResult<Self> {
        let block = box_hex_mesh(2, 2, 2, DVec3::ZERO, DVec3::ONE)?;
        let plate = box_hex_mesh(2, 2, 1, DVec3::new(0.0, 0.0, 1.04), DVec3::new(1.0, 1.0, 0.2))?;

        let block_region = deformable(
            "block",
            &block,
            Material::linear_elastic(E, NU, DENSITY),
            vec![plane(Axis::Z, 0.0, BoundaryKind::Fixed, DVec3::ZERO)],
        );
        let plate_region = RegionRequest {
            name: "plate".into(),
            geometry: GeometryRequest::from_domain(&plate),
            material: None,
            method: None,
            boundary_conditions: Vec::new(),
            rigid: Some(RigidRequest {
                pivot: None,
                schedule: RigidMotion::translation(DVec3::new(0.0, 0.0, -0.002)).repeated(5),
            }),
        };

        let mut solver = SolverConfig::default();
        solver.relaxation_tolerance = 1e-3;
        let config = SceneConfig { max_iterations: 50_000, kinetic_energy_tolerance: 1e-4, ..Default::default() };
        let contact = ContactRequest {
            region_a: "plate".into(),
            region_b: "block".into(),
            penalty_stiffness: Some(1e6),
            gap_tolerance: Some(0.05),
            static_friction: 0.0,
            dynamic_friction: 0.0,
        };

        let mut request = single(AdapterKind::Fem, block_region, solver);
        request.regions.push(plate_region);
        request.scene = Some(SceneRequest { config, contacts: vec![contact] });

        Ok(Self { kind: ScenarioKind::ContactPress, request, reference: None })
    }

    /// Create a scenario by kind.
    pub fn from_kind(kind: ScenarioKind) -> OsteonResult<Self> {
        match kind {
            ScenarioKind::UniaxialBar => Self::uniaxial_bar(),
            ScenarioKind::NeoHookeanBar => Self::neo_hookean_bar(),
            ScenarioKind::PeridynamicFracture => Self::peridynamic_fracture(),
            ScenarioKind::MeshfreeCompression => Self::meshfree_compression(),
            ScenarioKind::ContactPress => Self::contact_press(),
        }
    }

    /// Total point count over all regions.
    pub fn point_count(&self) -> usize {
        self.request
            .regions
            .iter()
            .map(|r| match &r.geometry {
                GeometryRequest::Mesh { nodes, .. } => nodes.len(),
                GeometryRequest::Particles { positions, .. } => positions.len(),
            })
            .sum()
    }
}
