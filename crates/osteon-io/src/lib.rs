//! # osteon-io
//!
//! Analysis request/response contract and the runner that turns a request
//! into solved regions.
//!
//! Defines the boundary types an orchestration layer (CLI, service, batch
//! pipeline) uses to talk to the osteon core. Geometry arrives already
//! meshed or voxelized; nothing here segments, meshes or renders.
//!
//! ## Flow
//!
//! ```text
//! JSON ──► AnalysisRequest ──► validate_request ──► run ──► AnalysisResponse ──► JSON / bincode
//! ```
//!
//! ## Key Types
//!
//! - [`AnalysisRequest`] — Regions, default method, solver settings, optional scene.
//! - [`RegionRequest`] — Geometry, material, boundary conditions of one region.
//! - [`AnalysisResponse`] — Per-region results plus a backend/timing summary.

pub mod contract;
pub mod encoding;
pub mod runner;
pub mod validator;

pub use contract::{
    AnalysisRequest, AnalysisResponse, BoundaryRequest, BoundaryTarget, ContactRequest, GeometryRequest,
    MaterialRequest, RegionRequest, RegionResult, RigidRequest, RunSummary, RuntimeSettings, SceneRequest,
};
pub use encoding::{from_json, read_request, to_binary, to_json, write_response};
pub use runner::{execute, run};
pub use validator::validate_request;
