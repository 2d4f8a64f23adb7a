//! # osteon-material
//!
//! Solver-agnostic material descriptions and their adapter-specific forms.
//!
//! ## Design
//!
//! A [`Material`] carries density, `(E, ν)` and a [`ConstitutiveModel`]
//! tag. It is specialized exactly once, when a solver binds it, by
//! [`specialize`]. Mesh-based adapters receive the native hyperelastic
//! parameters; particle adapters receive the linear-elastic projection of
//! the same `(E, ν)`, flagged in [`Specialized::projected_from`].
//!
//! Every specialized law implements [`ConstitutiveLaw`], mapping a
//! deformation gradient to the first Piola-Kirchhoff stress.

pub mod database;
pub mod laws;
pub mod model;
pub mod specialize;

pub use database::MaterialDatabase;
pub use laws::{ConstitutiveLaw, LinearElasticLaw, MooneyRivlinLaw, NeoHookeanLaw, OgdenLaw};
pub use model::{ConstitutiveModel, Material};
pub use specialize::{specialize, InternalMaterial, Specialized};
