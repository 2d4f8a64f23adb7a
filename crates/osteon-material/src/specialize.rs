//! Binding a [`Material`] to an adapter.

use osteon_math::DMat3;
use osteon_types::{AdapterKind, OsteonResult};
use tracing::warn;

use crate::laws::{ConstitutiveLaw, LinearElasticLaw, MooneyRivlinLaw, NeoHookeanLaw, OgdenLaw};
use crate::model::{ConstitutiveModel, Material};

/// Adapter-internal constitutive law. Closed set, dispatched by `match`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InternalMaterial {
    LinearElastic(LinearElasticLaw),
    NeoHookean(NeoHookeanLaw),
    MooneyRivlin(MooneyRivlinLaw),
    Ogden(OgdenLaw),
}

macro_rules! dispatch {
    ($self:ident, $law:ident => $body:expr) => {
        match $self {
            InternalMaterial::LinearElastic($law) => $body,
            InternalMaterial::NeoHookean($law) => $body,
            InternalMaterial::MooneyRivlin($law) => $body,
            InternalMaterial::Ogden($law) => $body,
        }
    };
}

impl InternalMaterial {
    /// Lamé parameters when the law is linear.
    pub fn linear(&self) -> Option<LinearElasticLaw> {
        match self {
            InternalMaterial::LinearElastic(l) => Some(*l),
            _ => None,
        }
    }
}

impl ConstitutiveLaw for InternalMaterial {
    fn first_piola(&self, f: &DMat3) -> DMat3 {
        dispatch!(self, law => law.first_piola(f))
    }

    fn strain_energy_density(&self, f: &DMat3) -> f64 {
        dispatch!(self, law => law.strain_energy_density(f))
    }

    fn shear_modulus(&self) -> f64 {
        dispatch!(self, law => law.shear_modulus())
    }

    fn bulk_modulus(&self) -> f64 {
        dispatch!(self, law => law.bulk_modulus())
    }

    fn name(&self) -> &'static str {
        dispatch!(self, law => law.name())
    }

    fn cauchy(&self, f: &DMat3) -> DMat3 {
        dispatch!(self, law => law.cauchy(f))
    }
}

/// A material bound to one adapter kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Specialized {
    pub internal: InternalMaterial,
    pub density: f64,
    pub youngs_modulus: f64,
    pub poisson_ratio: f64,
    /// Name of the hyperelastic model that was replaced by its linear
    /// projection, if any.
    pub projected_from: Option<&'static str>,
}

impl Specialized {
    /// Linearized Lamé parameters of the underlying `(E, ν)`.
    pub fn lame(&self) -> LinearElasticLaw {
        LinearElasticLaw::from_engineering(self.youngs_modulus, self.poisson_ratio)
    }

    /// Dilatational wave speed `sqrt((K + 4μ/3) / ρ)` of the bound law.
    pub fn wave_speed(&self) -> f64 {
        (self.internal.p_wave_modulus() / self.density).sqrt()
    }
}

/// Specializes `material` for `adapter`.
///
/// Linear elasticity is copied through. Hyperelastic models become their
/// native parameters under the mesh-based adapter and fall back to the
/// linear-elastic projection of the same `(E, ν)` under particle adapters.
pub fn specialize(material: &Material, adapter: AdapterKind) -> OsteonResult<Specialized> {
    material.validate()?;

    let mu = material.shear_modulus();
    let kappa = material.bulk_modulus();
    let linear = InternalMaterial::LinearElastic(LinearElasticLaw::from_engineering(
        material.youngs_modulus,
        material.poisson_ratio,
    ));

    let mut projected_from = None;
    let internal = if !material.model.is_hyperelastic() {
        linear
    } else if !adapter.is_mesh_based() {
        warn!(
            model = material.model.name(),
            adapter = adapter.name(),
            "hyperelastic model not supported by adapter, using linear-elastic projection"
        );
        projected_from = Some(material.model.name());
        linear
    } else {
        match &material.model {
            ConstitutiveModel::LinearElastic => linear,
            ConstitutiveModel::NeoHookean => InternalMaterial::NeoHookean(NeoHookeanLaw { mu, kappa }),
            ConstitutiveModel::MooneyRivlin { c10, c01, d1, shear_split } => {
                InternalMaterial::MooneyRivlin(MooneyRivlinLaw {
                    c10: c10.unwrap_or(shear_split * mu / 2.0),
                    c01: c01.unwrap_or((1.0 - shear_split) * mu / 2.0),
                    d1: d1.unwrap_or(2.0 / kappa),
                })
            }
            ConstitutiveModel::Ogden { alpha, mu: explicit_mu } => InternalMaterial::Ogden(OgdenLaw {
                mu: explicit_mu.unwrap_or(mu),
                alpha: *alpha,
                kappa,
            }),
        }
    };

    Ok(Specialized {
        internal,
        density: material.density,
        youngs_modulus: material.youngs_modulus,
        poisson_ratio: material.poisson_ratio,
        projected_from,
    })
}
