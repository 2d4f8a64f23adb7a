//! The user-facing material description.

use osteon_types::{OsteonError, OsteonResult};
use serde::{Deserialize, Serialize};

fn default_shear_split() -> f64 {
    0.5
}

fn default_alpha() -> f64 {
    2.0
}

/// Constitutive model tag with model-specific coefficients.
///
/// Coefficients left as `None` are derived from `(E, ν)` at specialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstitutiveModel {
    LinearElastic,
    NeoHookean,
    MooneyRivlin {
        #[serde(default)]
        c10: Option<f64>,
        #[serde(default)]
        c01: Option<f64>,
        #[serde(default)]
        d1: Option<f64>,
        /// Fraction of the shear modulus carried by `C10`.
        #[serde(default = "default_shear_split")]
        shear_split: f64,
    },
    /// One-term Ogden with volumetric penalty.
    Ogden {
        #[serde(default = "default_alpha")]
        alpha: f64,
        #[serde(default)]
        mu: Option<f64>,
    },
}

impl ConstitutiveModel {
    pub fn name(&self) -> &'static str {
        match self {
            ConstitutiveModel::LinearElastic => "linear_elastic",
            ConstitutiveModel::NeoHookean => "neo_hookean",
            ConstitutiveModel::MooneyRivlin { .. } => "mooney_rivlin",
            ConstitutiveModel::Ogden { .. } => "ogden",
        }
    }

    pub fn is_hyperelastic(&self) -> bool {
        !matches!(self, ConstitutiveModel::LinearElastic)
    }
}

/// Constitutive parameters, independent of any solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub model: ConstitutiveModel,
    /// Mass density (kg/m³).
    pub density: f64,
    /// Young's modulus (Pa).
    pub youngs_modulus: f64,
    /// Poisson's ratio, in (-1, 0.5).
    pub poisson_ratio: f64,
}

impl Material {
    pub fn linear_elastic(youngs_modulus: f64, poisson_ratio: f64, density: f64) -> Self {
        Self {
            model: ConstitutiveModel::LinearElastic,
            density,
            youngs_modulus,
            poisson_ratio,
        }
    }

    pub fn neo_hookean(youngs_modulus: f64, poisson_ratio: f64, density: f64) -> Self {
        Self {
            model: ConstitutiveModel::NeoHookean,
            density,
            youngs_modulus,
            poisson_ratio,
        }
    }

    /// Mooney-Rivlin with coefficients derived from `(E, ν)`.
    pub fn mooney_rivlin(youngs_modulus: f64, poisson_ratio: f64, density: f64, shear_split: f64) -> Self {
        Self {
            model: ConstitutiveModel::MooneyRivlin {
                c10: None,
                c01: None,
                d1: None,
                shear_split,
            },
            density,
            youngs_modulus,
            poisson_ratio,
        }
    }

    pub fn ogden(youngs_modulus: f64, poisson_ratio: f64, density: f64, alpha: f64) -> Self {
        Self {
            model: ConstitutiveModel::Ogden { alpha, mu: None },
            density,
            youngs_modulus,
            poisson_ratio,
        }
    }

    /// Shear modulus `μ = E / 2(1+ν)`.
    pub fn shear_modulus(&self) -> f64 {
        self.youngs_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }

    /// Bulk modulus `K = E / 3(1−2ν)`.
    pub fn bulk_modulus(&self) -> f64 {
        self.youngs_modulus / (3.0 * (1.0 - 2.0 * self.poisson_ratio))
    }

    /// First Lamé parameter `λ = Eν / (1+ν)(1−2ν)`.
    pub fn lame_lambda(&self) -> f64 {
        let (e, nu) = (self.youngs_modulus, self.poisson_ratio);
        e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu))
    }

    /// Checks parameter ranges and coefficient consistency.
    pub fn validate(&self) -> OsteonResult<()> {
        let bad = |msg: String| Err(OsteonError::InvalidMaterial(msg));
        if !(self.youngs_modulus.is_finite() && self.youngs_modulus > 0.0) {
            return bad(format!("Young's modulus must be positive, got {}", self.youngs_modulus));
        }
        if !(self.poisson_ratio > -1.0 && self.poisson_ratio < 0.5) {
            return bad(format!("Poisson's ratio must lie in (-1, 0.5), got {}", self.poisson_ratio));
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            return bad(format!("density must be positive, got {}", self.density));
        }
        match &self.model {
            ConstitutiveModel::LinearElastic | ConstitutiveModel::NeoHookean => {}
            ConstitutiveModel::MooneyRivlin { c10, c01, d1, shear_split } => {
                if !(0.0..=1.0).contains(shear_split) {
                    return bad(format!("Mooney-Rivlin shear split must lie in [0, 1], got {shear_split}"));
                }
                for (name, c) in [("C10", c10), ("C01", c01)] {
                    if let Some(c) = c {
                        if !c.is_finite() {
                            return bad(format!("Mooney-Rivlin {name} is not finite"));
                        }
                    }
                }
                if let (Some(a), Some(b)) = (c10, c01) {
                    if a + b <= 0.0 {
                        return bad(format!("Mooney-Rivlin C10 + C01 must be positive, got {}", a + b));
                    }
                }
                if let Some(d) = d1 {
                    if !(d.is_finite() && *d > 0.0) {
                        return bad(format!("Mooney-Rivlin D1 must be positive, got {d}"));
                    }
                }
            }
            ConstitutiveModel::Ogden { alpha, mu } => {
                if !alpha.is_finite() || *alpha == 0.0 {
                    return bad(format!("Ogden exponent must be finite and non-zero, got {alpha}"));
                }
                if let Some(mu) = mu {
                    if !(mu.is_finite() && *mu > 0.0) {
                        return bad(format!("Ogden mu must be positive, got {mu}"));
                    }
                }
            }
        }
        Ok(())
    }
}
