//! Specialized constitutive laws.
//!
//! All laws take the deformation gradient `F` and return the first
//! Piola-Kirchhoff stress `P`. Hyperelastic laws use the isochoric split
//! `F̄ = J^{-1/3} F` with a volumetric penalty.

use osteon_math::eigen::symmetric_eigen3;
use osteon_math::tensor::{ddot, outer, sym, trace};
use osteon_math::DMat3;
use serde::{Deserialize, Serialize};

/// Strategy trait for stress evaluation.
pub trait ConstitutiveLaw: Send + Sync {
    /// First Piola-Kirchhoff stress.
    fn first_piola(&self, f: &DMat3) -> DMat3;

    /// Strain energy per unit reference volume.
    fn strain_energy_density(&self, f: &DMat3) -> f64;

    /// Small-strain shear modulus.
    fn shear_modulus(&self) -> f64;

    /// Small-strain bulk modulus.
    fn bulk_modulus(&self) -> f64;

    fn name(&self) -> &'static str;

    /// Cauchy stress `σ = P Fᵀ / J`.
    fn cauchy(&self, f: &DMat3) -> DMat3 {
        let j = f.determinant();
        self.first_piola(f) * f.transpose() * (1.0 / j)
    }

    /// P-wave modulus `K + 4μ/3`, used for wave-speed estimates.
    fn p_wave_modulus(&self) -> f64 {
        self.bulk_modulus() + 4.0 / 3.0 * self.shear_modulus()
    }
}

// ─── Linear elastic ───────────────────────────────────────────

/// Small-strain isotropic elasticity, `σ = λ tr(ε) I + 2μ ε`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearElasticLaw {
    pub lambda: f64,
    pub mu: f64,
}

impl LinearElasticLaw {
    pub fn from_engineering(youngs_modulus: f64, poisson_ratio: f64) -> Self {
        let (e, nu) = (youngs_modulus, poisson_ratio);
        Self {
            lambda: e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu)),
            mu: e / (2.0 * (1.0 + nu)),
        }
    }

    /// Stress for a given small strain.
    pub fn stress(&self, strain: &DMat3) -> DMat3 {
        DMat3::IDENTITY * (self.lambda * trace(strain)) + *strain * (2.0 * self.mu)
    }
}

impl ConstitutiveLaw for LinearElasticLaw {
    fn first_piola(&self, f: &DMat3) -> DMat3 {
        self.stress(&sym(&(*f - DMat3::IDENTITY)))
    }

    fn strain_energy_density(&self, f: &DMat3) -> f64 {
        let eps = sym(&(*f - DMat3::IDENTITY));
        let tr = trace(&eps);
        0.5 * self.lambda * tr * tr + self.mu * ddot(&eps, &eps)
    }

    fn shear_modulus(&self) -> f64 {
        self.mu
    }

    fn bulk_modulus(&self) -> f64 {
        self.lambda + 2.0 / 3.0 * self.mu
    }

    fn name(&self) -> &'static str {
        "linear_elastic"
    }

    fn cauchy(&self, f: &DMat3) -> DMat3 {
        self.first_piola(f)
    }
}

// ─── Neo-Hookean ──────────────────────────────────────────────

/// Compressible Neo-Hookean, `W = μ/2 (Ī₁ − 3) + κ/2 (J − 1)²`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeoHookeanLaw {
    pub mu: f64,
    pub kappa: f64,
}

impl ConstitutiveLaw for NeoHookeanLaw {
    fn first_piola(&self, f: &DMat3) -> DMat3 {
        let j = f.determinant();
        let f_inv_t = f.inverse().transpose();
        let i1 = ddot(f, f);
        let dev = (*f - f_inv_t * (i1 / 3.0)) * (self.mu * j.powf(-2.0 / 3.0));
        dev + f_inv_t * (self.kappa * (j - 1.0) * j)
    }

    fn strain_energy_density(&self, f: &DMat3) -> f64 {
        let j = f.determinant();
        let i1_bar = j.powf(-2.0 / 3.0) * ddot(f, f);
        0.5 * self.mu * (i1_bar - 3.0) + 0.5 * self.kappa * (j - 1.0).powi(2)
    }

    fn shear_modulus(&self) -> f64 {
        self.mu
    }

    fn bulk_modulus(&self) -> f64 {
        self.kappa
    }

    fn name(&self) -> &'static str {
        "neo_hookean"
    }
}

// ─── Mooney-Rivlin ────────────────────────────────────────────

/// Two-parameter Mooney-Rivlin,
/// `W = C10 (Ī₁ − 3) + C01 (Ī₂ − 3) + (J − 1)² / D1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MooneyRivlinLaw {
    pub c10: f64,
    pub c01: f64,
    pub d1: f64,
}

impl ConstitutiveLaw for MooneyRivlinLaw {
    fn first_piola(&self, f: &DMat3) -> DMat3 {
        let j = f.determinant();
        let f_inv_t = f.inverse().transpose();
        let c = f.transpose() * *f;
        let i1 = trace(&c);
        let i2 = 0.5 * (i1 * i1 - ddot(&c, &c));

        let d_i1_bar = (*f * 2.0 - f_inv_t * (2.0 / 3.0 * i1)) * j.powf(-2.0 / 3.0);
        let d_i2_bar = ((*f * i1 - *f * c) * 2.0 - f_inv_t * (4.0 / 3.0 * i2)) * j.powf(-4.0 / 3.0);
        let vol = f_inv_t * (2.0 / self.d1 * (j - 1.0) * j);

        d_i1_bar * self.c10 + d_i2_bar * self.c01 + vol
    }

    fn strain_energy_density(&self, f: &DMat3) -> f64 {
        let j = f.determinant();
        let c = f.transpose() * *f;
        let i1 = trace(&c);
        let i2 = 0.5 * (i1 * i1 - ddot(&c, &c));
        let i1_bar = j.powf(-2.0 / 3.0) * i1;
        let i2_bar = j.powf(-4.0 / 3.0) * i2;
        self.c10 * (i1_bar - 3.0) + self.c01 * (i2_bar - 3.0) + (j - 1.0).powi(2) / self.d1
    }

    fn shear_modulus(&self) -> f64 {
        2.0 * (self.c10 + self.c01)
    }

    fn bulk_modulus(&self) -> f64 {
        2.0 / self.d1
    }

    fn name(&self) -> &'static str {
        "mooney_rivlin"
    }
}

// ─── Ogden ────────────────────────────────────────────────────

/// One-term Ogden, `W = 2μ/α² Σ(λ̄ₐ^α − 1) + κ/2 (J − 1)²`.
///
/// `α = 2` reproduces Neo-Hookean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OgdenLaw {
    pub mu: f64,
    pub alpha: f64,
    pub kappa: f64,
}

impl OgdenLaw {
    /// Principal stretches and directions of `b = F Fᵀ`.
    fn principal(f: &DMat3) -> ([f64; 3], [osteon_math::DVec3; 3]) {
        let b = *f * f.transpose();
        let (eig, dirs) = symmetric_eigen3(&b);
        (eig.map(|v| v.max(0.0).sqrt()), dirs)
    }
}

impl ConstitutiveLaw for OgdenLaw {
    fn first_piola(&self, f: &DMat3) -> DMat3 {
        let j = f.determinant();
        let (stretch, dirs) = Self::principal(f);
        let scale = j.powf(-1.0 / 3.0);
        let powered = stretch.map(|l| (l * scale).powf(self.alpha));
        let mean = powered.iter().sum::<f64>() / 3.0;
        let vol = self.kappa * j * (j - 1.0);

        let mut tau = DMat3::ZERO;
        for a in 0..3 {
            let tau_a = 2.0 * self.mu / self.alpha * (powered[a] - mean) + vol;
            tau += outer(dirs[a], dirs[a]) * tau_a;
        }
        tau * f.inverse().transpose()
    }

    fn strain_energy_density(&self, f: &DMat3) -> f64 {
        let j = f.determinant();
        let (stretch, _) = Self::principal(f);
        let scale = j.powf(-1.0 / 3.0);
        let sum: f64 = stretch.iter().map(|l| (l * scale).powf(self.alpha) - 1.0).sum();
        2.0 * self.mu / (self.alpha * self.alpha) * sum + 0.5 * self.kappa * (j - 1.0).powi(2)
    }

    fn shear_modulus(&self) -> f64 {
        self.mu
    }

    fn bulk_modulus(&self) -> f64 {
        self.kappa
    }

    fn name(&self) -> &'static str {
        "ogden"
    }
}
