//! Local stress update shared by the particle adapters.

use osteon_material::LinearElasticLaw;
use osteon_math::tensor::{ddot, sym, trace};
use osteon_math::DMat3;

use crate::config::StressMeasure;

impl StressMeasure {
    /// Strain tensor of `f` under this measure.
    fn strain(&self, f: &DMat3) -> DMat3 {
        match self {
            StressMeasure::SmallStrain => sym(&(*f - DMat3::IDENTITY)),
            StressMeasure::StVenantKirchhoff => (f.transpose() * *f - DMat3::IDENTITY) * 0.5,
        }
    }

    /// First Piola-Kirchhoff stress.
    pub fn first_piola(&self, law: &LinearElasticLaw, f: &DMat3) -> DMat3 {
        let s = law.stress(&self.strain(f));
        match self {
            StressMeasure::SmallStrain => s,
            StressMeasure::StVenantKirchhoff => *f * s,
        }
    }

    pub fn energy_density(&self, law: &LinearElasticLaw, f: &DMat3) -> f64 {
        let e = self.strain(f);
        0.5 * law.lambda * trace(&e).powi(2) + law.mu * ddot(&e, &e)
    }

    pub fn cauchy(&self, law: &LinearElasticLaw, f: &DMat3) -> DMat3 {
        let p = self.first_piola(law, f);
        match self {
            StressMeasure::SmallStrain => p,
            StressMeasure::StVenantKirchhoff => {
                let j = f.determinant();
                if j.abs() < 1e-12 {
                    p
                } else {
                    p * f.transpose() * (1.0 / j)
                }
            }
        }
    }
}
