//! Integration tests for osteon-material.

use osteon_material::{
    specialize, ConstitutiveLaw, ConstitutiveModel, InternalMaterial, Material, MaterialDatabase,
};
use osteon_math::tensor::entry;
use osteon_math::DMat3;
use osteon_types::{AdapterKind, OsteonError};

const E: f64 = 1.0e6;
const NU: f64 = 0.3;

fn small_shear(gamma: f64) -> DMat3 {
    // F = I + γ e_x ⊗ e_y
    DMat3::from_cols_array(&[1.0, 0.0, 0.0, gamma, 1.0, 0.0, 0.0, 0.0, 1.0])
}

fn uniaxial(stretch: f64) -> DMat3 {
    DMat3::from_diagonal(osteon_math::DVec3::new(stretch, 1.0, 1.0))
}

fn max_abs_diff(a: &DMat3, b: &DMat3) -> f64 {
    let mut m = 0.0_f64;
    for r in 0..3 {
        for c in 0..3 {
            m = m.max((entry(a, r, c) - entry(b, r, c)).abs());
        }
    }
    m
}

/// Central-difference derivative of the energy density.
fn numeric_piola(law: &dyn ConstitutiveLaw, f: &DMat3) -> DMat3 {
    let h = 1e-6;
    let mut cols = f.to_cols_array();
    let mut out = [0.0; 9];
    for k in 0..9 {
        let orig = cols[k];
        cols[k] = orig + h;
        let wp = law.strain_energy_density(&DMat3::from_cols_array(&cols));
        cols[k] = orig - h;
        let wm = law.strain_energy_density(&DMat3::from_cols_array(&cols));
        cols[k] = orig;
        out[k] = (wp - wm) / (2.0 * h);
    }
    DMat3::from_cols_array(&out)
}

// ─── Moduli Tests ─────────────────────────────────────────────

#[test]
fn engineering_conversions() {
    let m = Material::linear_elastic(E, NU, 1000.0);
    assert!((m.shear_modulus() - E / 2.6).abs() < 1e-6);
    assert!((m.bulk_modulus() - E / 1.2).abs() < 1e-6);
    assert!((m.lame_lambda() - E * 0.3 / (1.3 * 0.4)).abs() < 1e-6);
}

#[test]
fn mooney_rivlin_coefficients_from_engineering() {
    let m = Material::mooney_rivlin(E, NU, 1000.0, 0.7);
    let s = specialize(&m, AdapterKind::Fem).unwrap();
    let mu = m.shear_modulus();
    let k = m.bulk_modulus();
    match s.internal {
        InternalMaterial::MooneyRivlin(law) => {
            assert!((law.c10 - 0.7 * mu / 2.0).abs() < 1e-9);
            assert!((law.c01 - 0.3 * mu / 2.0).abs() < 1e-9);
            assert!((law.d1 - 2.0 / k).abs() < 1e-18);
            assert!((law.shear_modulus() - mu).abs() < 1e-6);
        }
        other => panic!("expected Mooney-Rivlin, got {other:?}"),
    }
    assert!(s.projected_from.is_none());
}

#[test]
fn explicit_coefficients_win() {
    let m = Material {
        model: ConstitutiveModel::MooneyRivlin {
            c10: Some(1.0e5),
            c01: Some(2.0e4),
            d1: Some(1.0e-6),
            shear_split: 0.5,
        },
        density: 1000.0,
        youngs_modulus: E,
        poisson_ratio: NU,
    };
    let s = specialize(&m, AdapterKind::Fem).unwrap();
    let InternalMaterial::MooneyRivlin(law) = s.internal else {
        panic!("expected Mooney-Rivlin");
    };
    assert_eq!(law.c10, 1.0e5);
    assert_eq!(law.c01, 2.0e4);
    assert_eq!(law.d1, 1.0e-6);
}

// ─── Specialization Tests ─────────────────────────────────────

#[test]
fn hyperelastic_projects_to_linear_for_particles() {
    for adapter in [AdapterKind::Peridynamics, AdapterKind::Meshfree] {
        let s = specialize(&Material::neo_hookean(E, NU, 1000.0), adapter).unwrap();
        assert_eq!(s.projected_from, Some("neo_hookean"));
        let law = s.internal.linear().unwrap();
        assert!((law.mu - E / 2.6).abs() < 1e-6);
    }
}

#[test]
fn linear_is_copied_for_every_adapter() {
    for adapter in AdapterKind::all() {
        let s = specialize(&Material::linear_elastic(E, NU, 1000.0), *adapter).unwrap();
        assert!(s.projected_from.is_none());
        assert!(s.internal.linear().is_some());
        assert_eq!(s.density, 1000.0);
    }
}

#[test]
fn ogden_default_exponent_matches_neo_hookean() {
    let nh = specialize(&Material::neo_hookean(E, NU, 1000.0), AdapterKind::Fem).unwrap();
    let og = specialize(&Material::ogden(E, NU, 1000.0, 2.0), AdapterKind::Fem).unwrap();
    let f = DMat3::from_cols_array(&[1.1, 0.05, 0.0, 0.02, 0.95, 0.01, 0.0, -0.03, 1.02]);
    let p_nh = nh.internal.first_piola(&f);
    let p_og = og.internal.first_piola(&f);
    assert!(max_abs_diff(&p_nh, &p_og) < 1e-6 * E);
    let w_nh = nh.internal.strain_energy_density(&f);
    let w_og = og.internal.strain_energy_density(&f);
    assert!((w_nh - w_og).abs() < 1e-9 * E);
}

#[test]
fn wave_speed_from_p_wave_modulus() {
    let s = specialize(&Material::linear_elastic(E, NU, 1000.0), AdapterKind::Fem).unwrap();
    let lame = s.lame();
    let expected = ((lame.lambda + 2.0 * lame.mu) / 1000.0).sqrt();
    assert!((s.wave_speed() - expected).abs() < 1e-9 * expected);
}

// ─── Stress Tests ─────────────────────────────────────────────

#[test]
fn reference_configuration_is_stress_free() {
    let materials = [
        Material::linear_elastic(E, NU, 1000.0),
        Material::neo_hookean(E, NU, 1000.0),
        Material::mooney_rivlin(E, NU, 1000.0, 0.5),
        Material::ogden(E, NU, 1000.0, 3.0),
    ];
    for m in &materials {
        let s = specialize(m, AdapterKind::Fem).unwrap();
        let p = s.internal.first_piola(&DMat3::IDENTITY);
        assert!(max_abs_diff(&p, &DMat3::ZERO) < 1e-6, "{} not stress free", m.model.name());
        assert!(s.internal.strain_energy_density(&DMat3::IDENTITY).abs() < 1e-9);
    }
}

#[test]
fn hyperelastic_small_strain_limit_matches_linear() {
    let linear = specialize(&Material::linear_elastic(E, NU, 1000.0), AdapterKind::Fem).unwrap();
    let gamma = 1e-6;
    let f = small_shear(gamma);
    let p_lin = linear.internal.first_piola(&f);
    for m in [
        Material::neo_hookean(E, NU, 1000.0),
        Material::mooney_rivlin(E, NU, 1000.0, 0.3),
        Material::ogden(E, NU, 1000.0, 4.0),
    ] {
        let s = specialize(&m, AdapterKind::Fem).unwrap();
        let p = s.internal.first_piola(&f);
        // Shear stress μγ with relative error O(γ).
        let tau = entry(&p, 0, 1);
        assert!((tau - entry(&p_lin, 0, 1)).abs() < 1e-3 * entry(&p_lin, 0, 1).abs(), "{}", m.model.name());
    }
}

#[test]
fn piola_is_energy_derivative() {
    let f = DMat3::from_cols_array(&[1.08, 0.04, -0.02, 0.03, 0.97, 0.01, 0.0, 0.02, 1.05]);
    for m in [
        Material::linear_elastic(E, NU, 1000.0),
        Material::neo_hookean(E, NU, 1000.0),
        Material::mooney_rivlin(E, NU, 1000.0, 0.6),
        Material::ogden(E, NU, 1000.0, 3.0),
    ] {
        let s = specialize(&m, AdapterKind::Fem).unwrap();
        let analytic = s.internal.first_piola(&f);
        let numeric = numeric_piola(&s.internal, &f);
        assert!(
            max_abs_diff(&analytic, &numeric) < 1e-4 * E,
            "{}: {analytic:?} vs {numeric:?}",
            m.model.name()
        );
    }
}

#[test]
fn uniaxial_stretch_is_tensile() {
    let s = specialize(&Material::neo_hookean(E, NU, 1000.0), AdapterKind::Fem).unwrap();
    let sigma = s.internal.cauchy(&uniaxial(1.1));
    assert!(entry(&sigma, 0, 0) > 0.0);
}

// ─── Validation Tests ─────────────────────────────────────────

#[test]
fn invalid_parameters_rejected() {
    let cases = [
        Material::linear_elastic(-1.0, NU, 1000.0),
        Material::linear_elastic(E, 0.5, 1000.0),
        Material::linear_elastic(E, NU, 0.0),
        Material::mooney_rivlin(E, NU, 1000.0, 1.5),
        Material::ogden(E, NU, 1000.0, 0.0),
    ];
    for m in &cases {
        assert!(matches!(m.validate(), Err(OsteonError::InvalidMaterial(_))));
        assert!(specialize(m, AdapterKind::Fem).is_err());
    }
}

// ─── Serialization Tests ──────────────────────────────────────

#[test]
fn model_defaults_on_deserialize() {
    let json = r#"{"model":{"type":"mooney_rivlin"},"density":1000.0,"youngs_modulus":1e6,"poisson_ratio":0.3}"#;
    let m: Material = serde_json::from_str(json).unwrap();
    assert_eq!(
        m.model,
        ConstitutiveModel::MooneyRivlin { c10: None, c01: None, d1: None, shear_split: 0.5 }
    );

    let toml_src = r#"
density = 1100.0
youngs_modulus = 5.0e6
poisson_ratio = 0.45

[model]
type = "ogden"
"#;
    let m: Material = toml::from_str(toml_src).unwrap();
    assert_eq!(m.model, ConstitutiveModel::Ogden { alpha: 2.0, mu: None });
}

// ─── Database Tests ───────────────────────────────────────────

#[test]
fn presets_are_valid() {
    let db = MaterialDatabase::with_defaults();
    assert_eq!(db.len(), 7);
    for name in db.names() {
        db.get(name).unwrap().validate().unwrap();
    }
    assert!(db.get("cortical_bone").is_some());
    assert!(db.get("unobtainium").is_none());
}
