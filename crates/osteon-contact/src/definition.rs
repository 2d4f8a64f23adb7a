//! Contact definitions and their resolved parameters.

use osteon_domain::Spacing;
use osteon_types::constants::GAP_TOLERANCE_FACTOR;
use osteon_types::{BodyId, OsteonError, OsteonResult};
use serde::{Deserialize, Serialize};

/// A contact between two bodies of a scene.
///
/// `penalty_stiffness` and `gap_tolerance` are estimated from the bodies
/// when left unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDefinition {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Penalty stiffness per unit contact area [Pa/m].
    #[serde(default)]
    pub penalty_stiffness: Option<f64>,
    /// Distance below which a pair is in contact.
    #[serde(default)]
    pub gap_tolerance: Option<f64>,
    #[serde(default)]
    pub static_friction: f64,
    #[serde(default)]
    pub dynamic_friction: f64,
}

impl ContactDefinition {
    /// Frictionless contact with estimated penalty and tolerance.
    pub fn new(body_a: impl Into<BodyId>, body_b: impl Into<BodyId>) -> Self {
        Self {
            body_a: body_a.into(),
            body_b: body_b.into(),
            penalty_stiffness: None,
            gap_tolerance: None,
            static_friction: 0.0,
            dynamic_friction: 0.0,
        }
    }

    pub fn with_friction(mut self, static_friction: f64, dynamic_friction: f64) -> Self {
        self.static_friction = static_friction;
        self.dynamic_friction = dynamic_friction;
        self
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty_stiffness = Some(penalty);
        self
    }

    pub fn with_gap_tolerance(mut self, gap: f64) -> Self {
        self.gap_tolerance = Some(gap);
        self
    }

    /// Checks body references and coefficient ranges.
    pub fn validate(&self, body_count: usize) -> OsteonResult<()> {
        for id in [self.body_a, self.body_b] {
            if id.index() >= body_count {
                return Err(OsteonError::InvalidContact(format!(
                    "body {} does not exist (scene has {body_count} bodies)",
                    id.0
                )));
            }
        }
        if self.body_a == self.body_b {
            return Err(OsteonError::InvalidContact(format!("body {} is in contact with itself", self.body_a.0)));
        }
        for (name, mu) in [("static", self.static_friction), ("dynamic", self.dynamic_friction)] {
            if !(0.0..=1.0).contains(&mu) {
                return Err(OsteonError::InvalidContact(format!(
                    "{name} friction coefficient {mu} is outside [0, 1]"
                )));
            }
        }
        if let Some(k) = self.penalty_stiffness {
            if !(k > 0.0 && k.is_finite()) {
                return Err(OsteonError::InvalidContact(format!("penalty stiffness must be positive, got {k}")));
            }
        }
        if let Some(g) = self.gap_tolerance {
            if !(g > 0.0 && g.is_finite()) {
                return Err(OsteonError::InvalidContact(format!("gap tolerance must be positive, got {g}")));
            }
        }
        Ok(())
    }
}

/// Resolved contact law coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactParameters {
    pub penalty: f64,
    pub gap_tolerance: f64,
    pub static_friction: f64,
    pub dynamic_friction: f64,
    /// Fraction of critical damping on the normal relative velocity.
    pub damping_ratio: f64,
    /// Tangential (stick) stiffness as a fraction of the normal penalty.
    pub tangential_factor: f64,
}

impl ContactParameters {
    /// Fills the unset fields of `def`.
    ///
    /// `moduli` holds the Young's modulus of each body, `None` for rigid
    /// bodies. Penalty defaults to `mean(E) / mean(spacing)` and the gap
    /// tolerance to `1.5 × max(spacing)`. A rigid/rigid pair needs an
    /// explicit penalty.
    pub fn resolve(
        def: &ContactDefinition,
        moduli: [Option<f64>; 2],
        spacings: [Spacing; 2],
        damping_ratio: f64,
        tangential_factor: f64,
    ) -> OsteonResult<Self> {
        if !(damping_ratio >= 0.0) || !(tangential_factor >= 0.0) {
            return Err(OsteonError::InvalidContact(format!(
                "damping ratio ({damping_ratio}) and tangential factor ({tangential_factor}) must be non-negative"
            )));
        }

        let mean_spacing = 0.5 * (spacings[0].mean + spacings[1].mean);
        let penalty = match def.penalty_stiffness {
            Some(k) => k,
            None => {
                let known: Vec<f64> = moduli.iter().flatten().copied().collect();
                if known.is_empty() {
                    return Err(OsteonError::InvalidContact(format!(
                        "bodies {} and {} are both rigid; a penalty stiffness is required",
                        def.body_a.0, def.body_b.0
                    )));
                }
                let mean_e = known.iter().sum::<f64>() / known.len() as f64;
                mean_e / mean_spacing
            }
        };
        let gap_tolerance = def
            .gap_tolerance
            .unwrap_or(GAP_TOLERANCE_FACTOR * spacings[0].max.max(spacings[1].max));

        if !(penalty > 0.0 && penalty.is_finite()) || !(gap_tolerance > 0.0 && gap_tolerance.is_finite()) {
            return Err(OsteonError::InvalidContact(format!(
                "could not estimate contact parameters (penalty {penalty}, gap tolerance {gap_tolerance})"
            )));
        }

        Ok(Self {
            penalty,
            gap_tolerance,
            static_friction: def.static_friction,
            dynamic_friction: def.dynamic_friction,
            damping_ratio,
            tangential_factor,
        })
    }
}
