//! Contact response: pairs to forces.

use std::collections::HashMap;

use osteon_math::DVec3;
use osteon_types::constants::EPSILON;
use osteon_types::OsteonResult;

use crate::contact::ContactPair;
use crate::definition::ContactParameters;
use crate::surface::{effective_mass, ContactSurface};

/// Summary of one contact evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactResult {
    /// Pairs carrying a non-zero force.
    pub active_pairs: u32,
    /// Deepest interpenetration among the detected pairs.
    pub max_penetration: f64,
    /// Sum of normal force magnitudes.
    pub normal_force: f64,
    pub sticking: u32,
    pub slipping: u32,
}

/// Forces produced by one contact evaluation, keyed by point index.
#[derive(Debug, Clone, Default)]
pub struct ContactForces {
    pub on_a: Vec<(usize, DVec3)>,
    pub on_b: Vec<(usize, DVec3)>,
    pub result: ContactResult,
}

impl ContactForces {
    pub fn total_on_a(&self) -> DVec3 {
        self.on_a.iter().map(|(_, f)| *f).sum()
    }

    pub fn total_on_b(&self) -> DVec3 {
        self.on_b.iter().map(|(_, f)| *f).sum()
    }

    /// Net force over both bodies. Zero up to rounding.
    pub fn net(&self) -> DVec3 {
        self.total_on_a() + self.total_on_b()
    }

    pub fn is_empty(&self) -> bool {
        self.on_a.is_empty()
    }
}

/// Trait for contact response strategies.
///
/// # Implementations
/// - `PenaltyFriction` — penalty normal force, normal damping, regularized Coulomb friction
pub trait ContactResponse: Send {
    /// Turns detected pairs into forces. Every force on A is matched by an
    /// equal and opposite force on B.
    fn resolve(
        &mut self,
        pairs: &[ContactPair],
        a: &ContactSurface,
        b: &ContactSurface,
    ) -> OsteonResult<ContactForces>;

    /// Drops any state carried between evaluations.
    fn reset(&mut self);

    /// Returns the response strategy name.
    fn name(&self) -> &str;
}

/// Penalty contact with Coulomb friction.
///
/// Normal: `f_n = max(0, k·A·(g_tol − g) − 2ξ√(k·A·m_eff)·v_n)`.
/// Tangential: an elastic spring `k_t = factor·k·A` anchored where the pair
/// first touched. While `|f_t| ≤ μ_s·f_n` the pair sticks; beyond it the
/// pair slips with `μ_d·f_n` against the tangential relative velocity and
/// the anchor is moved so the spring holds the slip force.
#[derive(Debug, Clone)]
pub struct PenaltyFriction {
    params: ContactParameters,
    anchors: HashMap<(usize, usize), DVec3>,
}

impl PenaltyFriction {
    pub fn new(params: ContactParameters) -> Self {
        Self { params, anchors: HashMap::new() }
    }

    pub fn params(&self) -> &ContactParameters {
        &self.params
    }

    /// Pairs currently remembering a stick anchor.
    pub fn tracked_pairs(&self) -> usize {
        self.anchors.len()
    }
}

impl ContactResponse for PenaltyFriction {
    fn resolve(
        &mut self,
        pairs: &[ContactPair],
        a: &ContactSurface,
        b: &ContactSurface,
    ) -> OsteonResult<ContactForces> {
        let p = self.params;
        let k = p.penalty * a.area;
        let kt = p.tangential_factor * k;

        let mut out = ContactForces::default();
        let mut b_slots: HashMap<usize, usize> = HashMap::new();
        let mut anchors = HashMap::with_capacity(pairs.len());

        for pair in pairs {
            let n = pair.normal;
            let overlap = p.gap_tolerance - pair.gap;
            let v_rel = a.velocities[pair.a_slot] - b.velocities[pair.b_slot];
            let v_n = v_rel.dot(n);
            let m_eff = effective_mass(a.masses[pair.a_slot], b.masses[pair.b_slot]);
            let damping = 2.0 * p.damping_ratio * (k * m_eff).sqrt();
            let f_n = (k * overlap - damping * v_n).max(0.0);

            let d = a.positions[pair.a_slot] - b.positions[pair.b_slot];
            let key = (pair.a, pair.b);
            let anchor = self.anchors.get(&key).copied().unwrap_or(d);
            let slide = d - anchor;
            let slide_t = slide - n * slide.dot(n);
            let mut f_t = -kt * slide_t;

            if f_t.length() <= p.static_friction * f_n {
                out.result.sticking += 1;
                anchors.insert(key, anchor);
            } else {
                out.result.slipping += 1;
                let v_t = v_rel - n * v_n;
                let dir = if v_t.length() > EPSILON { -v_t.normalize() } else { f_t.normalize_or_zero() };
                f_t = dir * (p.dynamic_friction * f_n);
                let moved = if kt > 0.0 { d + f_t / kt } else { d };
                anchors.insert(key, moved);
            }

            out.result.max_penetration = out.result.max_penetration.max(pair.penetration_depth());
            let force = n * f_n + f_t;
            if force == DVec3::ZERO {
                continue;
            }
            out.result.active_pairs += 1;
            out.result.normal_force += f_n;
            out.on_a.push((pair.a, force));
            let slot = *b_slots.entry(pair.b).or_insert_with(|| {
                out.on_b.push((pair.b, DVec3::ZERO));
                out.on_b.len() - 1
            });
            out.on_b[slot].1 -= force;
        }

        self.anchors = anchors;
        Ok(out)
    }

    fn reset(&mut self) {
        self.anchors.clear();
    }

    fn name(&self) -> &str {
        "penalty_friction"
    }
}
