//! Contact pair data type.

use osteon_math::DVec3;
use serde::{Deserialize, Serialize};

/// A boundary point of body A matched with its nearest boundary point of body B.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactPair {
    /// Point index in body A.
    pub a: usize,
    /// Point index in body B.
    pub b: usize,
    /// Slot of `a` in surface A.
    pub a_slot: usize,
    /// Slot of `b` in surface B.
    pub b_slot: usize,
    /// Outward normal of B at `b` (unit).
    pub normal: DVec3,
    /// Signed distance of A's point along `normal` (negative = penetration).
    pub gap: f64,
}

impl ContactPair {
    /// Interpenetration depth, zero while the points are separated.
    pub fn penetration_depth(&self) -> f64 {
        (-self.gap).max(0.0)
    }
}
