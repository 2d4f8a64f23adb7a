//! Small shared enums and identifiers.

use serde::{Deserialize, Serialize};

/// Numerical method a body is discretized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Mesh-based finite elements.
    Fem,
    /// Correspondence (non-ordinary state-based) peridynamics.
    Peridynamics,
    /// Stabilized meshfree Galerkin (reproducing kernel particles).
    Meshfree,
}

impl AdapterKind {
    /// Returns all method kinds.
    pub fn all() -> &'static [AdapterKind] {
        &[AdapterKind::Fem, AdapterKind::Peridynamics, AdapterKind::Meshfree]
    }

    /// Returns a short human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            AdapterKind::Fem => "fem",
            AdapterKind::Peridynamics => "peridynamics",
            AdapterKind::Meshfree => "meshfree",
        }
    }

    /// True for methods that discretize with elements rather than particles.
    pub fn is_mesh_based(&self) -> bool {
        matches!(self, AdapterKind::Fem)
    }
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index (0, 1, 2).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// All three axes in order.
    pub fn all() -> [Axis; 3] {
        [Axis::X, Axis::Y, Axis::Z]
    }
}

/// Index of a body inside a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for BodyId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}
