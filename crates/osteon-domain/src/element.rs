//! Element kinds and their local topology.
//!
//! Node ordering follows the VTK convention. For `Hex8`:
//!
//! ```text
//!        7 -------- 6
//!       /|         /|
//!      4 -------- 5 |
//!      | 3 -------|-2
//!      |/         |/
//!      0 -------- 1
//! ```

use serde::{Deserialize, Serialize};

/// Linear element family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// 4-node tetrahedron.
    Tet4,
    /// 8-node hexahedron.
    Hex8,
    /// 3-node triangle (plane strain).
    Tri3,
    /// 4-node quadrilateral (plane strain).
    Quad4,
}

const TET4_FACES: &[&[usize]] = &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[0, 3, 2]];
const HEX8_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];
const TRI3_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];
const QUAD4_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];

const TET4_EDGES: &[[usize; 2]] = &[[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];
const HEX8_EDGES: &[[usize; 2]] = &[
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

impl ElementKind {
    /// Nodes per element.
    pub fn nodes_per_element(&self) -> usize {
        match self {
            ElementKind::Tet4 => 4,
            ElementKind::Hex8 => 8,
            ElementKind::Tri3 => 3,
            ElementKind::Quad4 => 4,
        }
    }

    /// True for 3D solid elements, false for plane-strain elements.
    pub fn is_solid(&self) -> bool {
        matches!(self, ElementKind::Tet4 | ElementKind::Hex8)
    }

    /// Local node lists of the element's boundary facets.
    ///
    /// Facets are faces for solids and edges for plane elements.
    pub fn facets(&self) -> &'static [&'static [usize]] {
        match self {
            ElementKind::Tet4 => TET4_FACES,
            ElementKind::Hex8 => HEX8_FACES,
            ElementKind::Tri3 => TRI3_FACES,
            ElementKind::Quad4 => QUAD4_FACES,
        }
    }

    /// Local node pairs of the element's edges.
    pub fn edges(&self) -> &'static [[usize; 2]] {
        match self {
            ElementKind::Tet4 => TET4_EDGES,
            ElementKind::Hex8 => HEX8_EDGES,
            ElementKind::Tri3 => &[[0, 1], [1, 2], [2, 0]],
            ElementKind::Quad4 => &[[0, 1], [1, 2], [2, 3], [3, 0]],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Tet4 => "tet4",
            ElementKind::Hex8 => "hex8",
            ElementKind::Tri3 => "tri3",
            ElementKind::Quad4 => "quad4",
        }
    }
}
