//! Mesh-based adapter: isoparametric elements, sparse assembly and
//! implicit/explicit stepping.

pub mod adapter;
pub mod assembly;
pub mod element;

pub use adapter::FemAdapter;
pub use element::ElementData;
