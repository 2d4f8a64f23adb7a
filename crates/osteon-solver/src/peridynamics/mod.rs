//! Peridynamic adapter: bond families, correspondence forces and bond
//! breakage.

pub mod adapter;
pub mod kernel;

pub use adapter::PeridynamicsAdapter;
