//! # osteon-runtime
//!
//! Process-wide compute context for the osteon core.
//!
//! [`RuntimeContext::init`] probes the parallel backends in a fixed priority
//! order (CUDA → Metal → CPU), commits to the first that initializes, and
//! records the numeric [`Precision`]. The context is constructed once by the
//! orchestration layer and passed by reference to every solver and scene;
//! nothing re-probes afterwards.
//!
//! Per-point kernels are dispatched through [`RuntimeContext::map_points`],
//! an ordered data-parallel map, so results do not depend on thread count.

pub mod backend;
pub mod cancel;
pub mod context;

pub use backend::{BackendKind, BackendProbe, BackendRequest, Precision, ProbeOutcome};
pub use cancel::CancelToken;
pub use context::{RuntimeConfig, RuntimeContext};
