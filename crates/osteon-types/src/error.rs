//! Error types for the osteon core.
//!
//! All crates return `OsteonResult<T>` from fallible operations.
//! Non-convergence is not an error: it is reported through
//! `converged = false` on the solve result.

use thiserror::Error;

/// Unified error type for the osteon core.
#[derive(Debug, Error)]
pub enum OsteonError {
    /// Geometry is malformed (index out of range, non-finite coordinate, bad volume).
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// The node or particle set is empty.
    #[error("Empty domain: {0}")]
    EmptyDomain(String),

    /// Material parameter is out of valid range.
    #[error("Invalid material parameter: {0}")]
    InvalidMaterial(String),

    /// Configuration value is invalid or unsupported for the bound method.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Contact definition is invalid (friction outside [0, 1], unknown body, ...).
    #[error("Invalid contact definition: {0}")]
    InvalidContact(String),

    /// The assembled system cannot be solved (no constraint, failed factorization).
    #[error("Singular system: {0}")]
    SingularSystem(String),

    /// NaN or Inf detected in a field; the solve was aborted.
    #[error("Non-finite value in {field} at step {step}")]
    NonFinite {
        /// Step (or iteration) at which the value was detected.
        step: u32,
        /// Name of the offending field.
        field: String,
    },

    /// The caller cancelled the solve between two steps.
    #[error("Solve cancelled at step {step}")]
    Cancelled {
        step: u32,
    },

    /// Compute backend error.
    #[error("Backend error: {0}")]
    Backend(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, OsteonError>`.
pub type OsteonResult<T> = Result<T, OsteonError>;
