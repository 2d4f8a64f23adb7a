//! Numerical constants and analysis defaults.

/// Default relative tolerance for the static Newton-Raphson residual.
pub const DEFAULT_TOLERANCE: f64 = 1.0e-8;

/// Default iteration cap for iterative solves.
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

/// Default quasi-static kinetic-energy threshold, relative to the peak
/// kinetic energy of the relaxation.
pub const DEFAULT_KINETIC_ENERGY_TOLERANCE: f64 = 1.0e-8;

/// Default Courant safety factor applied to critical time steps.
pub const DEFAULT_CFL: f64 = 0.8;

/// Newmark-beta parameters (average acceleration, unconditionally stable).
pub const NEWMARK_GAMMA: f64 = 0.5;
pub const NEWMARK_BETA: f64 = 0.25;

/// Default peridynamic horizon as a multiple of particle spacing.
pub const DEFAULT_HORIZON_FACTOR: f64 = 3.015;

/// Default meshfree kernel support as a multiple of particle spacing.
pub const DEFAULT_SUPPORT_FACTOR: f64 = 2.0;

/// Default gap tolerance as a multiple of the largest body spacing.
pub const GAP_TOLERANCE_FACTOR: f64 = 1.5;

/// Epsilon for degenerate geometry (lengths, volumes, determinants).
pub const EPSILON: f64 = 1.0e-12;
