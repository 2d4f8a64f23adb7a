//! Explicit integration kernels shared by every adapter.
//!
//! - [`Relaxation`]: adaptive dynamic relaxation (ADR) with a fictitious
//!   mass and an adaptive viscous damping coefficient estimated from the
//!   local stiffness (Rayleigh quotient of the diagonal secant stiffness),
//!   plus optional kinetic damping (velocity reset at kinetic-energy peaks).
//! - [`kick`] / [`drift`]: velocity-Verlet halves for explicit dynamics.
//!
//! All kernels honour the per-axis Dirichlet mask in [`PointState::fixed`].

use osteon_math::DVec3;
use osteon_runtime::RuntimeContext;

use crate::state::PointState;

/// Adaptive dynamic relaxation state.
#[derive(Debug, Clone)]
pub struct Relaxation {
    previous_force: Vec<DVec3>,
    started: bool,
    last_energy: f64,
    kinetic_damping: bool,
}

impl Relaxation {
    pub fn new(point_count: usize, kinetic_damping: bool) -> Self {
        Self {
            previous_force: vec![DVec3::ZERO; point_count],
            started: false,
            last_energy: 0.0,
            kinetic_damping,
        }
    }

    /// Forget the damping history. Velocities are left untouched.
    pub fn reset(&mut self) {
        self.started = false;
        self.last_energy = 0.0;
        self.previous_force.fill(DVec3::ZERO);
    }

    /// Adaptive damping coefficient `c = 2 sqrt(uᵀ K_loc u / uᵀ u)`.
    fn damping(&self, state: &PointState, force: &[DVec3], dt: f64) -> f64 {
        let mut num = 0.0;
        let mut den = 0.0;
        for i in 0..state.point_count {
            let lambda = state.relaxation_mass(i);
            let u = state.displacement(i);
            let v = state.velocity(i);
            let df = (force[i] - self.previous_force[i]) / lambda;
            for a in 0..3 {
                if v[a] != 0.0 {
                    let k = -df[a] / (dt * v[a]);
                    num += u[a] * k * u[a];
                }
                den += u[a] * u[a];
            }
        }
        if num > 0.0 && den > 0.0 {
            (2.0 * (num / den).sqrt()).min(1.9 / dt)
        } else {
            0.0
        }
    }

    /// One relaxation step driven by the total (applied minus internal)
    /// force. Returns the kinetic energy of the step before any
    /// kinetic-damping reset.
    pub fn step(&mut self, state: &mut PointState, force: &[DVec3], dt: f64) -> f64 {
        let c = if self.started { self.damping(state, force, dt) } else { 0.0 };

        for i in 0..state.point_count {
            let lambda = state.relaxation_mass(i);
            let v = if self.started {
                (state.velocity(i) * (2.0 - c * dt) + force[i] * (2.0 * dt / lambda)) / (2.0 + c * dt)
            } else {
                force[i] * (dt / (2.0 * lambda))
            };
            let v = state.mask(i, v);
            state.set_velocity(i, v);
            let u = state.displacement(i) + v * dt;
            state.set_displacement(i, u);
        }
        self.previous_force.copy_from_slice(force);
        self.started = true;

        let energy = state.relaxation_energy();
        if self.kinetic_damping && energy < self.last_energy {
            for buf in [&mut state.vel_x, &mut state.vel_y, &mut state.vel_z] {
                buf.fill(0.0);
            }
            self.last_energy = 0.0;
        } else {
            self.last_energy = energy;
        }
        energy
    }
}

/// Velocity-Verlet half kick: `v += dt/2 · a`.
pub fn kick(state: &mut PointState, dt: f64) {
    for i in 0..state.point_count {
        let v = state.velocity(i) + state.acceleration(i) * (0.5 * dt);
        state.set_velocity(i, state.mask(i, v));
    }
}

/// Drift: `u += dt · v`.
pub fn drift(state: &mut PointState, dt: f64) {
    for i in 0..state.point_count {
        let u = state.displacement(i) + state.velocity(i) * dt;
        state.set_displacement(i, u);
    }
}

/// Sets `a = f / m` on free axes.
pub fn update_acceleration(state: &mut PointState, force: &[DVec3]) {
    for i in 0..state.point_count {
        let a = force[i] / state.mass[i];
        state.set_acceleration(i, state.mask(i, a));
    }
}

/// Total force on free axes: applied plus internal.
pub fn total_force(state: &PointState, internal: &[DVec3]) -> Vec<DVec3> {
    (0..state.point_count)
        .map(|i| state.mask(i, state.applied(i) + internal[i]))
        .collect()
}

/// Relative out-of-balance force `|f_applied + f_int| / max(|f_applied|, |f_int|)`
/// over free axes.
pub fn relative_residual(state: &PointState, internal: &[DVec3]) -> f64 {
    let mut out = 0.0;
    let mut applied = 0.0;
    let mut resisting = 0.0;
    for i in 0..state.point_count {
        let f = state.mask(i, state.applied(i));
        let r = state.mask(i, internal[i]);
        out += (f + r).length_squared();
        applied += f.length_squared();
        resisting += r.length_squared();
    }
    let reference = applied.max(resisting).sqrt();
    if reference < 1e-300 {
        0.0
    } else {
        out.sqrt() / reference
    }
}

/// Rounds the kinematic buffers to the committed precision.
pub fn quantize_state(ctx: &RuntimeContext, state: &mut PointState) {
    for buf in [
        &mut state.disp_x,
        &mut state.disp_y,
        &mut state.disp_z,
        &mut state.vel_x,
        &mut state.vel_y,
        &mut state.vel_z,
    ] {
        ctx.quantize_slice(buf);
    }
}

const MASS_SAFETY: f64 = 1.1;

/// ADR mass that keeps a point of stiffness `k` stable at `dt = 1`.
#[inline]
pub fn mass_for_stiffness(k: f64) -> f64 {
    0.25 * MASS_SAFETY * k
}

/// Fictitious ADR masses from a Gershgorin stiffness bound per point,
/// `λ_i ≥ ¼ dt² Σ_j |K_ij|` with `dt = 1`. Zero bounds take the mean.
pub fn relaxation_masses(stiffness_bound: &[f64]) -> Vec<f64> {
    let positive: Vec<f64> = stiffness_bound.iter().copied().filter(|k| *k > 0.0).collect();
    let mean = if positive.is_empty() {
        1.0
    } else {
        positive.iter().sum::<f64>() / positive.len() as f64
    };
    stiffness_bound
        .iter()
        .map(|&k| mass_for_stiffness(if k > 0.0 { k } else { mean }))
        .collect()
}
