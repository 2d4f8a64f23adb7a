//! Point state — SoA buffers for all per-node / per-particle data.
//!
//! Shared by every adapter. Topology lives in the adapter; this struct
//! only holds mutable kinematic and load data.

use osteon_math::DVec3;
use osteon_types::{OsteonError, OsteonResult};

use crate::relaxation;

/// SoA mechanics state.
///
/// All arrays have length `point_count`:
/// ```text
/// disp_x: [u0x, u1x, u2x, ...]
/// disp_y: [u0y, u1y, u2y, ...]
/// ...
/// ```
#[derive(Debug, Clone)]
pub struct PointState {
    pub point_count: usize,

    // ─── Reference configuration ───
    pub ref_x: Vec<f64>,
    pub ref_y: Vec<f64>,
    pub ref_z: Vec<f64>,

    // ─── Displacement ───
    pub disp_x: Vec<f64>,
    pub disp_y: Vec<f64>,
    pub disp_z: Vec<f64>,

    // ─── Velocity ───
    pub vel_x: Vec<f64>,
    pub vel_y: Vec<f64>,
    pub vel_z: Vec<f64>,

    // ─── Acceleration ───
    pub acc_x: Vec<f64>,
    pub acc_y: Vec<f64>,
    pub acc_z: Vec<f64>,

    // ─── External load (constant per solve) ───
    pub ext_x: Vec<f64>,
    pub ext_y: Vec<f64>,
    pub ext_z: Vec<f64>,

    // ─── Contact load (injected, cleared after each step) ───
    pub contact_x: Vec<f64>,
    pub contact_y: Vec<f64>,
    pub contact_z: Vec<f64>,

    /// Physical lumped mass.
    pub mass: Vec<f64>,
    /// Fictitious mass for dynamic relaxation.
    pub relax_mass: Vec<f64>,
    /// Penalty stiffness of the contacts acting on each point. Raises the
    /// relaxation mass on top of `relax_mass`.
    pub contact_stiffness: Vec<f64>,
    /// Per-axis Dirichlet mask.
    pub fixed: Vec<[bool; 3]>,
}

fn split(v: &[DVec3]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    (
        v.iter().map(|p| p.x).collect(),
        v.iter().map(|p| p.y).collect(),
        v.iter().map(|p| p.z).collect(),
    )
}

impl PointState {
    /// State at rest in the reference configuration.
    pub fn new(reference: &[DVec3], mass: Vec<f64>, fixed: Vec<[bool; 3]>) -> Self {
        let n = reference.len();
        let (ref_x, ref_y, ref_z) = split(reference);
        let zeros = vec![0.0; n];
        Self {
            point_count: n,
            ref_x,
            ref_y,
            ref_z,
            disp_x: zeros.clone(),
            disp_y: zeros.clone(),
            disp_z: zeros.clone(),
            vel_x: zeros.clone(),
            vel_y: zeros.clone(),
            vel_z: zeros.clone(),
            acc_x: zeros.clone(),
            acc_y: zeros.clone(),
            acc_z: zeros.clone(),
            ext_x: zeros.clone(),
            ext_y: zeros.clone(),
            ext_z: zeros.clone(),
            contact_x: zeros.clone(),
            contact_y: zeros.clone(),
            contact_z: zeros.clone(),
            contact_stiffness: zeros.clone(),
            relax_mass: mass.clone(),
            mass,
            fixed,
        }
    }

    #[inline]
    pub fn reference(&self, i: usize) -> DVec3 {
        DVec3::new(self.ref_x[i], self.ref_y[i], self.ref_z[i])
    }

    #[inline]
    pub fn displacement(&self, i: usize) -> DVec3 {
        DVec3::new(self.disp_x[i], self.disp_y[i], self.disp_z[i])
    }

    #[inline]
    pub fn set_displacement(&mut self, i: usize, u: DVec3) {
        self.disp_x[i] = u.x;
        self.disp_y[i] = u.y;
        self.disp_z[i] = u.z;
    }

    /// Current position `X + u`.
    #[inline]
    pub fn current(&self, i: usize) -> DVec3 {
        self.reference(i) + self.displacement(i)
    }

    #[inline]
    pub fn velocity(&self, i: usize) -> DVec3 {
        DVec3::new(self.vel_x[i], self.vel_y[i], self.vel_z[i])
    }

    #[inline]
    pub fn set_velocity(&mut self, i: usize, v: DVec3) {
        self.vel_x[i] = v.x;
        self.vel_y[i] = v.y;
        self.vel_z[i] = v.z;
    }

    #[inline]
    pub fn acceleration(&self, i: usize) -> DVec3 {
        DVec3::new(self.acc_x[i], self.acc_y[i], self.acc_z[i])
    }

    #[inline]
    pub fn set_acceleration(&mut self, i: usize, a: DVec3) {
        self.acc_x[i] = a.x;
        self.acc_y[i] = a.y;
        self.acc_z[i] = a.z;
    }

    #[inline]
    pub fn external(&self, i: usize) -> DVec3 {
        DVec3::new(self.ext_x[i], self.ext_y[i], self.ext_z[i])
    }

    #[inline]
    pub fn contact(&self, i: usize) -> DVec3 {
        DVec3::new(self.contact_x[i], self.contact_y[i], self.contact_z[i])
    }

    /// External plus contact load.
    #[inline]
    pub fn applied(&self, i: usize) -> DVec3 {
        self.external(i) + self.contact(i)
    }

    /// Replaces the external load.
    pub fn set_external(&mut self, forces: &[DVec3]) {
        let (x, y, z) = split(forces);
        self.ext_x = x;
        self.ext_y = y;
        self.ext_z = z;
    }

    pub fn add_contact(&mut self, i: usize, f: DVec3) {
        self.contact_x[i] += f.x;
        self.contact_y[i] += f.y;
        self.contact_z[i] += f.z;
    }

    pub fn clear_contact(&mut self) {
        self.contact_x.fill(0.0);
        self.contact_y.fill(0.0);
        self.contact_z.fill(0.0);
    }

    /// Dynamic-relaxation mass of point `i`, contact stiffness included.
    #[inline]
    pub fn relaxation_mass(&self, i: usize) -> f64 {
        self.relax_mass[i] + relaxation::mass_for_stiffness(self.contact_stiffness[i])
    }

    /// Zeroes velocity and acceleration.
    pub fn clear_motion(&mut self) {
        for buf in [
            &mut self.vel_x,
            &mut self.vel_y,
            &mut self.vel_z,
            &mut self.acc_x,
            &mut self.acc_y,
            &mut self.acc_z,
        ] {
            buf.fill(0.0);
        }
    }

    pub fn positions(&self) -> Vec<DVec3> {
        (0..self.point_count).map(|i| self.current(i)).collect()
    }

    pub fn displacements(&self) -> Vec<DVec3> {
        (0..self.point_count).map(|i| self.displacement(i)).collect()
    }

    pub fn velocities(&self) -> Vec<DVec3> {
        (0..self.point_count).map(|i| self.velocity(i)).collect()
    }

    /// Zeroes the masked components of `v`.
    #[inline]
    pub fn mask(&self, i: usize, v: DVec3) -> DVec3 {
        let m = self.fixed[i];
        DVec3::new(
            if m[0] { 0.0 } else { v.x },
            if m[1] { 0.0 } else { v.y },
            if m[2] { 0.0 } else { v.z },
        )
    }

    /// Kinetic energy `½ Σ m v²` with the physical mass.
    pub fn kinetic_energy(&self) -> f64 {
        self.energy_with(|i| self.mass[i])
    }

    /// Kinetic energy with the dynamic-relaxation mass.
    pub fn relaxation_energy(&self) -> f64 {
        self.energy_with(|i| self.relaxation_mass(i))
    }

    fn energy_with(&self, mass: impl Fn(usize) -> f64) -> f64 {
        (0..self.point_count)
            .map(|i| 0.5 * mass(i) * self.velocity(i).length_squared())
            .sum()
    }

    /// Work of the applied loads on the current displacement.
    pub fn external_work(&self) -> f64 {
        (0..self.point_count)
            .map(|i| self.applied(i).dot(self.displacement(i)))
            .sum()
    }

    /// Returns `NonFinite` if any displacement or velocity is NaN/Inf.
    pub fn check_finite(&self, step: u32) -> OsteonResult<()> {
        let bad = |buf: &[f64]| buf.iter().any(|v| !v.is_finite());
        if bad(&self.disp_x) || bad(&self.disp_y) || bad(&self.disp_z) {
            return Err(OsteonError::NonFinite { step, field: "displacement".into() });
        }
        if bad(&self.vel_x) || bad(&self.vel_y) || bad(&self.vel_z) {
            return Err(OsteonError::NonFinite { step, field: "velocity".into() });
        }
        Ok(())
    }
}

/// Returns `NonFinite` if any force component is NaN/Inf.
pub fn check_forces(forces: &[DVec3], step: u32) -> OsteonResult<()> {
    if forces.iter().all(|f| f.is_finite()) {
        Ok(())
    } else {
        Err(OsteonError::NonFinite { step, field: "force".into() })
    }
}
