//! Kinematically prescribed rigid bodies.

use osteon_domain::Domain;
use osteon_math::rotation::rotate_about;
use osteon_math::DVec3;
use serde::{Deserialize, Serialize};

/// One scheduled increment: a rotation about the body's pivot followed by
/// a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidMotion {
    /// Rotation axis (need not be normalized).
    #[serde(default = "default_axis")]
    pub axis: DVec3,
    /// Rotation angle in radians.
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub translation: DVec3,
}

fn default_axis() -> DVec3 {
    DVec3::Z
}

impl RigidMotion {
    pub fn translation(t: DVec3) -> Self {
        Self { axis: DVec3::Z, angle: 0.0, translation: t }
    }

    pub fn rotation(axis: DVec3, angle: f64) -> Self {
        Self { axis, angle, translation: DVec3::ZERO }
    }

    /// `count` copies of `self`.
    pub fn repeated(self, count: usize) -> Vec<Self> {
        vec![self; count]
    }
}

/// A body that moves on a schedule and collects the contact forces acting
/// on it without deforming.
#[derive(Debug, Clone)]
pub struct RigidBody {
    domain: Domain,
    boundary: Vec<usize>,
    pivot: DVec3,
    schedule: Vec<RigidMotion>,
    cursor: usize,
    positions: Vec<DVec3>,
    velocities: Vec<DVec3>,
    reaction: DVec3,
    moment: DVec3,
    accumulated_reaction: DVec3,
    history: Vec<DVec3>,
}

impl RigidBody {
    /// Stationary body pivoting about its bounding-box center.
    pub fn new(domain: Domain) -> Self {
        let (lo, hi) = domain.bounds();
        let positions = domain.positions();
        Self {
            boundary: domain.select_boundary(),
            pivot: 0.5 * (lo + hi),
            schedule: Vec::new(),
            cursor: 0,
            velocities: vec![DVec3::ZERO; positions.len()],
            positions,
            reaction: DVec3::ZERO,
            moment: DVec3::ZERO,
            accumulated_reaction: DVec3::ZERO,
            history: Vec::new(),
            domain,
        }
    }

    pub fn with_pivot(mut self, pivot: DVec3) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn with_schedule(mut self, schedule: Vec<RigidMotion>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Free-surface points used for contact.
    pub fn boundary(&self) -> &[usize] {
        &self.boundary
    }

    pub fn pivot(&self) -> DVec3 {
        self.pivot
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[DVec3] {
        &self.velocities
    }

    /// Displacement of every point from the reference shape.
    pub fn displacements(&self) -> Vec<DVec3> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| *p - self.domain.position(i))
            .collect()
    }

    /// Scheduled increments already applied.
    pub fn steps_applied(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.schedule.len()
    }

    /// Applies the next scheduled increment: rotation about the pivot, then
    /// translation of every point and of the pivot. Velocities become the
    /// increment divided by `dt`. Returns `false` once the schedule is
    /// exhausted, leaving the body at rest.
    pub fn advance(&mut self, dt: f64) -> bool {
        let Some(motion) = self.schedule.get(self.cursor).copied() else {
            self.velocities.fill(DVec3::ZERO);
            return false;
        };
        self.cursor += 1;
        let inv_dt = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        for (p, v) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            let moved = rotate_about(*p, self.pivot, motion.axis, motion.angle) + motion.translation;
            *v = (moved - *p) * inv_dt;
            *p = moved;
        }
        self.pivot += motion.translation;
        true
    }

    /// Starts a new step's reaction tally.
    pub fn begin_step(&mut self) {
        self.reaction = DVec3::ZERO;
        self.moment = DVec3::ZERO;
    }

    /// Adds contact forces acting on this body.
    pub fn apply_reaction(&mut self, forces: &[(usize, DVec3)]) {
        for &(i, f) in forces {
            self.reaction += f;
            self.accumulated_reaction += f;
            self.moment += (self.positions[i] - self.pivot).cross(f);
        }
    }

    /// Closes the step's tally and appends it to the history.
    pub fn end_step(&mut self) {
        self.history.push(self.reaction);
    }

    /// Net contact force of the latest step.
    pub fn reaction(&self) -> DVec3 {
        self.reaction
    }

    /// Moment of the latest step's contact forces about the pivot.
    pub fn moment(&self) -> DVec3 {
        self.moment
    }

    /// Contact force summed over every step since the last reset.
    pub fn accumulated_reaction(&self) -> DVec3 {
        self.accumulated_reaction
    }

    /// Net contact force per step.
    pub fn history(&self) -> &[DVec3] {
        &self.history
    }

    /// Clears reactions and history. Called when a scene is built.
    pub fn reset_reaction(&mut self) {
        self.reaction = DVec3::ZERO;
        self.moment = DVec3::ZERO;
        self.accumulated_reaction = DVec3::ZERO;
        self.history.clear();
    }
}
