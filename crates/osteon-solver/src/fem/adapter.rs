//! Mesh-based (FEM) adapter.

use std::fmt;

use osteon_domain::Domain;
use osteon_material::{ConstitutiveLaw, InternalMaterial, Specialized};
use osteon_math::faer_solver::FaerSolver;
use osteon_math::sparse::{CsrMatrix, SparseSolver};
use osteon_math::eigen::symmetric_eigenvalues;
use osteon_math::{DVec3, StressTensor};
use osteon_runtime::RuntimeContext;
use osteon_types::constants::{NEWMARK_BETA, NEWMARK_GAMMA};
use osteon_types::{AdapterKind, OsteonError, OsteonResult};
use tracing::{debug, warn};

use super::assembly;
use super::element::{lumped_volumes, precompute, ElementData};
use crate::adapter::{MechanicsAdapter, StepKind};
use crate::config::{FemConfig, SolverConfig};
use crate::relaxation::{self, Relaxation};
use crate::result::{SolveWarning, StepReport};
use crate::state::{check_forces, PointState};

/// Small- and finite-strain finite elements over Tet4, Hex8, Tri3 and Quad4
/// meshes, with implicit static, implicit Newmark, explicit
/// central-difference and dynamic-relaxation stepping.
pub struct FemAdapter {
    ctx: RuntimeContext,
    domain: Domain,
    law: InternalMaterial,
    elements: Vec<ElementData>,
    state: PointState,
    config: FemConfig,
    max_iterations: u32,
    tolerance: f64,
    cfl: f64,
    free_index: Vec<Option<usize>>,
    free_count: usize,
    /// Soft-spring stiffness per DOF, zero when the body is constrained.
    soft_spring: f64,
    reference_stiffness: CsrMatrix,
    critical_dt: f64,
    solver: FaerSolver,
    linear_factorized: bool,
    relaxation: Relaxation,
    acceleration_ready: bool,
    warnings: Vec<SolveWarning>,
}

impl fmt::Debug for FemAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FemAdapter")
            .field("nodes", &self.state.point_count)
            .field("elements", &self.elements.len())
            .field("law", &self.law.name())
            .field("free_dofs", &self.free_count)
            .finish_non_exhaustive()
    }
}

impl FemAdapter {
    pub fn new(
        ctx: &RuntimeContext,
        domain: &Domain,
        material: Specialized,
        config: &SolverConfig,
    ) -> OsteonResult<Self> {
        let mesh = domain
            .mesh()
            .ok_or_else(|| OsteonError::InvalidConfig("FEM adapter requires a mesh domain".into()))?;
        let elements = precompute(mesh)?;
        let n = mesh.node_count();

        let mut fixed = domain.fixed_mask();
        let mut used = vec![false; n];
        for elem in &elements {
            for &node in &elem.nodes {
                used[node] = true;
            }
        }
        for (mask, used) in fixed.iter_mut().zip(&used) {
            if !mesh.kind.is_solid() {
                mask[2] = true;
            }
            if !used {
                *mask = [true; 3];
            }
        }

        let mass: Vec<f64> = lumped_volumes(n, &elements)
            .into_iter()
            .map(|v| v * material.density)
            .collect();
        let mut state = PointState::new(&domain.positions(), mass, fixed);
        state.set_external(&domain.nodal_forces());

        let mut free_index = vec![None; 3 * n];
        let mut free_count = 0;
        for node in 0..n {
            for axis in 0..3 {
                if !state.fixed[node][axis] {
                    free_index[3 * node + axis] = Some(free_count);
                    free_count += 1;
                }
            }
        }
        if free_count == 0 {
            return Err(OsteonError::InvalidConfig("every degree of freedom is fixed".into()));
        }

        let law = material.internal;
        let zero = vec![DVec3::ZERO; n];
        let triplets = assembly::tangent_triplets(ctx, &elements, &law, &zero);
        let reference_stiffness = CsrMatrix::from_triplets(3 * n, 3 * n, &triplets);

        let mut warnings = Vec::new();
        let soft_spring = if domain.has_constraint() {
            0.0
        } else {
            let diag = reference_stiffness.diagonal();
            let free: Vec<f64> = (0..3 * n).filter(|d| free_index[*d].is_some()).map(|d| diag[d]).collect();
            let mean = free.iter().sum::<f64>() / free.len() as f64;
            warn!(nodes = n, "body has no Dirichlet condition, adding soft springs");
            warnings.push(SolveWarning::SoftSprings);
            config.fem.soft_spring * mean
        };

        let bounds: Vec<f64> = assembly::gershgorin_bounds(n, &triplets)
            .into_iter()
            .map(|k| k + soft_spring)
            .collect();
        let omega_sq = bounds
            .iter()
            .zip(&state.mass)
            .filter(|(_, m)| **m > 0.0)
            .map(|(k, m)| k / m)
            .fold(0.0, f64::max);
        let critical_dt = if omega_sq > 0.0 { 2.0 / omega_sq.sqrt() } else { f64::INFINITY };
        state.relax_mass = relaxation::relaxation_masses(&bounds);

        debug!(
            nodes = n,
            elements = elements.len(),
            free_dofs = free_count,
            law = law.name(),
            critical_dt,
            "FEM adapter ready"
        );

        Ok(Self {
            ctx: ctx.clone(),
            domain: domain.clone(),
            law,
            elements,
            state,
            config: config.fem.clone(),
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            cfl: config.cfl,
            free_index,
            free_count,
            soft_spring,
            reference_stiffness,
            critical_dt,
            solver: FaerSolver::new(),
            linear_factorized: false,
            relaxation: Relaxation::new(n, true),
            acceleration_ready: false,
            warnings,
        })
    }

    pub fn elements(&self) -> &[ElementData] {
        &self.elements
    }

    pub fn free_dofs(&self) -> usize {
        self.free_count
    }

    /// Force acting on each node from the body itself: `−r(u) − k_soft · u`.
    fn acting_forces(&self) -> Vec<DVec3> {
        let disp = self.state.displacements();
        assembly::internal_forces(&self.ctx, &self.elements, &self.law, &disp)
            .into_iter()
            .zip(&disp)
            .map(|(r, u)| -r - *u * self.soft_spring)
            .collect()
    }

    fn mass_per_dof(&self) -> Vec<f64> {
        self.state.mass.iter().flat_map(|m| [*m; 3]).collect()
    }

    /// Out-of-balance force over the free DOFs and its relative norm.
    fn out_of_balance(&self, factor: f64, acting: &[DVec3], inertial: Option<&[f64]>) -> (Vec<f64>, f64) {
        let mut rhs = vec![0.0; self.free_count];
        let mut applied = 0.0;
        let mut resisting = 0.0;
        for node in 0..self.state.point_count {
            let f = self.state.applied(node) * factor;
            for axis in 0..3 {
                let d = 3 * node + axis;
                if let Some(row) = self.free_index[d] {
                    let inertia = inertial.map_or(0.0, |m| m[d]);
                    rhs[row] = f[axis] + acting[node][axis] - inertia;
                    applied += f[axis] * f[axis];
                    resisting += (acting[node][axis] - inertia).powi(2);
                }
            }
        }
        let norm = rhs.iter().map(|v| v * v).sum::<f64>().sqrt();
        let reference = applied.max(resisting).sqrt();
        let relative = if reference < 1e-300 { 0.0 } else { norm / reference };
        (rhs, relative)
    }

    /// Factorizes `scale_k · K_T(u) + diag` over the free DOFs.
    fn factorize(&mut self, scale_k: f64, diagonal: &[f64]) -> OsteonResult<()> {
        let disp = self.state.displacements();
        let triplets = assembly::tangent_triplets(&self.ctx, &self.elements, &self.law, &disp);
        let k = assembly::reduced_system(
            3 * self.state.point_count,
            &triplets,
            scale_k,
            Some(diagonal),
            &self.free_index,
            self.free_count,
        );
        self.solver.factorize(&k)
    }

    fn solve_increment(&self, rhs: &[f64]) -> OsteonResult<Vec<f64>> {
        let mut delta = vec![0.0; rhs.len()];
        self.solver.solve(rhs, &mut delta)?;
        Ok(delta)
    }

    fn apply_increment(&mut self, delta: &[f64]) {
        for node in 0..self.state.point_count {
            let mut u = self.state.displacement(node);
            for axis in 0..3 {
                if let Some(row) = self.free_index[3 * node + axis] {
                    u[axis] += delta[row];
                }
            }
            self.state.set_displacement(node, u);
        }
    }

    fn soft_diagonal(&self) -> Vec<f64> {
        vec![self.soft_spring; 3 * self.state.point_count]
    }

    /// Newton-Raphson over `load_steps` increments of the applied load.
    fn step_static(&mut self, index: u32) -> OsteonResult<StepReport> {
        let steps = self.config.load_steps.max(1);
        let linear = self.law.linear().is_some();
        let soft = self.soft_diagonal();
        let mut report = StepReport { converged: true, ..Default::default() };

        for s in 1..=steps {
            let factor = f64::from(s) / f64::from(steps);
            let mut converged = false;
            let mut iteration = 0;
            loop {
                let acting = self.acting_forces();
                check_forces(&acting, index)?;
                let (rhs, residual) = self.out_of_balance(factor, &acting, None);
                report.residual = residual;
                debug!(step = index, load_step = s, iteration, residual, "newton iteration");
                if residual <= self.tolerance {
                    converged = true;
                    break;
                }
                if iteration >= self.max_iterations {
                    break;
                }
                if !(linear && self.linear_factorized) {
                    self.factorize(1.0, &soft)?;
                    self.linear_factorized = linear;
                }
                let delta = self.solve_increment(&rhs)?;
                self.apply_increment(&delta);
                self.state.check_finite(index)?;
                iteration += 1;
                report.iterations += 1;
            }
            report.converged &= converged;
        }
        relaxation::quantize_state(&self.ctx, &mut self.state);
        Ok(report)
    }

    /// One Newmark-β step (average acceleration) with Newton iterations.
    fn step_newmark(&mut self, dt: f64, index: u32) -> OsteonResult<StepReport> {
        let (gamma, beta) = (NEWMARK_GAMMA, NEWMARK_BETA);
        let a0 = 1.0 / (beta * dt * dt);
        let a1 = gamma / (beta * dt);
        let (alpha_r, beta_r) = (self.config.rayleigh_alpha, self.config.rayleigh_beta);
        let n = self.state.point_count;

        if !self.acceleration_ready {
            let force = self.explicit_force();
            check_forces(&force, index)?;
            relaxation::update_acceleration(&mut self.state, &force);
            self.acceleration_ready = true;
        }
        let u_n = self.state.displacements();
        let v_n = self.state.velocities();
        let acc_n: Vec<DVec3> = (0..n).map(|i| self.state.acceleration(i)).collect();
        let mass = self.mass_per_dof();
        let diagonal: Vec<f64> = mass.iter().map(|m| (a0 + a1 * alpha_r) * m + self.soft_spring).collect();

        let kinematics = |u: DVec3, i: usize| {
            let a = (u - u_n[i]) * a0 - v_n[i] / (beta * dt) - acc_n[i] * (0.5 / beta - 1.0);
            let v = v_n[i] + (acc_n[i] * (1.0 - gamma) + a * gamma) * dt;
            (v, a)
        };

        let mut report = StepReport::default();
        let mut iteration = 0;
        loop {
            let mut inertial = vec![0.0; 3 * n];
            let mut vel = vec![0.0; 3 * n];
            for i in 0..n {
                let (v, a) = kinematics(self.state.displacement(i), i);
                for axis in 0..3 {
                    vel[3 * i + axis] = v[axis];
                    inertial[3 * i + axis] = mass[3 * i + axis] * (a[axis] + alpha_r * v[axis]);
                }
            }
            if beta_r != 0.0 {
                for (f, kv) in inertial.iter_mut().zip(self.reference_stiffness.mul_vec(&vel)) {
                    *f += beta_r * kv;
                }
            }

            let acting = self.acting_forces();
            check_forces(&acting, index)?;
            let (rhs, residual) = self.out_of_balance(1.0, &acting, Some(&inertial));
            report.residual = residual;
            if residual <= self.tolerance {
                report.converged = true;
                break;
            }
            if iteration >= self.max_iterations {
                break;
            }
            self.factorize(1.0 + a1 * beta_r, &diagonal)?;
            self.linear_factorized = false;
            let delta = self.solve_increment(&rhs)?;
            self.apply_increment(&delta);
            self.state.check_finite(index)?;
            iteration += 1;
        }
        report.iterations = iteration;

        for i in 0..n {
            let (v, a) = kinematics(self.state.displacement(i), i);
            self.state.set_velocity(i, self.state.mask(i, v));
            self.state.set_acceleration(i, self.state.mask(i, a));
        }
        relaxation::quantize_state(&self.ctx, &mut self.state);
        report.kinetic_energy = self.state.kinetic_energy();
        Ok(report)
    }

    /// Total force for explicit stepping, including Rayleigh damping.
    fn explicit_force(&self) -> Vec<DVec3> {
        let acting = self.acting_forces();
        let mut force = relaxation::total_force(&self.state, &acting);
        let (alpha_r, beta_r) = (self.config.rayleigh_alpha, self.config.rayleigh_beta);
        if alpha_r != 0.0 || beta_r != 0.0 {
            let vel: Vec<f64> = self.state.velocities().iter().flat_map(|v| [v.x, v.y, v.z]).collect();
            let kv = if beta_r != 0.0 {
                self.reference_stiffness.mul_vec(&vel)
            } else {
                vec![0.0; vel.len()]
            };
            for (i, f) in force.iter_mut().enumerate() {
                let m = self.state.mass[i];
                let damping = DVec3::new(
                    alpha_r * m * vel[3 * i] + beta_r * kv[3 * i],
                    alpha_r * m * vel[3 * i + 1] + beta_r * kv[3 * i + 1],
                    alpha_r * m * vel[3 * i + 2] + beta_r * kv[3 * i + 2],
                );
                *f = self.state.mask(i, *f - damping);
            }
        }
        force
    }

    /// One central-difference step in velocity-Verlet form.
    fn step_explicit(&mut self, dt: f64, index: u32) -> OsteonResult<StepReport> {
        if !self.acceleration_ready {
            let force = self.explicit_force();
            check_forces(&force, index)?;
            relaxation::update_acceleration(&mut self.state, &force);
            self.acceleration_ready = true;
        }
        relaxation::kick(&mut self.state, dt);
        relaxation::drift(&mut self.state, dt);
        let force = self.explicit_force();
        check_forces(&force, index)?;
        relaxation::update_acceleration(&mut self.state, &force);
        relaxation::kick(&mut self.state, dt);
        self.state.check_finite(index)?;
        relaxation::quantize_state(&self.ctx, &mut self.state);
        Ok(StepReport {
            iterations: 1,
            residual: relaxation::relative_residual(&self.state, &self.acting_forces()),
            converged: true,
            kinetic_energy: self.state.kinetic_energy(),
            broken: 0,
        })
    }

    fn step_relaxation(&mut self, index: u32) -> OsteonResult<StepReport> {
        let acting = self.acting_forces();
        check_forces(&acting, index)?;
        let residual = relaxation::relative_residual(&self.state, &acting);
        let force = relaxation::total_force(&self.state, &acting);
        let kinetic_energy = self.relaxation.step(&mut self.state, &force, 1.0);
        self.state.check_finite(index)?;
        relaxation::quantize_state(&self.ctx, &mut self.state);
        Ok(StepReport { iterations: 1, residual, converged: false, kinetic_energy, broken: 0 })
    }

    /// The lowest `count` natural frequencies in Hz, from the dense
    /// generalized eigenproblem `K φ = ω² M φ` over the free DOFs.
    pub fn natural_frequencies(&self, count: usize) -> OsteonResult<Vec<f64>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if self.free_count > self.config.max_modal_dofs {
            return Err(OsteonError::InvalidConfig(format!(
                "modal analysis limited to {} free DOFs, mesh has {}",
                self.config.max_modal_dofs, self.free_count
            )));
        }
        let nf = self.free_count;
        let mass = self.mass_per_dof();
        let mut scale = vec![0.0; nf];
        for (d, idx) in self.free_index.iter().enumerate() {
            if let Some(row) = idx {
                if mass[d] <= 0.0 {
                    return Err(OsteonError::InvalidDomain("node with zero mass".into()));
                }
                scale[*row] = 1.0 / mass[d].sqrt();
            }
        }

        let k = &self.reference_stiffness;
        let mut dense = vec![0.0; nf * nf];
        for row in 0..k.rows {
            let Some(r) = self.free_index[row] else { continue };
            for idx in k.row_ptr[row]..k.row_ptr[row + 1] {
                if let Some(c) = self.free_index[k.col_idx[idx]] {
                    dense[r * nf + c] += k.values[idx] * scale[r] * scale[c];
                }
            }
            dense[r * nf + r] += self.soft_spring * scale[r] * scale[r];
        }

        Ok(symmetric_eigenvalues(nf, &dense)
            .into_iter()
            .take(count)
            .map(|lambda| lambda.max(0.0).sqrt() / (2.0 * std::f64::consts::PI))
            .collect())
    }
}

impl MechanicsAdapter for FemAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Fem
    }

    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn state(&self) -> &PointState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PointState {
        &mut self.state
    }

    fn supports(&self, _step: StepKind) -> bool {
        true
    }

    fn stable_dt(&self, step: StepKind) -> f64 {
        match step {
            StepKind::Explicit => self.cfl * self.critical_dt,
            StepKind::QuasiStatic => 1.0,
            StepKind::Static | StepKind::Implicit => f64::INFINITY,
        }
    }

    fn step(&mut self, step: StepKind, dt: f64, index: u32) -> OsteonResult<StepReport> {
        let report = match step {
            StepKind::Static => self.step_static(index),
            StepKind::Implicit => self.step_newmark(dt, index),
            StepKind::Explicit => self.step_explicit(dt, index),
            StepKind::QuasiStatic => self.step_relaxation(index),
        };
        self.state.clear_contact();
        report
    }

    fn stress(&self) -> Vec<StressTensor> {
        assembly::nodal_stress(&self.ctx, &self.elements, &self.law, &self.state.displacements())
    }

    fn damage(&self) -> Vec<f64> {
        Vec::new()
    }

    fn strain_energy(&self) -> f64 {
        assembly::strain_energy(&self.ctx, &self.elements, &self.law, &self.state.displacements())
    }

    fn residual(&self) -> f64 {
        relaxation::relative_residual(&self.state, &self.acting_forces())
    }

    fn warnings(&self) -> &[SolveWarning] {
        &self.warnings
    }

    fn reset_dynamics(&mut self) {
        self.state.clear_motion();
        self.relaxation.reset();
        self.acceleration_ready = false;
    }
}
