//! Meshfree Galerkin (SPG) adapter.

use osteon_domain::Domain;
use osteon_material::{LinearElasticLaw, Specialized};
use osteon_math::{DMat3, DVec3, StressTensor};
use osteon_runtime::RuntimeContext;
use osteon_types::{AdapterKind, OsteonError, OsteonResult};
use tracing::{debug, info};

use super::kernel::{self, ForceInput};
use crate::adapter::{MechanicsAdapter, StepKind};
use crate::config::{SolverConfig, StressMeasure};
use crate::family::BondFamily;
use crate::relaxation::{self, Relaxation};
use crate::result::{SolveWarning, StepReport};
use crate::state::{check_forces, PointState};

/// Stabilized nodally integrated meshfree Galerkin over a particle cloud.
#[derive(Debug)]
pub struct MeshfreeAdapter {
    ctx: RuntimeContext,
    domain: Domain,
    law: LinearElasticLaw,
    measure: StressMeasure,
    volumes: Vec<f64>,
    family: BondFamily,
    grads: Vec<DVec3>,
    support: f64,
    penalty: f64,
    modulus: f64,
    critical_stretch: Option<f64>,
    critical_dt: f64,
    cfl: f64,
    state: PointState,
    relaxation: Relaxation,
    acceleration_ready: bool,
    warnings: Vec<SolveWarning>,
}

impl MeshfreeAdapter {
    pub fn new(
        ctx: &RuntimeContext,
        domain: &Domain,
        material: Specialized,
        config: &SolverConfig,
    ) -> OsteonResult<Self> {
        let particles = domain.particles().ok_or_else(|| {
            OsteonError::InvalidConfig("meshfree adapter requires a particle domain".into())
        })?;
        let mf = &config.meshfree;
        if !(mf.support_factor > 1.0) {
            return Err(OsteonError::InvalidConfig(format!(
                "support factor must exceed 1, got {}",
                mf.support_factor
            )));
        }
        if mf.stabilization < 0.0 {
            return Err(OsteonError::InvalidConfig("stabilization must be non-negative".into()));
        }

        let positions = domain.positions();
        let volumes = particles.volumes.clone();
        let support = mf.support_factor * domain.spacing().mean;
        let family = BondFamily::build(&positions, support, true, |r| kernel::cubic_spline(r / support));
        let grads = kernel::implicit_gradients(ctx, &family, &volumes);

        let law = material.lame();
        let mass: Vec<f64> = volumes.iter().map(|v| v * material.density).collect();
        let state = PointState::new(&positions, mass, domain.fixed_mask());

        let mut adapter = Self {
            ctx: ctx.clone(),
            domain: domain.clone(),
            law,
            measure: mf.stress_measure,
            volumes,
            family,
            grads,
            support,
            penalty: mf.stabilization * (law.lambda + 2.0 * law.mu),
            modulus: (3.0 * law.lambda + 2.0 * law.mu).max(2.0 * law.mu),
            critical_stretch: mf.critical_stretch,
            critical_dt: f64::INFINITY,
            cfl: config.cfl,
            state,
            relaxation: Relaxation::new(positions.len(), mf.kinetic_damping),
            acceleration_ready: false,
            warnings: Vec::new(),
        };
        adapter.state.set_external(&domain.nodal_forces());
        adapter.refresh_stiffness(false);

        debug!(
            particles = positions.len(),
            connections = adapter.family.bond_count(),
            support,
            "meshfree adapter ready"
        );
        Ok(adapter)
    }

    pub fn support(&self) -> f64 {
        self.support
    }

    pub fn family(&self) -> &BondFamily {
        &self.family
    }

    /// Implicit gradients in bond order.
    pub fn gradients(&self) -> &[DVec3] {
        &self.grads
    }

    fn refresh_stiffness(&mut self, keep_larger: bool) {
        let bounds = kernel::stiffness_bounds(
            &self.ctx,
            &self.family,
            &self.volumes,
            &self.grads,
            self.modulus,
            self.penalty,
        );
        let masses = relaxation::relaxation_masses(&bounds);
        for (current, new) in self.state.relax_mass.iter_mut().zip(masses) {
            *current = if keep_larger { current.max(new) } else { new };
        }
        let omega_sq = bounds
            .iter()
            .zip(&self.state.mass)
            .map(|(k, m)| k / m)
            .fold(0.0, f64::max);
        self.critical_dt = if omega_sq > 0.0 { 2.0 / omega_sq.sqrt() } else { f64::INFINITY };
    }

    fn deformation_gradients(&self) -> Vec<DMat3> {
        kernel::deformation_gradients(&self.ctx, &self.family, &self.grads, &self.state.displacements())
    }

    fn acting_forces(&self) -> Vec<DVec3> {
        let def_grad = self.deformation_gradients();
        let piola = self.ctx.map_points(def_grad.len(), |i| self.measure.first_piola(&self.law, &def_grad[i]));
        kernel::internal_forces(
            &self.ctx,
            &ForceInput {
                family: &self.family,
                volumes: &self.volumes,
                grads: &self.grads,
                current: &self.state.positions(),
                def_grad: &def_grad,
                piola: &piola,
                penalty: self.penalty,
            },
        )
    }

    fn update_connections(&mut self, index: u32) -> usize {
        let Some(critical) = self.critical_stretch else { return 0 };
        let current = self.state.positions();
        let broken = self.family.break_overstretched(&self.ctx, &current, critical);
        if broken > 0 {
            self.grads = kernel::implicit_gradients(&self.ctx, &self.family, &self.volumes);
            self.refresh_stiffness(true);
            info!(step = index, broken, "connections broken");
        }
        broken
    }

    fn step_relaxation(&mut self, index: u32) -> OsteonResult<StepReport> {
        let acting = self.acting_forces();
        check_forces(&acting, index)?;
        let residual = relaxation::relative_residual(&self.state, &acting);
        let force = relaxation::total_force(&self.state, &acting);
        let kinetic_energy = self.relaxation.step(&mut self.state, &force, 1.0);
        self.state.check_finite(index)?;
        relaxation::quantize_state(&self.ctx, &mut self.state);
        let broken = self.update_connections(index);
        Ok(StepReport { iterations: 1, residual, converged: false, kinetic_energy, broken })
    }

    fn step_explicit(&mut self, dt: f64, index: u32) -> OsteonResult<StepReport> {
        if !self.acceleration_ready {
            let force = relaxation::total_force(&self.state, &self.acting_forces());
            check_forces(&force, index)?;
            relaxation::update_acceleration(&mut self.state, &force);
            self.acceleration_ready = true;
        }
        relaxation::kick(&mut self.state, dt);
        relaxation::drift(&mut self.state, dt);
        let acting = self.acting_forces();
        check_forces(&acting, index)?;
        let force = relaxation::total_force(&self.state, &acting);
        relaxation::update_acceleration(&mut self.state, &force);
        relaxation::kick(&mut self.state, dt);
        self.state.check_finite(index)?;
        relaxation::quantize_state(&self.ctx, &mut self.state);
        let broken = self.update_connections(index);
        Ok(StepReport {
            iterations: 1,
            residual: relaxation::relative_residual(&self.state, &acting),
            converged: true,
            kinetic_energy: self.state.kinetic_energy(),
            broken,
        })
    }
}

impl MechanicsAdapter for MeshfreeAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Meshfree
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

    fn supports(&self, step: StepKind) -> bool {
        matches!(step, StepKind::QuasiStatic | StepKind::Explicit)
    }

    fn stable_dt(&self, step: StepKind) -> f64 {
        match step {
            StepKind::Explicit => self.cfl * self.critical_dt,
            _ => 1.0,
        }
    }

    fn step(&mut self, step: StepKind, dt: f64, index: u32) -> OsteonResult<StepReport> {
        let report = match step {
            StepKind::QuasiStatic => self.step_relaxation(index),
            StepKind::Explicit => self.step_explicit(dt, index),
            StepKind::Static | StepKind::Implicit => Err(OsteonError::InvalidConfig(format!(
                "meshfree adapter does not support {step:?} stepping"
            ))),
        };
        self.state.clear_contact();
        report
    }

    fn stress(&self) -> Vec<StressTensor> {
        let def_grad = self.deformation_gradients();
        self.ctx.map_points(def_grad.len(), |i| {
            StressTensor::from_mat(&self.measure.cauchy(&self.law, &def_grad[i]))
        })
    }

    fn damage(&self) -> Vec<f64> {
        self.family.damage()
    }

    fn strain_energy(&self) -> f64 {
        self.deformation_gradients()
            .iter()
            .zip(&self.volumes)
            .map(|(f, v)| v * self.measure.energy_density(&self.law, f))
            .sum()
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
