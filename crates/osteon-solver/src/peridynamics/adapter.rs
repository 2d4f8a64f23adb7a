//! Peridynamic (correspondence) adapter.

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

/// Non-ordinary state-based peridynamics over a particle cloud.
///
/// Hyperelastic materials arrive here as their linear-elastic projection;
/// the stress measure is chosen by [`StressMeasure`].
#[derive(Debug)]
pub struct PeridynamicsAdapter {
    ctx: RuntimeContext,
    domain: Domain,
    law: LinearElasticLaw,
    measure: StressMeasure,
    volumes: Vec<f64>,
    family: BondFamily,
    k_inv: Vec<DMat3>,
    horizon: f64,
    critical_stretch: Option<f64>,
    stabilization: f64,
    scale: Vec<f64>,
    modulus: f64,
    critical_dt: f64,
    cfl: f64,
    state: PointState,
    relaxation: Relaxation,
    acceleration_ready: bool,
    warnings: Vec<SolveWarning>,
}

impl PeridynamicsAdapter {
    pub fn new(
        ctx: &RuntimeContext,
        domain: &Domain,
        material: Specialized,
        config: &SolverConfig,
    ) -> OsteonResult<Self> {
        let particles = domain.particles().ok_or_else(|| {
            OsteonError::InvalidConfig("peridynamics adapter requires a particle domain".into())
        })?;
        let pd = &config.peridynamics;
        if !(pd.horizon_factor > 1.0) {
            return Err(OsteonError::InvalidConfig(format!(
                "horizon factor must exceed 1, got {}",
                pd.horizon_factor
            )));
        }
        if pd.stabilization < 0.0 {
            return Err(OsteonError::InvalidConfig("stabilization must be non-negative".into()));
        }

        let positions = domain.positions();
        let volumes = particles.volumes.clone();
        let horizon = pd.horizon_factor * domain.spacing().mean;
        let family = BondFamily::build(&positions, horizon, false, |_| 1.0);
        let k_inv = kernel::inverse_shape_tensors(ctx, &family, &volumes);

        let law = material.lame();
        let bulk = law.lambda + 2.0 * law.mu / 3.0;
        let micro_modulus = 18.0 * bulk / (std::f64::consts::PI * horizon.powi(4));
        let critical_stretch = match (pd.critical_stretch, pd.fracture_energy) {
            (Some(s), _) => Some(s),
            (None, Some(g0)) => Some((5.0 * g0 / (9.0 * bulk * horizon)).sqrt()),
            (None, None) => None,
        };

        let max_family = family.max_family().max(1) as f64;
        let scale = (0..family.point_count())
            .map(|i| family.initial_count(i) as f64 / max_family)
            .collect();

        let mass: Vec<f64> = volumes.iter().map(|v| v * material.density).collect();
        let state = PointState::new(&positions, mass, domain.fixed_mask());

        let mut adapter = Self {
            ctx: ctx.clone(),
            domain: domain.clone(),
            law,
            measure: pd.stress_measure,
            volumes,
            family,
            k_inv,
            horizon,
            critical_stretch,
            stabilization: pd.stabilization * micro_modulus,
            scale,
            modulus: (3.0 * law.lambda + 2.0 * law.mu).max(2.0 * law.mu),
            critical_dt: f64::INFINITY,
            cfl: config.cfl,
            state,
            relaxation: Relaxation::new(positions.len(), pd.kinetic_damping),
            acceleration_ready: false,
            warnings: Vec::new(),
        };
        adapter.state.set_external(&domain.nodal_forces());
        adapter.refresh_stiffness(false);

        debug!(
            particles = positions.len(),
            bonds = adapter.family.bond_count() / 2,
            horizon,
            critical_stretch = ?critical_stretch,
            "peridynamics adapter ready"
        );
        Ok(adapter)
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn family(&self) -> &BondFamily {
        &self.family
    }

    pub fn critical_stretch(&self) -> Option<f64> {
        self.critical_stretch
    }

    /// Recomputes the stiffness bound, the relaxation masses and the
    /// critical time step. Relaxation masses only ever grow.
    fn refresh_stiffness(&mut self, keep_larger: bool) {
        let bounds = kernel::stiffness_bounds(
            &self.ctx,
            &self.family,
            &self.volumes,
            &self.k_inv,
            self.modulus,
            self.stabilization,
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

    fn deformation_gradients(&self, current: &[DVec3]) -> Vec<DMat3> {
        kernel::deformation_gradients(&self.ctx, &self.family, &self.volumes, &self.k_inv, current)
    }

    /// Force on each particle from its bonds.
    fn acting_forces(&self) -> Vec<DVec3> {
        let current = self.state.positions();
        let def_grad = self.deformation_gradients(&current);
        let stress_map = self.ctx.map_points(def_grad.len(), |i| {
            self.measure.first_piola(&self.law, &def_grad[i]) * self.k_inv[i]
        });
        kernel::internal_forces(
            &self.ctx,
            &ForceInput {
                family: &self.family,
                volumes: &self.volumes,
                current: &current,
                def_grad: &def_grad,
                stress_map: &stress_map,
                stabilization: self.stabilization,
                scale: &self.scale,
            },
        )
    }

    /// Breaks overstretched bonds and refreshes the dependent data.
    fn update_bonds(&mut self, index: u32) -> usize {
        let Some(critical) = self.critical_stretch else { return 0 };
        let current = self.state.positions();
        let broken = self.family.break_overstretched(&self.ctx, &current, critical);
        if broken > 0 {
            self.k_inv = kernel::inverse_shape_tensors(&self.ctx, &self.family, &self.volumes);
            self.refresh_stiffness(true);
            info!(step = index, broken, "bonds broken");
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
        let broken = self.update_bonds(index);
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
        let broken = self.update_bonds(index);
        Ok(StepReport {
            iterations: 1,
            residual: relaxation::relative_residual(&self.state, &acting),
            converged: true,
            kinetic_energy: self.state.kinetic_energy(),
            broken,
        })
    }
}

impl MechanicsAdapter for PeridynamicsAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Peridynamics
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
                "peridynamics adapter does not support {step:?} stepping"
            ))),
        };
        self.state.clear_contact();
        report
    }

    fn stress(&self) -> Vec<StressTensor> {
        let def_grad = self.deformation_gradients(&self.state.positions());
        self.ctx.map_points(def_grad.len(), |i| {
            StressTensor::from_mat(&self.measure.cauchy(&self.law, &def_grad[i]))
        })
    }

    fn damage(&self) -> Vec<f64> {
        self.family.damage()
    }

    fn strain_energy(&self) -> f64 {
        let def_grad = self.deformation_gradients(&self.state.positions());
        def_grad
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
