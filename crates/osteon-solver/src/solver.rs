//! Single-body solver: binds a domain and a material to an adapter and
//! drives it to a [`SolveResult`].

use std::time::Instant;

use osteon_domain::Domain;
use osteon_material::{specialize, Material};
use osteon_runtime::{BackendRequest, RuntimeContext};
use osteon_telemetry::{EventBus, EventKind};
use osteon_types::{AdapterKind, OsteonError, OsteonResult};
use tracing::{debug, info, warn};

use crate::adapter::{AdapterInstance, MechanicsAdapter, StepKind};
use crate::config::{AnalysisType, Integrator, SolverConfig};
use crate::result::{SolveResult, SolveWarning, StepReport};

/// Emit an energy snapshot every this many steps.
const ENERGY_STRIDE: u32 = 10;

/// Single-body solver.
///
/// The adapter is chosen once, at construction; every later call
/// dispatches through the closed [`AdapterInstance`] enum.
#[derive(Debug)]
pub struct Solver {
    ctx: RuntimeContext,
    adapter: AdapterInstance,
    config: SolverConfig,
    analysis: AnalysisType,
    warnings: Vec<SolveWarning>,
    telemetry: Option<EventBus>,
}

impl Solver {
    /// Specializes `material` for `kind` and builds the adapter.
    ///
    /// Errors with `InvalidConfig` when the domain type does not match the
    /// method (mesh for FEM, particles otherwise) or the configuration is
    /// unusable.
    pub fn new(
        ctx: &RuntimeContext,
        domain: &Domain,
        material: &Material,
        kind: AdapterKind,
        config: SolverConfig,
    ) -> OsteonResult<Self> {
        config.validate()?;
        let specialized = specialize(material, kind)?;

        let mut warnings = Vec::new();
        if let BackendRequest::Prefer(requested) = ctx.requested() {
            if requested != ctx.backend() {
                warnings.push(SolveWarning::BackendFallback { requested, used: ctx.backend() });
            }
        }
        if let Some(model) = specialized.projected_from {
            warnings.push(SolveWarning::MaterialProjected { model: model.to_string(), adapter: kind });
        }

        let adapter = AdapterInstance::build(ctx, domain, specialized, kind, &config)?;
        warnings.extend(adapter.warnings().iter().cloned());

        let analysis = match config.analysis {
            AnalysisType::Static if !kind.is_mesh_based() => {
                warn!(adapter = kind.name(), "static analysis unavailable, using quasi-static relaxation");
                warnings.push(SolveWarning::AnalysisSubstituted {
                    requested: AnalysisType::Static,
                    used: AnalysisType::QuasiStatic,
                });
                AnalysisType::QuasiStatic
            }
            other => other,
        };

        Ok(Self {
            ctx: ctx.clone(),
            adapter,
            config,
            analysis,
            warnings,
            telemetry: None,
        })
    }

    /// Attach a telemetry bus. It is flushed at the end of every solve.
    pub fn with_telemetry(mut self, bus: EventBus) -> Self {
        self.telemetry = Some(bus);
        self
    }

    pub fn telemetry(&self) -> Option<&EventBus> {
        self.telemetry.as_ref()
    }

    pub fn adapter(&self) -> &AdapterInstance {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut AdapterInstance {
        &mut self.adapter
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The analysis actually run, after any substitution.
    pub fn analysis(&self) -> AnalysisType {
        self.analysis
    }

    pub fn warnings(&self) -> &[SolveWarning] {
        &self.warnings
    }

    /// Lowest `count` natural frequencies in Hz. Mesh-based adapter only.
    pub fn natural_frequencies(&self, count: usize) -> OsteonResult<Vec<f64>> {
        match self.adapter.as_fem() {
            Some(fem) => fem.natural_frequencies(count),
            None => Err(OsteonError::InvalidConfig(format!(
                "natural frequencies need the fem adapter, got {}",
                self.adapter.kind().name()
            ))),
        }
    }

    fn record(&self, step: u32, kind: EventKind) {
        if let Some(bus) = &self.telemetry {
            bus.record(step, kind);
        }
    }

    /// Runs the configured analysis to completion.
    ///
    /// Non-convergence is reported through `converged = false`. Non-finite
    /// fields and cancellation abort with an error.
    pub fn solve(&mut self) -> OsteonResult<SolveResult> {
        let start = Instant::now();
        for w in &self.warnings {
            self.record(0, EventKind::Fallback { what: warning_name(w).into(), detail: format!("{w:?}") });
        }

        let (iterations, converged, mut final_residual) = match self.analysis {
            AnalysisType::Static => self.run_static()?,
            AnalysisType::QuasiStatic => self.run_quasi_static()?,
            AnalysisType::Dynamic => self.run_dynamic()?,
        };
        if self.analysis != AnalysisType::Dynamic {
            final_residual = self.adapter.residual();
        }

        let natural_frequencies = if self.config.modes > 0 && self.adapter.kind().is_mesh_based() {
            self.natural_frequencies(self.config.modes)?
        } else {
            Vec::new()
        };

        let elapsed_time = start.elapsed().as_secs_f64();
        let mut result = self.snapshot(iterations, converged, final_residual, elapsed_time);
        result.natural_frequencies = natural_frequencies;
        self.record(
            iterations,
            EventKind::Energy {
                kinetic: result.kinetic_energy,
                strain: result.strain_energy,
                external_work: self.adapter.state().external_work(),
            },
        );
        self.record(iterations, EventKind::Convergence { iterations, final_residual, converged });

        if let Some(bus) = &mut self.telemetry {
            bus.flush();
        }
        if converged {
            info!(
                method = result.method.name(),
                analysis = ?self.analysis,
                iterations,
                residual = final_residual,
                elapsed_time,
                "solve finished"
            );
        } else {
            warn!(
                method = result.method.name(),
                analysis = ?self.analysis,
                iterations,
                residual = final_residual,
                "solve did not converge"
            );
        }
        Ok(result)
    }

    /// Result fields read back from the adapter's current state.
    ///
    /// `natural_frequencies` is left empty.
    pub fn snapshot(&self, iterations: u32, converged: bool, final_residual: f64, elapsed_time: f64) -> SolveResult {
        SolveResult {
            displacements: self.adapter.displacements(),
            stress: self.adapter.stress(),
            damage: self.adapter.damage(),
            converged,
            iterations,
            elapsed_time,
            backend: self.ctx.backend(),
            precision: self.ctx.precision(),
            method: self.adapter.kind(),
            analysis: self.analysis,
            warnings: self.warnings.clone(),
            strain_energy: self.adapter.strain_energy(),
            final_residual,
            kinetic_energy: self.adapter.kinetic_energy(),
            natural_frequencies: Vec::new(),
        }
    }

    fn run_static(&mut self) -> OsteonResult<(u32, bool, f64)> {
        self.ctx.cancel_token().check(0)?;
        self.record(0, EventKind::StepBegin { time: 1.0 });
        let step_start = Instant::now();
        let report = self.adapter.step(StepKind::Static, 0.0, 0)?;
        self.record(0, EventKind::Iteration { iteration: report.iterations, residual: report.residual });
        self.record(0, EventKind::StepEnd { wall_time: step_start.elapsed().as_secs_f64() });
        Ok((report.iterations, report.converged, report.residual))
    }

    fn run_quasi_static(&mut self) -> OsteonResult<(u32, bool, f64)> {
        let limit = self.config.relaxation_steps;
        let mut last = StepReport::default();
        let mut converged = false;
        let mut taken = 0;

        for step in 0..limit {
            self.ctx.cancel_token().check(step)?;
            last = self.adapter.step(StepKind::QuasiStatic, 1.0, step)?;
            taken = step + 1;
            self.record(step, EventKind::Iteration { iteration: step, residual: last.residual });
            if step % ENERGY_STRIDE == 0 {
                debug!(step, residual = last.residual, kinetic = last.kinetic_energy, "relaxation step");
            }

            if last.residual <= self.config.relaxation_tolerance && last.broken == 0 {
                converged = true;
                break;
            }
        }
        Ok((taken, converged, last.residual))
    }

    fn run_dynamic(&mut self) -> OsteonResult<(u32, bool, f64)> {
        let kind = match (self.adapter.kind(), self.config.integrator) {
            (AdapterKind::Fem, Integrator::Newmark) => StepKind::Implicit,
            _ => StepKind::Explicit,
        };
        let stable = self.adapter.stable_dt(StepKind::Explicit);
        let mut dt = self.config.dt.unwrap_or(stable);
        if kind == StepKind::Explicit && dt > stable {
            warn!(requested = dt, used = stable, "time step above the stable estimate, clamping");
            self.warnings.push(SolveWarning::TimeStepClamped { requested: dt, used: stable });
            dt = stable;
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(OsteonError::InvalidConfig("no finite stable time step could be estimated".into()));
        }
        debug!(dt, steps = self.config.steps, integrator = ?kind, "dynamic analysis");

        let mut last = StepReport::default();
        for step in 0..self.config.steps {
            self.ctx.cancel_token().check(step)?;
            let step_start = Instant::now();
            self.record(step, EventKind::StepBegin { time: f64::from(step) * dt });
            last = self.adapter.step(kind, dt, step)?;
            if step % ENERGY_STRIDE == 0 {
                let state = self.adapter.state();
                self.record(
                    step,
                    EventKind::Energy {
                        kinetic: state.kinetic_energy(),
                        strain: self.adapter.strain_energy(),
                        external_work: state.external_work(),
                    },
                );
            }
            self.record(step, EventKind::StepEnd { wall_time: step_start.elapsed().as_secs_f64() });
        }
        Ok((self.config.steps, true, last.residual))
    }
}

fn warning_name(w: &SolveWarning) -> &'static str {
    match w {
        SolveWarning::MaterialProjected { .. } => "material_projected",
        SolveWarning::AnalysisSubstituted { .. } => "analysis_substituted",
        SolveWarning::BackendFallback { .. } => "backend_fallback",
        SolveWarning::SoftSprings => "soft_springs",
        SolveWarning::TimeStepClamped { .. } => "time_step_clamped",
    }
}
