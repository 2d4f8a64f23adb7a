//! Multi-body scene solver.

use std::time::Instant;

use osteon_contact::{ContactDefinition, ContactForces, ContactParameters, ContactPipeline, ContactSurface};
use osteon_domain::Domain;
use osteon_material::Material;
use osteon_math::DVec3;
use osteon_runtime::RuntimeContext;
use osteon_solver::{AnalysisType, Integrator, MechanicsAdapter, SolveWarning, StepKind};
use osteon_telemetry::{EventBus, EventKind};
use osteon_types::{AdapterKind, BodyId, OsteonError, OsteonResult};
use tracing::{debug, info, warn};

use crate::body::{DeformableBody, SceneBody};
use crate::config::{SceneConfig, SceneMode};
use crate::result::{BodyResult, ContactReport, RigidReport, SceneResult};
use crate::rigid::RigidBody;

/// Emit an energy snapshot every this many iterations.
const ENERGY_STRIDE: u32 = 10;

/// Smallest and largest Aitken factor used between staggered solves.
const RELAXATION_BOUNDS: (f64, f64) = (1e-3, 1.0);

/// Where a run loop stopped.
struct Outcome {
    iterations: u32,
    converged: bool,
    /// Largest body residual of the last step, measured with contact applied.
    residual: f64,
    contacts: Vec<ContactForces>,
}

impl Outcome {
    fn new(converged: bool) -> Self {
        Self { iterations: 0, converged, residual: 0.0, contacts: Vec::new() }
    }
}

/// Bodies plus the contacts between them, solved together.
#[derive(Debug)]
pub struct Scene {
    ctx: RuntimeContext,
    config: SceneConfig,
    bodies: Vec<SceneBody>,
    contacts: Vec<ContactDefinition>,
    warnings: Vec<SolveWarning>,
    telemetry: Option<EventBus>,
}

impl Scene {
    pub fn new(ctx: &RuntimeContext, config: SceneConfig) -> OsteonResult<Self> {
        config.validate()?;
        Ok(Self {
            ctx: ctx.clone(),
            config,
            bodies: Vec::new(),
            contacts: Vec::new(),
            warnings: Vec::new(),
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

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Adds a deformable body discretized with `kind`.
    pub fn add_body(&mut self, domain: &Domain, material: &Material, kind: AdapterKind) -> OsteonResult<BodyId> {
        let mut config = self.config.solver.clone();
        match self.config.mode {
            SceneMode::Static => config.analysis = AnalysisType::Static,
            SceneMode::QuasiStatic => config.analysis = AnalysisType::QuasiStatic,
            SceneMode::Explicit => {
                config.analysis = AnalysisType::Dynamic;
                config.integrator = Integrator::CentralDifference;
                config.steps = self.config.steps;
            }
        }
        let body = DeformableBody::new(&self.ctx, domain, material, kind, config)?;
        Ok(self.push(SceneBody::Deformable(Box::new(body))))
    }

    pub fn add_rigid(&mut self, body: RigidBody) -> BodyId {
        self.push(SceneBody::Rigid(Box::new(body)))
    }

    fn push(&mut self, body: SceneBody) -> BodyId {
        self.bodies.push(body);
        BodyId((self.bodies.len() - 1) as u32)
    }

    /// Registers a contact between two existing bodies.
    pub fn add_contact(&mut self, definition: ContactDefinition) -> OsteonResult<()> {
        definition.validate(self.bodies.len())?;
        self.contacts.push(definition);
        Ok(())
    }

    pub fn bodies(&self) -> &[SceneBody] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&SceneBody> {
        self.bodies.get(id.index())
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut SceneBody> {
        self.bodies.get_mut(id.index())
    }

    pub fn contacts(&self) -> &[ContactDefinition] {
        &self.contacts
    }

    fn record(&self, step: u32, kind: EventKind) {
        if let Some(bus) = &self.telemetry {
            bus.record(step, kind);
        }
    }

    /// Solves the scene in the configured mode.
    ///
    /// Non-convergence is reported through `converged = false`. Invalid
    /// scene layouts, non-finite fields and cancellation are errors.
    pub fn solve(&mut self) -> OsteonResult<SceneResult> {
        let start = Instant::now();
        if self.bodies.is_empty() {
            return Err(OsteonError::EmptyDomain("scene has no bodies".into()));
        }
        for def in &self.contacts {
            def.validate(self.bodies.len())?;
        }
        for body in &mut self.bodies {
            if let SceneBody::Rigid(r) = body {
                r.reset_reaction();
            }
        }
        self.warnings.clear();
        for body in &self.bodies {
            if let Some(d) = body.as_deformable() {
                for w in d.solver().warnings() {
                    self.record(0, EventKind::Fallback { what: "body_warning".into(), detail: format!("{w:?}") });
                }
            }
        }

        let mut pipelines = self.build_pipelines()?;
        let outcome = match self.config.mode {
            SceneMode::Static => self.run_static(&mut pipelines)?,
            SceneMode::QuasiStatic => self.run_quasi_static(&mut pipelines)?,
            SceneMode::Explicit => self.run_explicit(&mut pipelines)?,
        };

        let elapsed_time = start.elapsed().as_secs_f64();
        let final_residual = outcome.residual;
        let result = self.collect(outcome, elapsed_time);
        self.record(
            result.iterations,
            EventKind::Convergence { iterations: result.iterations, final_residual, converged: result.converged },
        );
        if let Some(bus) = &mut self.telemetry {
            bus.flush();
        }
        if result.converged {
            info!(mode = ?result.mode, bodies = self.bodies.len(), iterations = result.iterations, elapsed_time, "scene solved");
        } else {
            warn!(mode = ?result.mode, iterations = result.iterations, "scene did not converge");
        }
        Ok(result)
    }

    fn build_pipelines(&self) -> OsteonResult<Vec<ContactPipeline>> {
        self.contacts
            .iter()
            .map(|def| {
                let a = &self.bodies[def.body_a.index()];
                let b = &self.bodies[def.body_b.index()];
                let params = ContactParameters::resolve(
                    def,
                    [a.modulus(), b.modulus()],
                    [a.domain().spacing(), b.domain().spacing()],
                    self.config.damping_ratio,
                    self.config.tangential_stiffness_factor,
                )?;
                debug!(
                    body_a = def.body_a.0,
                    body_b = def.body_b.0,
                    penalty = params.penalty,
                    gap_tolerance = params.gap_tolerance,
                    "contact resolved"
                );
                Ok(ContactPipeline::new(def.clone(), params))
            })
            .collect()
    }

    /// Evaluates every contact on the current configuration. Nothing is
    /// injected.
    fn contact_forces(&self, pipelines: &mut [ContactPipeline], step: u32) -> OsteonResult<Vec<ContactForces>> {
        let mut involved = vec![false; self.bodies.len()];
        for p in pipelines.iter() {
            involved[p.definition.body_a.index()] = true;
            involved[p.definition.body_b.index()] = true;
        }
        let surfaces: Vec<Option<ContactSurface>> = self
            .bodies
            .iter()
            .zip(&involved)
            .map(|(body, &used)| used.then(|| body.surface()))
            .collect();

        let mut all = Vec::with_capacity(pipelines.len());
        for (k, p) in pipelines.iter_mut().enumerate() {
            let (a, b) = (p.definition.body_a.index(), p.definition.body_b.index());
            let (Some(sa), Some(sb)) = (&surfaces[a], &surfaces[b]) else {
                all.push(ContactForces::default());
                continue;
            };
            let forces = p.step(&self.ctx, sa, sb, step)?;
            self.record(
                step,
                EventKind::Contact {
                    pair: k as u32,
                    active_pairs: forces.result.active_pairs,
                    max_penetration: forces.result.max_penetration,
                    normal_force: forces.result.normal_force,
                },
            );
            all.push(forces);
        }
        Ok(all)
    }

    /// Clears last step's contact and applies `forces` to the bodies.
    fn apply_contacts(&mut self, pipelines: &[ContactPipeline], forces: &[ContactForces]) {
        for body in &mut self.bodies {
            body.clear_contact();
        }
        for (p, f) in pipelines.iter().zip(forces) {
            self.bodies[p.definition.body_a.index()].apply_contact(&f.on_a);
            self.bodies[p.definition.body_b.index()].apply_contact(&f.on_b);
        }
    }

    fn end_rigid_steps(&mut self) {
        for body in &mut self.bodies {
            if let Some(r) = body.as_rigid_mut() {
                r.end_step();
            }
        }
    }

    fn schedules_done(&self) -> bool {
        self.bodies.iter().filter_map(SceneBody::as_rigid).all(RigidBody::is_finished)
    }

    fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .filter_map(SceneBody::as_deformable)
            .map(|d| d.adapter().kinetic_energy())
            .sum()
    }

    /// Penalty stiffness a contact adds to each boundary point of its bodies.
    fn contact_stiffness(&self, p: &ContactPipeline) -> f64 {
        let area = |id: BodyId| {
            let s = self.bodies[id.index()].domain().spacing();
            s.mean * s.mean
        };
        let area = area(p.definition.body_a).max(area(p.definition.body_b));
        p.params.penalty * area * (1.0 + p.params.tangential_factor)
    }

    // ─── Static ───────────────────────────────────────────────

    /// Staggered static solve of two mesh-based bodies (block Jacobi).
    ///
    /// The constrained body is solved alone first. Each iteration then
    /// recomputes the contact forces of both bodies from the current
    /// shapes, blends them into the held contact load with an
    /// Aitken-accelerated factor and re-solves both bodies against that
    /// same load, constrained one first.
    fn run_static(&mut self, pipelines: &mut [ContactPipeline]) -> OsteonResult<Outcome> {
        if self.bodies.len() != 2 {
            return Err(OsteonError::InvalidConfig(format!(
                "static scene needs exactly two bodies, got {}",
                self.bodies.len()
            )));
        }
        if let Some(i) = self.bodies.iter().position(|b| b.method() != Some(AdapterKind::Fem)) {
            return Err(OsteonError::InvalidConfig(format!("static scene body {i} is not a mesh-based body")));
        }
        for p in pipelines.iter() {
            let (a, b) = (p.definition.body_a.index(), p.definition.body_b.index());
            if !self.bodies[a].has_constraint() && !self.bodies[b].has_constraint() {
                return Err(OsteonError::SingularSystem(format!(
                    "neither body {a} nor body {b} has a fixed boundary condition"
                )));
            }
        }

        let mut order: Vec<usize> = (0..self.bodies.len()).collect();
        order.sort_by_key(|&i| !self.bodies[i].has_constraint());
        let counts: Vec<usize> = self.bodies.iter().map(|b| b.domain().point_count()).collect();
        let offsets: Vec<usize> = counts
            .iter()
            .scan(0, |acc, &n| {
                let start = *acc;
                *acc += n;
                Some(start)
            })
            .collect();
        let total: usize = counts.iter().sum();

        self.apply_contacts(pipelines, &[]);
        let mut outcome = Outcome::new(false);
        outcome.residual = self.solve_static_bodies(&order, 0)?;

        let mut applied = vec![DVec3::ZERO; total];
        let mut previous: Option<Vec<DVec3>> = None;
        let mut omega = self.config.contact_relaxation;

        for it in 0..self.config.max_iterations {
            self.ctx.cancel_token().check(it)?;
            let forces = self.contact_forces(pipelines, it)?;

            let mut target = vec![DVec3::ZERO; total];
            for (p, f) in pipelines.iter().zip(&forces) {
                let (oa, ob) = (offsets[p.definition.body_a.index()], offsets[p.definition.body_b.index()]);
                for &(i, v) in &f.on_a {
                    target[oa + i] += v;
                }
                for &(i, v) in &f.on_b {
                    target[ob + i] += v;
                }
            }
            outcome.contacts = forces;
            outcome.iterations = it + 1;

            let residual: Vec<DVec3> = target.iter().zip(&applied).map(|(g, f)| *g - *f).collect();
            let r_norm = norm(&residual);
            let reference = norm(&target).max(norm(&applied));
            self.record(it, EventKind::Iteration { iteration: it, residual: r_norm / reference.max(f64::MIN_POSITIVE) });
            debug!(iteration = it, residual = r_norm, reference, omega, "staggered contact iteration");
            if r_norm <= self.config.contact_tolerance * reference {
                outcome.converged = true;
                break;
            }

            if let Some(prev) = &previous {
                let mut num = 0.0;
                let mut den = 0.0;
                for (r, q) in residual.iter().zip(prev) {
                    let dr = *r - *q;
                    num += q.dot(dr);
                    den += dr.length_squared();
                }
                if den > 0.0 {
                    omega = (-omega * num / den).clamp(RELAXATION_BOUNDS.0, RELAXATION_BOUNDS.1);
                }
            }
            for (f, r) in applied.iter_mut().zip(&residual) {
                *f += *r * omega;
            }
            previous = Some(residual);

            for (body, (&start, &n)) in self.bodies.iter_mut().zip(offsets.iter().zip(&counts)) {
                body.clear_contact();
                let forces: Vec<(usize, DVec3)> = applied[start..start + n]
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| **f != DVec3::ZERO)
                    .map(|(i, f)| (i, *f))
                    .collect();
                body.apply_contact(&forces);
            }
            outcome.residual = self.solve_static_bodies(&order, it + 1)?;
        }
        Ok(outcome)
    }

    /// Newton-solves each body under its held contact load. Returns the
    /// largest final residual.
    fn solve_static_bodies(&mut self, order: &[usize], index: u32) -> OsteonResult<f64> {
        let mut residual: f64 = 0.0;
        for &i in order {
            if let Some(d) = self.bodies[i].as_deformable_mut() {
                let report = d.adapter_mut().step(StepKind::Static, 0.0, index)?;
                if !report.converged {
                    debug!(body = i, residual = report.residual, "static body solve hit the iteration cap");
                }
                residual = residual.max(report.residual);
            }
        }
        Ok(residual)
    }

    // ─── Quasi-static ─────────────────────────────────────────

    /// All bodies relax together. Converged once every rigid schedule is
    /// exhausted, the kinetic energy has decayed below the tolerance
    /// relative to its peak, the out-of-balance force is within the
    /// relaxation tolerance and no bond broke in the last iteration.
    fn run_quasi_static(&mut self, pipelines: &mut [ContactPipeline]) -> OsteonResult<Outcome> {
        for body in &mut self.bodies {
            if let Some(d) = body.as_deformable_mut() {
                d.adapter_mut().clear_contact_stiffness();
            }
        }
        for p in pipelines.iter() {
            let k = self.contact_stiffness(p);
            for id in [p.definition.body_a, p.definition.body_b] {
                if let Some(d) = self.bodies[id.index()].as_deformable_mut() {
                    let boundary = d.boundary().to_vec();
                    for i in boundary {
                        d.adapter_mut().add_contact_stiffness(i, k);
                    }
                }
            }
        }

        let tolerance = self.config.solver.relaxation_tolerance;
        let mut peak: f64 = 0.0;
        let mut outcome = Outcome::new(false);

        for it in 0..self.config.max_iterations {
            self.ctx.cancel_token().check(it)?;
            for body in &mut self.bodies {
                if let Some(r) = body.as_rigid_mut() {
                    r.advance(1.0);
                }
            }
            let forces = self.contact_forces(pipelines, it)?;
            self.apply_contacts(pipelines, &forces);

            let mut kinetic = 0.0;
            let mut residual: f64 = 0.0;
            let mut broken = 0;
            for body in &mut self.bodies {
                if let Some(d) = body.as_deformable_mut() {
                    let report = d.adapter_mut().step(StepKind::QuasiStatic, 1.0, it)?;
                    kinetic += report.kinetic_energy;
                    residual = residual.max(report.residual);
                    broken += report.broken;
                }
            }
            self.end_rigid_steps();
            outcome.contacts = forces;
            outcome.iterations = it + 1;
            outcome.residual = residual;
            peak = peak.max(kinetic);

            self.record(it, EventKind::Iteration { iteration: it, residual });
            if it % ENERGY_STRIDE == 0 {
                debug!(iteration = it, residual, kinetic, peak, "scene relaxation step");
                self.record(it, EventKind::Energy { kinetic, strain: self.strain_energy(), external_work: 0.0 });
            }

            let settled = peak <= 0.0 || kinetic <= self.config.kinetic_energy_tolerance * peak;
            if it >= 1 && self.schedules_done() && settled && residual <= tolerance && broken == 0 {
                outcome.converged = true;
                break;
            }
        }
        Ok(outcome)
    }

    fn strain_energy(&self) -> f64 {
        self.bodies
            .iter()
            .filter_map(SceneBody::as_deformable)
            .map(|d| d.adapter().strain_energy())
            .sum()
    }

    // ─── Explicit ─────────────────────────────────────────────

    /// Largest explicit step every body and contact tolerates.
    fn stable_dt(&self, pipelines: &[ContactPipeline]) -> f64 {
        let mut dt = self
            .bodies
            .iter()
            .filter_map(SceneBody::as_deformable)
            .map(|d| d.adapter().stable_dt(StepKind::Explicit))
            .fold(f64::INFINITY, f64::min);
        for p in pipelines {
            let k = self.contact_stiffness(p);
            for id in [p.definition.body_a, p.definition.body_b] {
                if let Some(d) = self.bodies[id.index()].as_deformable() {
                    let mass = &d.adapter().state().mass;
                    let lightest = d.boundary().iter().map(|&i| mass[i]).fold(f64::INFINITY, f64::min);
                    if lightest.is_finite() && k > 0.0 {
                        dt = dt.min(self.config.solver.cfl * 2.0 * (lightest / k).sqrt());
                    }
                }
            }
        }
        dt
    }

    /// Lock-step time marching. Always reported as converged.
    fn run_explicit(&mut self, pipelines: &mut [ContactPipeline]) -> OsteonResult<Outcome> {
        let stable = self.stable_dt(pipelines);
        let dt = match (self.config.dt, stable.is_finite()) {
            (Some(dt), true) if dt > stable => {
                warn!(requested = dt, used = stable, "scene time step above the stable estimate, clamping");
                self.warnings.push(SolveWarning::TimeStepClamped { requested: dt, used: stable });
                stable
            }
            (Some(dt), _) => dt,
            (None, true) => stable,
            (None, false) => 1.0,
        };
        if !(dt > 0.0) {
            return Err(OsteonError::InvalidConfig("no positive stable time step could be estimated".into()));
        }
        debug!(dt, steps = self.config.steps, "explicit scene");

        let mut outcome = Outcome::new(true);
        for step in 0..self.config.steps {
            self.ctx.cancel_token().check(step)?;
            let step_start = Instant::now();
            self.record(step, EventKind::StepBegin { time: f64::from(step) * dt });
            for body in &mut self.bodies {
                if let Some(r) = body.as_rigid_mut() {
                    r.advance(dt);
                }
            }
            let forces = self.contact_forces(pipelines, step)?;
            self.apply_contacts(pipelines, &forces);
            let mut residual: f64 = 0.0;
            for body in &mut self.bodies {
                if let Some(d) = body.as_deformable_mut() {
                    residual = residual.max(d.adapter_mut().step(StepKind::Explicit, dt, step)?.residual);
                }
            }
            self.end_rigid_steps();
            outcome.contacts = forces;
            outcome.iterations = step + 1;
            outcome.residual = residual;

            if step % ENERGY_STRIDE == 0 {
                self.record(
                    step,
                    EventKind::Energy { kinetic: self.kinetic_energy(), strain: self.strain_energy(), external_work: 0.0 },
                );
            }
            self.record(step, EventKind::StepEnd { wall_time: step_start.elapsed().as_secs_f64() });
        }
        Ok(outcome)
    }

    fn collect(&self, outcome: Outcome, elapsed_time: f64) -> SceneResult {
        let residual = outcome.residual;
        let bodies = self
            .bodies
            .iter()
            .map(|body| match body {
                SceneBody::Deformable(d) => BodyResult::Deformable(d.solver().snapshot(
                    outcome.iterations,
                    outcome.converged,
                    residual,
                    elapsed_time,
                )),
                SceneBody::Rigid(r) => BodyResult::Rigid(RigidReport {
                    reaction: r.reaction(),
                    moment: r.moment(),
                    accumulated_reaction: r.accumulated_reaction(),
                    steps_applied: r.steps_applied(),
                    displacements: r.displacements(),
                }),
            })
            .collect();

        let contacts = self
            .contacts
            .iter()
            .enumerate()
            .map(|(k, def)| {
                let f = outcome.contacts.get(k).cloned().unwrap_or_default();
                ContactReport {
                    body_a: def.body_a,
                    body_b: def.body_b,
                    active_pairs: f.result.active_pairs,
                    max_penetration: f.result.max_penetration,
                    normal_force: f.result.normal_force,
                    force_on_a: f.total_on_a(),
                    force_on_b: f.total_on_b(),
                    sticking: f.result.sticking,
                    slipping: f.result.slipping,
                }
            })
            .collect();

        SceneResult {
            bodies,
            contacts,
            converged: outcome.converged,
            iterations: outcome.iterations,
            kinetic_energy: self.kinetic_energy(),
            mode: self.config.mode,
            elapsed_time,
            backend: self.ctx.backend(),
            precision: self.ctx.precision(),
            warnings: self.warnings.clone(),
        }
    }
}

fn norm(v: &[DVec3]) -> f64 {
    v.iter().map(|x| x.length_squared()).sum::<f64>().sqrt()
}
