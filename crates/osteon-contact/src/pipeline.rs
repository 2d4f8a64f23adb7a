//! Detection and response for one contact definition.

use osteon_runtime::RuntimeContext;
use osteon_types::{OsteonError, OsteonResult};
use tracing::trace;

use crate::definition::{ContactDefinition, ContactParameters};
use crate::narrow::detect;
use crate::response::{ContactForces, ContactResponse, PenaltyFriction};
use crate::surface::ContactSurface;

/// Runs detection then response for one body pair.
pub struct ContactPipeline {
    pub definition: ContactDefinition,
    pub params: ContactParameters,
    response: Box<dyn ContactResponse>,
}

impl std::fmt::Debug for ContactPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactPipeline")
            .field("definition", &self.definition)
            .field("params", &self.params)
            .field("response", &self.response.name())
            .finish()
    }
}

impl ContactPipeline {
    /// Pipeline with the [`PenaltyFriction`] response.
    pub fn new(definition: ContactDefinition, params: ContactParameters) -> Self {
        Self { definition, params, response: Box::new(PenaltyFriction::new(params)) }
    }

    /// Detects pairs between `a` and `b` and resolves them into forces.
    ///
    /// Non-finite forces abort with `NonFinite` tagged with `step`.
    pub fn step(
        &mut self,
        ctx: &RuntimeContext,
        a: &ContactSurface,
        b: &ContactSurface,
        step: u32,
    ) -> OsteonResult<ContactForces> {
        let pairs = detect(ctx, a, b, self.params.gap_tolerance);
        let forces = self.response.resolve(&pairs, a, b)?;
        if forces.on_a.iter().chain(&forces.on_b).any(|(_, f)| !f.is_finite()) {
            return Err(OsteonError::NonFinite { step, field: "contact force".into() });
        }
        trace!(
            body_a = self.definition.body_a.0,
            body_b = self.definition.body_b.0,
            candidates = pairs.len(),
            active = forces.result.active_pairs,
            normal = forces.result.normal_force,
            "contact evaluated"
        );
        Ok(forces)
    }

    pub fn reset(&mut self) {
        self.response.reset();
    }
}

