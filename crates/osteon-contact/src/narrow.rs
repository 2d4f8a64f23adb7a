//! Nearest-point detection between two surfaces.

use osteon_domain::SpatialHash;
use osteon_runtime::RuntimeContext;

use crate::contact::ContactPair;
use crate::surface::ContactSurface;

/// Matches every point of `a` with its nearest point of `b` and keeps the
/// pairs whose signed gap along B's normal is below `gap_tolerance`.
///
/// Pairs come back ordered by A slot.
pub fn detect(
    ctx: &RuntimeContext,
    a: &ContactSurface,
    b: &ContactSurface,
    gap_tolerance: f64,
) -> Vec<ContactPair> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let reach = gap_tolerance + b.spacing.max;
    let hash = SpatialHash::build(&b.positions, reach);

    ctx.map_points(a.len(), |slot| {
        let p = a.positions[slot];
        let (b_slot, _) = hash.nearest(p, reach)?;
        let normal = b.normals[b_slot];
        let gap = (p - b.positions[b_slot]).dot(normal);
        (gap < gap_tolerance).then_some(ContactPair {
            a: a.indices[slot],
            b: b.indices[b_slot],
            a_slot: slot,
            b_slot,
            normal,
            gap,
        })
    })
    .into_iter()
    .flatten()
    .collect()
}
