//! Neighbor families for the particle adapters, stored in CSR layout.
//!
//! ```text
//! offsets:   [0, 3, 5, ...]       bonds of point i: offsets[i]..offsets[i+1]
//! neighbors: [j0, j1, j2, k0, ..] ascending within a family
//! mirror:    index of the reverse bond (j → i) for each bond (i → j)
//! ```

use std::ops::Range;

use osteon_domain::SpatialHash;
use osteon_math::DVec3;
use osteon_runtime::RuntimeContext;

#[derive(Debug, Clone)]
pub struct BondFamily {
    pub offsets: Vec<usize>,
    pub neighbors: Vec<usize>,
    /// Owning point of each bond.
    pub owner: Vec<usize>,
    /// Reference bond vector `X_j − X_i`.
    pub xi: Vec<DVec3>,
    pub length: Vec<f64>,
    pub weight: Vec<f64>,
    pub mirror: Vec<usize>,
    pub intact: Vec<bool>,
    initial: Vec<usize>,
}

impl BondFamily {
    /// Builds families of every point within `radius`.
    ///
    /// `include_self` adds the zero-length bond `i → i`, which the
    /// reproducing-kernel gradients need.
    pub fn build(
        positions: &[DVec3],
        radius: f64,
        include_self: bool,
        weight: impl Fn(f64) -> f64,
    ) -> Self {
        let hash = SpatialHash::build(positions, radius);
        let mut offsets = Vec::with_capacity(positions.len() + 1);
        let mut neighbors = Vec::new();
        let mut owner = Vec::new();
        let mut xi = Vec::new();
        let mut length = Vec::new();
        let mut weights = Vec::new();
        let mut scratch = Vec::new();

        offsets.push(0);
        for (i, &p) in positions.iter().enumerate() {
            scratch.clear();
            hash.query_radius(p, radius, &mut scratch);
            for &j in &scratch {
                if j == i && !include_self {
                    continue;
                }
                let d = positions[j] - p;
                let l = d.length();
                neighbors.push(j);
                owner.push(i);
                xi.push(d);
                length.push(l);
                weights.push(weight(l));
            }
            offsets.push(neighbors.len());
        }

        let mirror = (0..neighbors.len())
            .map(|b| {
                let (i, j) = (owner[b], neighbors[b]);
                let family = &neighbors[offsets[j]..offsets[j + 1]];
                offsets[j] + family.binary_search(&i).unwrap_or(0)
            })
            .collect();

        let initial = (0..positions.len())
            .map(|i| (offsets[i]..offsets[i + 1]).filter(|&b| neighbors[b] != i).count())
            .collect();

        let intact = vec![true; neighbors.len()];
        Self {
            offsets,
            neighbors,
            owner,
            xi,
            length,
            weight: weights,
            mirror,
            intact,
            initial,
        }
    }

    #[inline]
    pub fn bonds(&self, i: usize) -> Range<usize> {
        self.offsets[i]..self.offsets[i + 1]
    }

    pub fn point_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn bond_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Intact bonds of `i`, excluding the self bond.
    pub fn intact_count(&self, i: usize) -> usize {
        self.bonds(i)
            .filter(|&b| self.intact[b] && self.neighbors[b] != i)
            .count()
    }

    pub fn initial_count(&self, i: usize) -> usize {
        self.initial[i]
    }

    /// Largest initial family size.
    pub fn max_family(&self) -> usize {
        self.initial.iter().copied().max().unwrap_or(0)
    }

    /// Broken fraction of each family, in `[0, 1]`.
    pub fn damage(&self) -> Vec<f64> {
        (0..self.point_count())
            .map(|i| {
                let n0 = self.initial[i];
                if n0 == 0 {
                    0.0
                } else {
                    1.0 - self.intact_count(i) as f64 / n0 as f64
                }
            })
            .collect()
    }

    /// Breaks every intact bond whose stretch exceeds `critical`. Both
    /// directions of a bond see the same stretch, so breakage stays
    /// symmetric. Returns the number of broken pairs.
    pub fn break_overstretched(
        &mut self,
        ctx: &RuntimeContext,
        current: &[DVec3],
        critical: f64,
    ) -> usize {
        let keep = ctx.map_points(self.bond_count(), |b| {
            let (i, j) = (self.owner[b], self.neighbors[b]);
            if !self.intact[b] || i == j {
                return self.intact[b];
            }
            let stretch = ((current[j] - current[i]).length() - self.length[b]) / self.length[b];
            stretch <= critical
        });
        let mut broken = 0;
        for (b, k) in keep.into_iter().enumerate() {
            if self.intact[b] && !k {
                self.intact[b] = false;
                broken += 1;
            }
        }
        broken / 2
    }
}
