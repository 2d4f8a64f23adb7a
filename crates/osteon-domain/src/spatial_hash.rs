//! Uniform-grid spatial hash for radius and nearest-point queries.
//!
//! Points are binned into cubic cells; a query visits only the cells that
//! intersect the search sphere. Cell size should be close to the query
//! radius.

use std::collections::HashMap;

use osteon_math::DVec3;

/// Spatial hash over a fixed point set.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    inv_cell_size: f64,
    cell_size: f64,
    grid: HashMap<(i64, i64, i64), Vec<usize>>,
    points: Vec<DVec3>,
}

impl SpatialHash {
    /// Bins `points` into cells of edge `cell_size`.
    pub fn build(points: &[DVec3], cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() { cell_size.max(1e-12) } else { 1.0 };
        let mut hash = Self {
            inv_cell_size: 1.0 / cell_size,
            cell_size,
            grid: HashMap::new(),
            points: points.to_vec(),
        };
        for (i, p) in points.iter().enumerate() {
            let key = hash.cell_key(*p);
            hash.grid.entry(key).or_default().push(i);
        }
        hash
    }

    fn cell_key(&self, p: DVec3) -> (i64, i64, i64) {
        (
            (p.x * self.inv_cell_size).floor() as i64,
            (p.y * self.inv_cell_size).floor() as i64,
            (p.z * self.inv_cell_size).floor() as i64,
        )
    }

    /// Number of points indexed.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends to `out` every indexed point within `radius` of `center`.
    ///
    /// The output order is ascending by index.
    pub fn query_radius(&self, center: DVec3, radius: f64, out: &mut Vec<usize>) {
        let start = out.len();
        let reach = (radius * self.inv_cell_size).ceil() as i64;
        let (cx, cy, cz) = self.cell_key(center);
        let r2 = radius * radius;
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    if let Some(bucket) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &j in bucket {
                            if (self.points[j] - center).length_squared() <= r2 {
                                out.push(j);
                            }
                        }
                    }
                }
            }
        }
        out[start..].sort_unstable();
    }

    /// Nearest indexed point to `center` within `max_radius`.
    pub fn nearest(&self, center: DVec3, max_radius: f64) -> Option<(usize, f64)> {
        let mut candidates = Vec::new();
        self.query_radius(center, max_radius, &mut candidates);
        let mut best: Option<(usize, f64)> = None;
        for j in candidates {
            let d = (self.points[j] - center).length();
            match best {
                Some((_, bd)) if bd <= d => {}
                _ => best = Some((j, d)),
            }
        }
        best
    }

    /// Neighbor lists of every indexed point within `radius`, excluding itself.
    pub fn neighbor_lists(&self, radius: f64) -> Vec<Vec<usize>> {
        let mut lists = Vec::with_capacity(self.points.len());
        let mut scratch = Vec::new();
        for (i, p) in self.points.iter().enumerate() {
            scratch.clear();
            self.query_radius(*p, radius, &mut scratch);
            lists.push(scratch.iter().copied().filter(|&j| j != i).collect());
        }
        lists
    }

    /// Cell edge length.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }
}
