//! Benchmark metrics: data collected from one scenario run.

use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Points (nodes and particles) over all regions.
    pub point_count: usize,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Largest iteration or step count reported.
    pub iterations: u32,
    pub converged: bool,
    /// Largest displacement magnitude over the deformable regions.
    pub max_displacement: f64,
    /// Largest von Mises stress over the deformable regions.
    pub max_von_mises: f64,
    /// Largest damage value (0 for undamaged or mesh-based regions).
    pub max_damage: f64,
    /// Strain energy summed over the deformable regions.
    pub strain_energy: f64,
    /// Normal force summed over every contact.
    pub contact_force: f64,
    /// Signed relative error against the analytic reference, if any.
    pub reference_error: Option<f64>,
}

impl BenchmarkMetrics {
    /// Format as a CSV header row.
    pub fn to_csv_header() -> String {
        "scenario,points,iterations,converged,total_wall_time_s,max_displacement,max_von_mises,max_damage,strain_energy,contact_force,reference_error".to_string()
    }

    /// Format this metrics instance as a CSV data row.
    pub fn to_csv_row(&self) -> String {
        let reference = self.reference_error.map(|e| format!("{e:.6e}")).unwrap_or_default();
        format!(
            "{},{},{},{},{:.6},{:.6e},{:.6e},{:.4},{:.6e},{:.6e},{}",
            self.scenario,
            self.point_count,
            self.iterations,
            self.converged,
            self.total_wall_time,
            self.max_displacement,
            self.max_von_mises,
            self.max_damage,
            self.strain_energy,
            self.contact_force,
            reference,
        )
    }

    /// Format multiple metrics as a complete CSV string.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
