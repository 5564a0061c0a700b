//! Per-call configuration for slice calibration.

use serde::{Deserialize, Serialize};

use crate::optim::ProjectedGradientConfig;

/// Settings for one slice calibration.
///
/// Every field has a default, so partial JSON documents deserialize:
///
/// ```
/// use volslice::SliceConfig;
///
/// let cfg: SliceConfig = serde_json::from_str(r#"{"min_points": 4}"#).unwrap();
/// assert_eq!(cfg.min_points, 4);
/// assert!(cfg.use_vega_weights);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    /// Weight each point by its Black vega (floored at `min_vega`).
    pub use_vega_weights: bool,
    /// Exponent `p` of the wing damping factor `1/(1 + |k|^p)`.
    pub wing_damping_pow: f64,
    pub min_vega: f64,
    /// Fewer valid points than `max(3, min_points)` yields the fallback curve.
    pub min_points: usize,
    pub seed: SeedConfig,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            use_vega_weights: true,
            wing_damping_pow: 2.0,
            min_vega: 1e-8,
            min_points: 6,
            seed: SeedConfig::default(),
        }
    }
}

/// Heuristic seeding and multi-start settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Share of points in each wing used for the slope regressions.
    pub tail_fraction: f64,
    pub min_tail_points: usize,
    /// Points nearest the variance minimum used for the curvature fit.
    pub vertex_neighbours: usize,
    /// ρ shift of the two perturbed starts.
    pub rho_shift: f64,
    /// m shift of the perturbed starts, as a fraction of the k range.
    pub m_shift_fraction: f64,
    /// Optimizer iteration budget per start.
    pub max_iters: usize,
    /// Projected-gradient norm at which a start counts as converged.
    pub tolerance: f64,
    pub optimizer: ProjectedGradientConfig,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            tail_fraction: 0.2,
            min_tail_points: 2,
            vertex_neighbours: 5,
            rho_shift: 0.2,
            m_shift_fraction: 0.25,
            max_iters: 5000,
            tolerance: 1e-8,
            optimizer: ProjectedGradientConfig::default(),
        }
    }
}
