//! Weighted least-squares fit error of an SVI curve in total variance.

use crate::slice::CalibrationPoint;
use crate::smile::SviParams;

/// Guard on `√((k−m)² + σ²)` in the gradient.
const RADIUS_EPS: f64 = 1e-12;

/// `f(x) = ½ · Σ wᵢ rᵢ² / Σ wᵢ` with `rᵢ = w(kᵢ; x) − wᵢ`, over `x = [a, b, ρ, m, σ]`.
///
/// Negative weights count as zero. With no positive weight the objective is
/// identically zero.
pub(crate) struct SviObjective<'a> {
    points: &'a [CalibrationPoint],
    weight_sum: f64,
}

impl<'a> SviObjective<'a> {
    pub(crate) fn new(points: &'a [CalibrationPoint]) -> Self {
        let weight_sum = points.iter().map(|p| p.weight.max(0.0)).sum();
        Self { points, weight_sum }
    }

    /// Objective value; writes the gradient into `grad`.
    pub(crate) fn value_and_gradient(&self, x: &[f64], grad: &mut [f64]) -> f64 {
        grad.fill(0.0);
        if self.weight_sum <= 0.0 {
            return 0.0;
        }
        let (a, b, rho, m, sigma) = (x[0], x[1], x[2], x[3], x[4]);

        let mut sum = 0.0;
        for p in self.points {
            let weight = p.weight.max(0.0);
            if weight <= 0.0 {
                continue;
            }
            let dk = p.k - m;
            let radius = (dk * dk + sigma * sigma).sqrt();
            let r = a + b * (rho * dk + radius) - p.w;
            sum += weight * r * r;

            let wr = weight * r;
            let guarded = radius.max(RADIUS_EPS);
            grad[0] += wr;
            grad[1] += wr * (rho * dk + radius);
            grad[2] += wr * b * dk;
            grad[3] += wr * b * (-rho - dk / guarded);
            grad[4] += wr * b * sigma / guarded;
        }

        let inv = 1.0 / self.weight_sum;
        grad.iter_mut().for_each(|g| *g *= inv);
        0.5 * sum * inv
    }

    /// Weighted RMSE `√(Σ wᵢ rᵢ² / Σ wᵢ)`; `None` without positive weight.
    pub(crate) fn rmse(&self, params: &SviParams) -> Option<f64> {
        if self.weight_sum <= 0.0 {
            return None;
        }
        let mut grad = [0.0; 5];
        let f = self.value_and_gradient(&params.as_array(), &mut grad);
        Some((2.0 * f).max(0.0).sqrt())
    }
}
