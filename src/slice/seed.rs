//! Heuristic starting point, box constraints and multi-start set for an SVI fit.
//!
//! The seed reads the shape of the data: the variance minimum locates the
//! vertex `m`, regressions over the two wings give the asymptotic slopes
//! `b(1 ± ρ)`, and a quadratic fit around the vertex gives the curvature
//! `w'' ≈ b/σ` there.

use nalgebra::{DMatrix, DVector};

use crate::slice::CalibrationPoint;
use crate::slice::config::SeedConfig;
use crate::smile::SviParams;

/// Floor on the absolute wing slopes.
const SLOPE_FLOOR: f64 = 1e-4;
/// Guard on the slope sum when normalizing the asymmetry into ρ.
const SLOPE_SUM_EPS: f64 = 1e-12;
const SEED_B_MIN: f64 = 1e-6;
const SEED_B_MAX: f64 = 10.0;
/// |ρ| limit for seeds and perturbed starts.
const SEED_RHO_LIMIT: f64 = 0.95;
/// Vertex curvature below this is treated as flat.
const CURVATURE_EPS: f64 = 1e-6;
const SEED_SIGMA_MIN: f64 = 1e-4;
const SEED_SIGMA_MAX: f64 = 2.0;
/// σ seed as a share of the k range when the vertex is flat.
const FLAT_SIGMA_FRACTION: f64 = 0.2;
const SEED_A_FLOOR: f64 = 1e-10;
const RANGE_FLOOR: f64 = 1e-6;

const A_LOWER: f64 = 1e-12;
const B_LOWER: f64 = 1e-8;
const B_UPPER: f64 = 10.0;
const RHO_BOUND: f64 = 0.999;
const SIGMA_LOWER: f64 = 1e-6;
const SIGMA_UPPER: f64 = 5.0;

/// Seed parameters plus the box the optimizer runs in.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Seed {
    pub params: SviParams,
    pub lower: [f64; 5],
    pub upper: [f64; 5],
    k_min: f64,
    k_max: f64,
    range: f64,
}

impl Seed {
    /// Seed followed by the two perturbed starts `(ρ ± shift, m ± fraction·range)`.
    pub fn starts(&self, cfg: &SeedConfig) -> [[f64; 5]; 3] {
        let base = self.params.as_array();
        let perturbed = |sign: f64| {
            let mut x = base;
            x[2] = (x[2] + sign * cfg.rho_shift).clamp(-SEED_RHO_LIMIT, SEED_RHO_LIMIT);
            x[3] = (x[3] + sign * cfg.m_shift_fraction * self.range)
                .clamp(self.k_min - self.range, self.k_max + self.range);
            x
        };
        [base, perturbed(1.0), perturbed(-1.0)]
    }

    /// Seed clamped component-wise into the box.
    pub fn clamped(&self) -> SviParams {
        let mut x = self.params.as_array();
        for (i, xi) in x.iter_mut().enumerate() {
            *xi = xi.clamp(self.lower[i], self.upper[i]);
        }
        SviParams::from_array(x)
    }
}

/// Build the seed from points sorted by `k`. Requires at least two points.
pub(crate) fn heuristic_seed(points: &[CalibrationPoint], cfg: &SeedConfig) -> Seed {
    let n = points.len();
    let k_min = points[0].k;
    let k_max = points[n - 1].k;
    let range = (k_max - k_min).max(RANGE_FLOOR);

    let (i_min, w_min) = points
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |acc, (i, p)| if p.w < acc.1 { (i, p.w) } else { acc });
    let w_max = points.iter().map(|p| p.w).fold(f64::NEG_INFINITY, f64::max);
    let w_range = w_max - w_min;
    let m0 = points[i_min].k;

    let tail = ((n as f64 * cfg.tail_fraction) as usize)
        .max(cfg.min_tail_points)
        .min(n);
    let s_left = linear_slope(&points[..tail]).abs().max(SLOPE_FLOOR);
    let s_right = linear_slope(&points[n - tail..]).abs().max(SLOPE_FLOOR);

    let b0 = (0.5 * (s_left + s_right)).clamp(SEED_B_MIN, SEED_B_MAX);
    let rho0 = ((s_right - s_left) / (s_right + s_left).max(SLOPE_SUM_EPS))
        .clamp(-SEED_RHO_LIMIT, SEED_RHO_LIMIT);

    let curvature = vertex_curvature(points, i_min, cfg.vertex_neighbours);
    let sigma0 = if curvature > CURVATURE_EPS {
        (b0 / curvature).clamp(SEED_SIGMA_MIN, SEED_SIGMA_MAX)
    } else {
        (FLAT_SIGMA_FRACTION * range).clamp(SEED_SIGMA_MIN, SEED_SIGMA_MAX)
    };
    let a0 = (w_min - b0 * sigma0).max(SEED_A_FLOOR);

    let a_span = if w_range > 0.0 {
        w_range
    } else {
        w_min + b0 * sigma0 + 1.0
    };
    let a_max = (5.0 * a_span).max(1.0);

    Seed {
        params: SviParams::new(a0, b0, rho0, m0, sigma0),
        lower: [A_LOWER, B_LOWER, -RHO_BOUND, k_min - range, SIGMA_LOWER],
        upper: [a_max, B_UPPER, RHO_BOUND, k_max + range, SIGMA_UPPER],
        k_min,
        k_max,
        range,
    }
}

/// Ordinary least-squares slope of `w` on `k`; zero when degenerate.
fn linear_slope(points: &[CalibrationPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let (sx, sy, sxx, sxy) = points.iter().fold((0.0, 0.0, 0.0, 0.0), |(sx, sy, sxx, sxy), p| {
        (sx + p.k, sy + p.w, sxx + p.k * p.k, sxy + p.k * p.w)
    });
    let den = n * sxx - sx * sx;
    if den.abs() > 0.0 {
        (n * sxy - sx * sy) / den
    } else {
        0.0
    }
}

/// Second derivative `2c` of `w ≈ c₀ + c₁x + c x²`, `x = k − k_vertex`, fitted
/// over the `neighbours` points closest to the vertex. Zero when fewer than
/// three points are available or the fit is singular.
fn vertex_curvature(points: &[CalibrationPoint], i_min: usize, neighbours: usize) -> f64 {
    let take = neighbours.min(points.len());
    if take < 3 {
        return 0.0;
    }
    let k_vertex = points[i_min].k;
    let mut nearest: Vec<&CalibrationPoint> = points.iter().collect();
    nearest.sort_by(|a, b| (a.k - k_vertex).abs().total_cmp(&(b.k - k_vertex).abs()));
    nearest.truncate(take);

    let design = DMatrix::<f64>::from_fn(take, 3, |i, j| {
        let x = nearest[i].k - k_vertex;
        match j {
            0 => 1.0,
            1 => x,
            _ => x * x,
        }
    });
    let rhs = DVector::from_iterator(take, nearest.iter().map(|p| p.w));

    let ata = design.transpose() * &design;
    let atb = design.transpose() * &rhs;
    match ata.qr().solve(&atb) {
        Some(c) if c[2].is_finite() => 2.0 * c[2],
        _ => 0.0,
    }
}
