//! Box-constrained minimization by projected gradient descent.
//!
//! Each iteration proposes `P(x − α·∇f(x))`, where `P` clamps onto the box,
//! and accepts it only if the objective strictly decreases. Accepted moves
//! enlarge the trial step `α`; rejected ones halve it. The run stops when the
//! projected gradient vanishes (converged), the iteration budget is spent, or
//! `α` collapses below its floor (not converged).
//!
//! With `spectral` enabled (the default) the step after an accepted move is
//! the Barzilai–Borwein estimate `sᵀs / sᵀy`, clamped to
//! `[min_step, max_step]`. It tracks the local curvature, so it may shrink
//! after an accepted move or grow well beyond `growth`. Badly scaled problems
//! such as SVI fits need this. [`ProjectedGradientConfig::geometric`] restores
//! the plain rule: grow by `growth` up to `max_step = 1` after acceptance.

use serde::{Deserialize, Serialize};

/// Step-size control for [`minimize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectedGradientConfig {
    pub initial_step: f64,
    /// Multiplier applied after an accepted move (non-spectral, or when the
    /// spectral estimate is unusable).
    pub growth: f64,
    /// Multiplier applied after a rejected move.
    pub shrink: f64,
    pub max_step: f64,
    /// Early stop once the step falls below this.
    pub min_step: f64,
    /// Use Barzilai–Borwein steps after accepted moves.
    pub spectral: bool,
}

impl Default for ProjectedGradientConfig {
    fn default() -> Self {
        Self {
            initial_step: 0.1,
            growth: 1.2,
            shrink: 0.5,
            max_step: 1e6,
            min_step: 1e-10,
            spectral: true,
        }
    }
}

impl ProjectedGradientConfig {
    /// Plain geometric rule: grow by 1.2 up to 1, halve on rejection.
    pub fn geometric() -> Self {
        Self {
            max_step: 1.0,
            spectral: false,
            ..Self::default()
        }
    }
}

/// Result of a [`minimize`] run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeastSquaresResult {
    /// Best point seen.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub objective: f64,
    /// Candidate evaluations performed.
    pub iterations: usize,
    pub converged: bool,
}

fn bound(bounds: &[f64], i: usize, default: f64) -> f64 {
    bounds.get(i).copied().unwrap_or(default)
}

fn project(x: &mut [f64], lower: &[f64], upper: &[f64]) {
    for (i, xi) in x.iter_mut().enumerate() {
        *xi = xi
            .max(bound(lower, i, f64::NEG_INFINITY))
            .min(bound(upper, i, f64::INFINITY));
    }
}

/// ‖x − P(x − g)‖: the gradient with components blocked by active bounds removed.
fn projected_gradient_norm(x: &[f64], g: &[f64], lower: &[f64], upper: &[f64]) -> f64 {
    x.iter()
        .zip(g)
        .enumerate()
        .map(|(i, (&xi, &gi))| {
            let moved = (xi - gi)
                .max(bound(lower, i, f64::NEG_INFINITY))
                .min(bound(upper, i, f64::INFINITY));
            (xi - moved).powi(2)
        })
        .sum::<f64>()
        .sqrt()
}

/// Minimize `objective` over the box `[lower, upper]` starting from `x0`.
///
/// `objective(x, grad)` returns f(x) and writes ∇f(x) into `grad`. Bound
/// slices shorter than `x0` leave the remaining coordinates unbounded. The
/// returned point is the best one seen, even when the run did not converge.
///
/// # Examples
/// ```
/// use volslice::optim::{minimize, ProjectedGradientConfig};
///
/// // min (x − 3)² subject to x ≤ 1
/// let res = minimize(
///     &[0.0],
///     &[-10.0],
///     &[1.0],
///     |x, g| {
///         g[0] = 2.0 * (x[0] - 3.0);
///         (x[0] - 3.0).powi(2)
///     },
///     200,
///     1e-10,
///     &ProjectedGradientConfig::default(),
/// );
/// assert!(res.converged);
/// assert_eq!(res.x[0], 1.0);
/// ```
pub fn minimize<F>(
    x0: &[f64],
    lower: &[f64],
    upper: &[f64],
    objective: F,
    max_iters: usize,
    tolerance: f64,
    config: &ProjectedGradientConfig,
) -> LeastSquaresResult
where
    F: Fn(&[f64], &mut [f64]) -> f64,
{
    let n = x0.len();
    let mut x = x0.to_vec();
    project(&mut x, lower, upper);
    let mut g = vec![0.0; n];
    let mut f = objective(&x, &mut g);

    let mut best_x = x.clone();
    let mut best_f = f;

    let mut x_new = vec![0.0; n];
    let mut g_new = vec![0.0; n];
    let mut step = config.initial_step;
    let mut iterations = 0;
    let mut converged = false;
    let mut moved = true;

    while iterations < max_iters {
        if moved {
            if projected_gradient_norm(&x, &g, lower, upper) < tolerance {
                converged = true;
                break;
            }
            moved = false;
        }
        iterations += 1;

        for ((xn, &xi), &gi) in x_new.iter_mut().zip(&x).zip(&g) {
            *xn = xi - step * gi;
        }
        project(&mut x_new, lower, upper);
        let f_new = objective(&x_new, &mut g_new);

        if f_new < f {
            let spectral = if config.spectral {
                let (ss, sy) = x_new
                    .iter()
                    .zip(&x)
                    .zip(g_new.iter().zip(&g))
                    .fold((0.0, 0.0), |(ss, sy), ((&xn, &xo), (&gn, &go))| {
                        let s = xn - xo;
                        (ss + s * s, sy + s * (gn - go))
                    });
                (sy > 0.0 && (ss / sy).is_finite()).then(|| ss / sy)
            } else {
                None
            };
            step = spectral
                .unwrap_or(step * config.growth)
                .clamp(config.min_step, config.max_step);

            std::mem::swap(&mut x, &mut x_new);
            std::mem::swap(&mut g, &mut g_new);
            f = f_new;
            moved = true;
            if f < best_f {
                best_f = f;
                best_x.copy_from_slice(&x);
            }
        } else {
            step *= config.shrink;
            if step < config.min_step {
                break;
            }
        }
    }

    LeastSquaresResult {
        x: best_x,
        objective: best_f,
        iterations,
        converged,
    }
}
