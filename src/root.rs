//! Safeguarded scalar root finding.
//!
//! Two bracketing solvers share a [`Bracket`]:
//!
//! - [`newton_safe`] — Newton–Raphson that bisects whenever the derivative is
//!   unusable or the Newton step would leave the bracket. The bracket shrinks
//!   after every evaluation, so the iterate can never escape it.
//! - [`brent`] — derivative-free Brent–Dekker (inverse quadratic / secant with
//!   bisection fallback). Guaranteed to converge on a valid bracket.
//!
//! [`find_root`] chains them: Newton first, Brent on the surviving bracket if
//! Newton exhausts its budget.

use serde::{Deserialize, Serialize};

use crate::error::{self, VolSliceError};

/// An interval `[lo, hi]` on which the function changes sign.
///
/// Function values at both ends are cached so solvers can start without
/// re-evaluating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lo: f64,
    pub hi: f64,
    pub f_lo: f64,
    pub f_hi: f64,
}

impl Bracket {
    /// Evaluate `f` at both ends and check for a sign change.
    ///
    /// # Errors
    /// Returns [`VolSliceError::InvalidInput`] if the ends are not finite or
    /// `lo >= hi`, and [`VolSliceError::NoSignChange`] if `f(lo)` and `f(hi)`
    /// share a sign (or either is NaN).
    pub fn new<F>(f: F, lo: f64, hi: f64) -> error::Result<Self>
    where
        F: Fn(f64) -> f64,
    {
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(VolSliceError::InvalidInput {
                message: format!("bracket must satisfy lo < hi with finite ends, got [{lo}, {hi}]"),
            });
        }
        Self::from_values(lo, hi, f(lo), f(hi))
    }

    /// Build a bracket from already-evaluated end points.
    ///
    /// # Errors
    /// Returns [`VolSliceError::NoSignChange`] if the values do not straddle zero.
    pub fn from_values(lo: f64, hi: f64, f_lo: f64, f_hi: f64) -> error::Result<Self> {
        let straddles = (f_lo <= 0.0 && f_hi >= 0.0) || (f_lo >= 0.0 && f_hi <= 0.0);
        if !straddles {
            return Err(VolSliceError::NoSignChange { lo, hi, f_lo, f_hi });
        }
        Ok(Self { lo, hi, f_lo, f_hi })
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    /// Strict interior test.
    pub fn contains(&self, x: f64) -> bool {
        x > self.lo && x < self.hi
    }

    /// Replace whichever end shares the sign of `fx` with `x`.
    fn shrink(&mut self, x: f64, fx: f64) {
        if (fx > 0.0) == (self.f_lo > 0.0) {
            self.lo = x;
            self.f_lo = fx;
        } else {
            self.hi = x;
            self.f_hi = fx;
        }
    }
}

/// Tolerances and budget for a 1D solver run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootConfig {
    /// Stop when `|f(x)| <= residual_tol`.
    pub residual_tol: f64,
    /// Stop when the step (Newton) or half-bracket (Brent) falls below this.
    pub step_tol: f64,
    /// Maximum number of iterations.
    pub max_iter: usize,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            residual_tol: 1e-12,
            step_tol: 1e-12,
            max_iter: 100,
        }
    }
}

/// Outcome of a single solver run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootSolution {
    /// Best root estimate.
    pub root: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether a stopping tolerance was met within the budget.
    pub converged: bool,
    /// Bracket at termination (still encloses the root).
    pub bracket: Bracket,
}

/// Outcome of [`find_root`], with the Newton and fallback phases reported apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootReport {
    pub root: f64,
    pub newton_iterations: usize,
    pub fallback_iterations: usize,
    pub converged: bool,
}

/// Derivatives smaller than this switch the Newton iteration to bisection.
const MIN_DERIVATIVE: f64 = 1e-12;

/// Safeguarded Newton–Raphson inside `bracket`.
///
/// `f_df` returns `(f(x), f'(x))`. The starting point is clamped into the
/// bracket. Each iteration evaluates once, shrinks the bracket, then takes the
/// Newton step if it stays strictly inside the bracket and bisects otherwise.
pub fn newton_safe<F>(f_df: F, x0: f64, bracket: Bracket, config: &RootConfig) -> RootSolution
where
    F: Fn(f64) -> (f64, f64),
{
    let mut bracket = bracket;
    let mut x = if x0.is_finite() {
        x0.clamp(bracket.lo, bracket.hi)
    } else {
        bracket.midpoint()
    };

    for iter in 0..config.max_iter {
        let (fx, dfx) = f_df(x);
        if fx.abs() <= config.residual_tol {
            return RootSolution {
                root: x,
                iterations: iter + 1,
                converged: true,
                bracket,
            };
        }
        bracket.shrink(x, fx);

        let candidate = if dfx.is_finite() && dfx.abs() >= MIN_DERIVATIVE {
            let newton = x - fx / dfx;
            if newton.is_finite() && bracket.contains(newton) {
                newton
            } else {
                bracket.midpoint()
            }
        } else {
            bracket.midpoint()
        };

        if (candidate - x).abs() <= config.step_tol {
            return RootSolution {
                root: candidate,
                iterations: iter + 1,
                converged: true,
                bracket,
            };
        }
        x = candidate;
    }

    RootSolution {
        root: x,
        iterations: config.max_iter,
        converged: false,
        bracket,
    }
}

/// Brent's method on a sign-changing bracket.
///
/// Combines bisection, secant, and inverse quadratic interpolation. Converges
/// when the half-width of the enclosing interval drops below
/// `2·ε·|b| + step_tol/2` or the residual meets `residual_tol`.
pub fn brent<F>(f: F, bracket: Bracket, config: &RootConfig) -> RootSolution
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut fa) = (bracket.lo, bracket.f_lo);
    let (mut b, mut fb) = (bracket.hi, bracket.f_hi);
    let done = |root: f64, iterations: usize, converged: bool, a: f64, fa: f64, b: f64, fb: f64| {
        let (lo, f_lo, hi, f_hi) = if a <= b {
            (a, fa, b, fb)
        } else {
            (b, fb, a, fa)
        };
        RootSolution {
            root,
            iterations,
            converged,
            bracket: Bracket { lo, hi, f_lo, f_hi },
        }
    };

    if fa == 0.0 {
        return done(a, 0, true, a, fa, b, fb);
    }
    if fb == 0.0 {
        return done(b, 0, true, a, fa, b, fb);
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = d;

    for iter in 0..config.max_iter {
        if (fb > 0.0) == (fc > 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.step_tol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb.abs() <= config.residual_tol {
            return done(b, iter, true, b, fb, c, fc);
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (p, q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };
            if 2.0 * p < (3.0 * xm * q - (tol * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol {
            d
        } else if xm > 0.0 {
            tol
        } else {
            -tol
        };
        fb = f(b);
    }

    done(b, config.max_iter, false, b, fb, c, fc)
}

/// Newton first, Brent on the surviving bracket if Newton runs out of budget.
///
/// Used when the caller already holds a validated bracket.
pub fn polish<F, G>(
    f_df: F,
    f: G,
    x0: f64,
    bracket: Bracket,
    newton: &RootConfig,
    fallback: &RootConfig,
) -> RootReport
where
    F: Fn(f64) -> (f64, f64),
    G: Fn(f64) -> f64,
{
    let n = newton_safe(f_df, x0, bracket, newton);
    if n.converged {
        return RootReport {
            root: n.root,
            newton_iterations: n.iterations,
            fallback_iterations: 0,
            converged: true,
        };
    }
    let b = brent(f, n.bracket, fallback);
    RootReport {
        root: b.root,
        newton_iterations: n.iterations,
        fallback_iterations: b.iterations,
        converged: b.converged,
    }
}

/// Find a root of `f` on `[lo, hi]`, starting Newton from `x0`.
///
/// # Errors
/// Returns [`VolSliceError::NoSignChange`] when `[lo, hi]` does not bracket a
/// root, and [`VolSliceError::InvalidInput`] for a malformed interval.
///
/// # Examples
/// ```
/// use volslice::root::{find_root, RootConfig};
///
/// let cfg = RootConfig::default();
/// let r = find_root(|x| (x * x - 2.0, 2.0 * x), |x| x * x - 2.0, 1.0, 0.0, 2.0, &cfg, &cfg)?;
/// assert!(r.converged);
/// assert!((r.root - 2.0_f64.sqrt()).abs() < 1e-10);
/// # Ok::<(), volslice::VolSliceError>(())
/// ```
pub fn find_root<F, G>(
    f_df: F,
    f: G,
    x0: f64,
    lo: f64,
    hi: f64,
    newton: &RootConfig,
    fallback: &RootConfig,
) -> error::Result<RootReport>
where
    F: Fn(f64) -> (f64, f64),
    G: Fn(f64) -> f64,
{
    let bracket = Bracket::new(&f, lo, hi)?;
    Ok(polish(f_df, f, x0, bracket, newton, fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cubic(x: f64) -> f64 {
        x * x * x - 2.0 * x - 5.0
    }

    fn cubic_df(x: f64) -> (f64, f64) {
        (cubic(x), 3.0 * x * x - 2.0)
    }

    const CUBIC_ROOT: f64 = 2.094_551_481_542_326_6;

    #[test]
    fn bracket_rejects_same_sign() {
        let r = Bracket::new(|x| x * x + 1.0, -1.0, 1.0);
        assert!(matches!(r, Err(VolSliceError::NoSignChange { .. })));
    }

    #[test]
    fn bracket_rejects_inverted_interval() {
        let r = Bracket::new(|x| x, 1.0, -1.0);
        assert!(matches!(r, Err(VolSliceError::InvalidInput { .. })));
    }

    #[test]
    fn bracket_rejects_nan_values() {
        let r = Bracket::from_values(0.0, 1.0, f64::NAN, 1.0);
        assert!(matches!(r, Err(VolSliceError::NoSignChange { .. })));
    }

    #[test]
    fn bracket_accepts_zero_end() {
        assert!(Bracket::from_values(0.0, 1.0, 0.0, 3.0).is_ok());
        assert!(Bracket::from_values(0.0, 1.0, 2.0, -3.0).is_ok());
    }

    #[test]
    fn newton_safe_converges_on_cubic() {
        let b = Bracket::new(cubic, 2.0, 3.0).unwrap();
        let s = newton_safe(cubic_df, 2.5, b, &RootConfig::default());
        assert!(s.converged);
        assert_abs_diff_eq!(s.root, CUBIC_ROOT, epsilon = 1e-10);
        assert!(s.iterations < 10);
    }

    #[test]
    fn newton_safe_bisects_on_flat_derivative() {
        // Derivative reported as zero everywhere: pure bisection.
        let b = Bracket::new(cubic, 2.0, 3.0).unwrap();
        let cfg = RootConfig {
            residual_tol: 1e-10,
            step_tol: 1e-10,
            max_iter: 200,
        };
        let s = newton_safe(|x| (cubic(x), 0.0), 2.0, b, &cfg);
        assert!(s.converged);
        assert_abs_diff_eq!(s.root, CUBIC_ROOT, epsilon = 1e-8);
    }

    #[test]
    fn newton_safe_keeps_bracket_valid() {
        let b = Bracket::new(cubic, 0.0, 10.0).unwrap();
        let cfg = RootConfig {
            max_iter: 3,
            ..RootConfig::default()
        };
        let s = newton_safe(cubic_df, 0.1, b, &cfg);
        assert!(!s.converged);
        assert!(s.bracket.f_lo <= 0.0 && s.bracket.f_hi >= 0.0);
        assert!(s.bracket.lo <= CUBIC_ROOT && CUBIC_ROOT <= s.bracket.hi);
        assert!(s.bracket.width() < 10.0);
    }

    #[test]
    fn newton_safe_handles_decreasing_function() {
        let f = |x: f64| 1.0 - x * x;
        let b = Bracket::new(f, 0.0, 3.0).unwrap();
        let s = newton_safe(|x| (f(x), -2.0 * x), 2.5, b, &RootConfig::default());
        assert!(s.converged);
        assert_abs_diff_eq!(s.root, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn brent_converges_on_cubic() {
        let b = Bracket::new(cubic, 2.0, 3.0).unwrap();
        let s = brent(cubic, b, &RootConfig::default());
        assert!(s.converged);
        assert_abs_diff_eq!(s.root, CUBIC_ROOT, epsilon = 1e-10);
    }

    #[test]
    fn brent_handles_root_at_endpoint() {
        let b = Bracket::new(|x| x - 1.0, 1.0, 2.0).unwrap();
        let s = brent(|x| x - 1.0, b, &RootConfig::default());
        assert!(s.converged);
        assert_eq!(s.root, 1.0);
        assert_eq!(s.iterations, 0);
    }

    #[test]
    fn brent_reports_exhausted_budget() {
        let b = Bracket::new(cubic, -10.0, 10.0).unwrap();
        let cfg = RootConfig {
            max_iter: 2,
            ..RootConfig::default()
        };
        let s = brent(cubic, b, &cfg);
        assert!(!s.converged);
        assert_eq!(s.iterations, 2);
    }

    #[test]
    fn polish_escalates_to_brent() {
        let b = Bracket::new(cubic, 0.0, 10.0).unwrap();
        let newton = RootConfig {
            max_iter: 1,
            ..RootConfig::default()
        };
        let r = polish(cubic_df, cubic, 0.1, b, &newton, &RootConfig::default());
        assert!(r.converged);
        assert_eq!(r.newton_iterations, 1);
        assert!(r.fallback_iterations > 0);
        assert_abs_diff_eq!(r.root, CUBIC_ROOT, epsilon = 1e-10);
    }

    #[test]
    fn find_root_fails_explicitly_without_sign_change() {
        let cfg = RootConfig::default();
        let r = find_root(|x| (x * x + 1.0, 2.0 * x), |x| x * x + 1.0, 0.0, -1.0, 1.0, &cfg, &cfg);
        assert!(matches!(r, Err(VolSliceError::NoSignChange { .. })));
    }
}
