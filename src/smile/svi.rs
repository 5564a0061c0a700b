//! SVI (Stochastic Volatility Inspired) curve and smile.
//!
//! The raw SVI parameterization models total implied variance as:
//!
//! ```text
//! w(k) = a + b·[ρ(k − m) + √((k − m)² + σ²)]
//! ```
//!
//! where `k = ln(K/F)` is log-moneyness and `(a, b, ρ, m, σ)` are the five
//! SVI parameters.
//!
//! [`SviParams`] is the bare curve in log-moneyness, as produced by the slice
//! calibrator. [`SviSmile`] pins a curve to a forward and an expiry so it can
//! be queried in strike space through [`SmileSection`].
//!
//! # References
//! - Gatheral, J. "The Volatility Surface: A Practitioner's Guide" (2006)
//! - Gatheral, J. & Jacquier, A. "Arbitrage-free SVI Volatility Surfaces" (2014)

use serde::{Deserialize, Serialize};

use crate::error::{self, VolSliceError};
use crate::pricing::norm_pdf;
use crate::smile::SmileSection;
use crate::smile::arbitrage::{ArbitrageReport, ButterflyScan, ButterflyViolation};
use crate::types::Vol;
use crate::validate::{validate_finite, validate_positive};

/// Raw SVI parameters `{a, b, ρ, m, σ}`.
///
/// No invariant is enforced on construction. Use
/// [`is_arbitrage_sane`](SviParams::is_arbitrage_sane) to check the
/// necessary shape conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SviParams {
    /// Variance level.
    pub a: f64,
    /// Wing slope.
    pub b: f64,
    /// Skew, ρ ∈ (−1, 1) for a valid curve.
    pub rho: f64,
    /// Horizontal shift of the vertex.
    pub m: f64,
    /// ATM curvature.
    pub sigma: f64,
}

impl SviParams {
    pub const fn new(a: f64, b: f64, rho: f64, m: f64, sigma: f64) -> Self {
        Self {
            a,
            b,
            rho,
            m,
            sigma,
        }
    }

    /// Parameters in optimizer order `[a, b, ρ, m, σ]`.
    pub const fn as_array(&self) -> [f64; 5] {
        [self.a, self.b, self.rho, self.m, self.sigma]
    }

    pub const fn from_array(x: [f64; 5]) -> Self {
        Self::new(x[0], x[1], x[2], x[3], x[4])
    }

    /// Total variance w(k) at log-moneyness k.
    pub fn total_variance(&self, k: f64) -> f64 {
        let dk = k - self.m;
        self.a + self.b * (self.rho * dk + (dk * dk + self.sigma * self.sigma).sqrt())
    }

    /// w'(k) = b·[ρ + (k−m)/√((k−m)² + σ²)].
    pub fn w_prime(&self, k: f64) -> f64 {
        let dk = k - self.m;
        let r = (dk * dk + self.sigma * self.sigma).sqrt();
        self.b * (self.rho + dk / r)
    }

    /// w''(k) = b·σ²/((k−m)² + σ²)^(3/2).
    pub fn w_double_prime(&self, k: f64) -> f64 {
        let dk = k - self.m;
        let r2 = dk * dk + self.sigma * self.sigma;
        self.b * self.sigma * self.sigma / (r2 * r2.sqrt())
    }

    /// Minimum of w over k: `a + bσ√(1 − ρ²)`.
    pub fn min_variance(&self) -> f64 {
        self.a + self.b * self.sigma * (1.0 - self.rho * self.rho).sqrt()
    }

    /// Necessary shape conditions: `b > 0`, `|ρ| < 1`, `σ > 0`.
    ///
    /// Not sufficient for absence of butterfly arbitrage; see
    /// [`SmileSection::is_arbitrage_free`] on [`SviSmile`] for the full scan.
    /// NaN in any of the three fails the check.
    pub fn is_arbitrage_sane(&self) -> bool {
        self.b > 0.0 && self.rho.abs() < 1.0 && self.sigma > 0.0
    }

    /// Gatheral g-function; g(k) ≥ 0 everywhere implies no butterfly arbitrage.
    ///
    /// # Reference
    /// Gatheral & Jacquier (2014), Definition 4.1.
    pub fn g_function(&self, k: f64) -> f64 {
        let w = self.total_variance(k);
        if w <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let wp = self.w_prime(k);
        let wpp = self.w_double_prime(k);
        let term1 = 1.0 - k * wp / (2.0 * w);
        term1 * term1 - wp * wp / 4.0 * (1.0 / w + 0.25) + wpp / 2.0
    }
}

/// Total variance of the curve at `log_moneyness`.
///
/// # Examples
/// ```
/// use volslice::{curve_total_variance, SviParams};
///
/// let p = SviParams::new(0.04, 0.4, -0.4, 0.0, 0.1);
/// assert!((curve_total_variance(0.0, &p) - 0.08).abs() < 1e-15);
/// ```
pub fn curve_total_variance(log_moneyness: f64, params: &SviParams) -> f64 {
    params.total_variance(log_moneyness)
}

/// Whether `params` passes the SVI shape sanity check.
pub fn curve_is_arbitrage_sane(params: &SviParams) -> bool {
    params.is_arbitrage_sane()
}

/// SVI volatility smile: a curve pinned to a forward and an expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SviSmileRaw", into = "SviSmileRaw")]
pub struct SviSmile {
    forward: f64,
    expiry: f64,
    params: SviParams,
}

#[derive(Serialize, Deserialize)]
struct SviSmileRaw {
    forward: f64,
    expiry: f64,
    params: SviParams,
}

impl TryFrom<SviSmileRaw> for SviSmile {
    type Error = VolSliceError;
    fn try_from(raw: SviSmileRaw) -> Result<Self, Self::Error> {
        Self::new(raw.forward, raw.expiry, raw.params)
    }
}

impl From<SviSmile> for SviSmileRaw {
    fn from(s: SviSmile) -> Self {
        Self {
            forward: s.forward,
            expiry: s.expiry,
            params: s.params,
        }
    }
}

impl SviSmile {
    /// Create an SVI smile from curve parameters.
    ///
    /// Validates the Gatheral-Jacquier conditions:
    /// - `b ≥ 0` (non-negative slope)
    /// - `|ρ| < 1` (strict)
    /// - `σ > 0` (positive curvature)
    /// - `a + bσ√(1 − ρ²) ≥ 0` (non-negative minimum variance)
    ///
    /// # Errors
    /// Returns [`VolSliceError::InvalidInput`] if the parameters violate these
    /// conditions or if forward/expiry are non-positive.
    pub fn new(forward: f64, expiry: f64, params: SviParams) -> error::Result<Self> {
        validate_positive(forward, "forward")?;
        validate_positive(expiry, "expiry")?;
        let SviParams {
            a,
            b,
            rho,
            m,
            sigma,
        } = params;
        if b < 0.0 || b.is_nan() {
            return Err(VolSliceError::InvalidInput {
                message: format!("b must be non-negative, got {b}"),
            });
        }
        if rho.abs() >= 1.0 || rho.is_nan() {
            return Err(VolSliceError::InvalidInput {
                message: format!("|rho| must be less than 1, got {rho}"),
            });
        }
        if sigma <= 0.0 || sigma.is_nan() {
            return Err(VolSliceError::InvalidInput {
                message: format!("sigma must be positive, got {sigma}"),
            });
        }
        validate_finite(m, "m")?;
        validate_finite(a, "a")?;
        let min_variance = params.min_variance();
        if min_variance < 0.0 || min_variance.is_nan() {
            return Err(VolSliceError::InvalidInput {
                message: format!(
                    "minimum variance is negative: a + b*sigma*sqrt(1-rho^2) = {min_variance}"
                ),
            });
        }

        Ok(Self {
            forward,
            expiry,
            params,
        })
    }

    pub fn params(&self) -> &SviParams {
        &self.params
    }

    /// Sample `g(k)` on the scan grid and report each node below
    /// `−tolerance` together with the density there.
    ///
    /// # Errors
    /// Returns [`VolSliceError::InvalidInput`] for an empty or inverted grid.
    pub fn butterfly_scan(&self, scan: &ButterflyScan) -> error::Result<ArbitrageReport> {
        if scan.points == 0 || scan.k_min.is_nan() || scan.k_max.is_nan() || scan.k_min > scan.k_max {
            return Err(VolSliceError::InvalidInput {
                message: format!(
                    "butterfly scan needs k_min <= k_max and at least one point, got [{}, {}] x {}",
                    scan.k_min, scan.k_max, scan.points
                ),
            });
        }
        let violations = scan
            .grid()
            .filter_map(|k| {
                let g = self.params.g_function(k);
                if g >= -scan.tolerance {
                    return None;
                }
                let strike = self.forward * k.exp();
                let density = self.density(strike).ok()?;
                Some(ButterflyViolation {
                    log_moneyness: k,
                    strike,
                    g,
                    density,
                    magnitude: density.abs(),
                })
            })
            .collect();
        Ok(ArbitrageReport::from_violations(violations))
    }

    fn log_moneyness(&self, strike: f64) -> error::Result<f64> {
        validate_positive(strike, "strike")?;
        Ok((strike / self.forward).ln())
    }
}

impl SmileSection for SviSmile {
    fn vol(&self, strike: f64) -> error::Result<Vol> {
        let k = self.log_moneyness(strike)?;
        let w = self.params.total_variance(k);
        if w < 0.0 {
            return Err(VolSliceError::NumericalError {
                message: format!("SVI total variance is negative: w({k}) = {w}"),
            });
        }
        Ok(Vol((w / self.expiry).sqrt()))
    }

    /// Risk-neutral density q(K) via the Gatheral g-function.
    ///
    /// ```text
    /// q(K) = g(k) · n(d₂) / (K · √w)
    /// ```
    /// where k = ln(K/F), d₂ = −k/√w − √w/2, and n(·) is the standard
    /// normal PDF.
    fn density(&self, strike: f64) -> error::Result<f64> {
        let k = self.log_moneyness(strike)?;
        let w = self.params.total_variance(k);
        if w <= 0.0 {
            return Err(VolSliceError::NumericalError {
                message: format!("SVI total variance is non-positive at k={k}: w={w}"),
            });
        }
        let g = self.params.g_function(k);
        let sqrt_w = w.sqrt();
        let d2 = -k / sqrt_w - sqrt_w / 2.0;
        Ok(g * norm_pdf(d2) / (strike * sqrt_w))
    }

    fn forward(&self) -> f64 {
        self.forward
    }

    fn expiry(&self) -> f64 {
        self.expiry
    }

    /// Butterfly scan over the default grid; see [`SviSmile::butterfly_scan`].
    fn is_arbitrage_free(&self) -> error::Result<ArbitrageReport> {
        self.butterfly_scan(&ButterflyScan::default())
    }
}
