//! Single-maturity SVI calibration from option mid prices.
//!
//! [`SliceCalibrator`] inverts each mid price to an implied vol, turns the
//! survivors into weighted `(k, w)` observations, and fits a raw SVI curve by
//! multi-start projected-gradient least squares. Calibration never fails: it
//! ends in one of four terminal states reported by [`SliceOutcome`].
//!
//! ```text
//! filter → [too few points? → Fallback]
//!        → [fewer than 5?    → Sparse]
//!        → seed → multi-start fit → [no sane converged run? → Clamped]
//!        → Fitted
//! ```

pub mod config;
mod objective;
mod seed;

pub use config::{SeedConfig, SliceConfig};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::implied::{BlackImpliedVol, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE, IvSolverConfig};
use crate::optim;
use crate::pricing::{BlackScholes, PricingOracle};
use crate::smile::SviParams;
use crate::types::OptionQuote;
use objective::SviObjective;
use seed::heuristic_seed;

/// The fallback gate never admits fewer points than this.
const FALLBACK_MIN_POINTS: usize = 3;
/// Below this many points the optimizer is skipped.
const MIN_FIT_POINTS: usize = 5;
const FALLBACK_A: f64 = 1e-8;
const FALLBACK_B: f64 = 0.1;
const FALLBACK_SIGMA: f64 = 0.2;
const SPARSE_SIGMA_MIN: f64 = 1e-3;
const SPARSE_SIGMA_FRACTION: f64 = 0.2;
const SPARSE_A_FLOOR: f64 = 1e-10;
#[cfg(feature = "logging")]
const MATURITY_TOL: f64 = 1e-10;

/// One market observation in the variance domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Log-moneyness `ln(K/F)`.
    pub k: f64,
    /// Market total variance `σ²T`.
    pub w: f64,
    /// Fit weight.
    pub weight: f64,
}

/// Terminal state of a calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceOutcome {
    /// Too few valid points; conservative symmetric curve.
    Fallback,
    /// Enough points to pass the gate but too few to fit; direct estimate.
    Sparse,
    /// Best converged optimizer run.
    Fitted,
    /// No converged run passed the sanity check; seed clamped into the box.
    Clamped,
}

/// Calibrated curve with diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceReport {
    pub params: SviParams,
    pub outcome: SliceOutcome,
    /// Quotes that survived filtering.
    pub n_points: usize,
    /// Weighted RMSE of `params` in total variance over the surviving points;
    /// `None` when there are none.
    pub rmse: Option<f64>,
}

/// Quotes and mid prices of one maturity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceQuotes {
    pub quotes: Vec<OptionQuote>,
    pub mid_prices: Vec<f64>,
}

/// SVI slice calibrator over a [`PricingOracle`].
///
/// # Examples
/// ```
/// use volslice::{OptionQuote, OptionType, SliceCalibrator, SliceOutcome, SviParams};
/// use volslice::pricing::{BlackScholes, PricingOracle};
///
/// let truth = SviParams::new(0.035, 0.18, -0.35, -0.05, 0.22);
/// let (spot, rate, expiry): (f64, f64, f64) = (100.0, 0.01, 0.75);
/// let forward = spot * (rate * expiry).exp();
/// let (quotes, mids): (Vec<_>, Vec<_>) = [-0.6, -0.4, -0.2, -0.1, 0.0, 0.1, 0.2, 0.4, 0.6]
///     .iter()
///     .map(|&k: &f64| {
///         let q = OptionQuote::new(spot, forward * k.exp(), rate, 0.0, expiry, OptionType::Call);
///         let vol = (truth.total_variance(k) / expiry).sqrt();
///         (q, BlackScholes.price(&q, vol))
///     })
///     .unzip();
///
/// let report = SliceCalibrator::default().calibrate_with_report(&quotes, &mids);
/// assert_eq!(report.n_points, 9);
/// assert_eq!(report.outcome, SliceOutcome::Fitted);
/// assert!((report.params.total_variance(0.0) - truth.total_variance(0.0)).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct SliceCalibrator<O = BlackScholes> {
    solver: BlackImpliedVol<O>,
    config: SliceConfig,
}

impl Default for SliceCalibrator {
    fn default() -> Self {
        Self::with_config(SliceConfig::default())
    }
}

impl SliceCalibrator {
    /// Calibrator over the closed-form Black–Scholes pricer.
    pub fn with_config(config: SliceConfig) -> Self {
        Self::new(BlackImpliedVol::default(), config)
    }
}

impl<O: PricingOracle> SliceCalibrator<O> {
    pub fn new(solver: BlackImpliedVol<O>, config: SliceConfig) -> Self {
        Self { solver, config }
    }

    /// Calibrator over a custom oracle with default solver limits.
    pub fn with_oracle(oracle: O, config: SliceConfig) -> Self {
        Self::new(BlackImpliedVol::new(oracle, IvSolverConfig::default()), config)
    }

    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    pub fn solver(&self) -> &BlackImpliedVol<O> {
        &self.solver
    }

    /// Observations that survive filtering, in quote order.
    ///
    /// Quotes pair with mid prices up to the shorter of the two. A quote is
    /// dropped when its mid is not positive or its implied vol does not come
    /// out finite and positive.
    pub fn points(&self, quotes: &[OptionQuote], mid_prices: &[f64]) -> Vec<CalibrationPoint> {
        let cfg = &self.config;
        let n = quotes.len().min(mid_prices.len());

        #[cfg(feature = "logging")]
        if let Some(first) = quotes.first() {
            if quotes[..n]
                .iter()
                .any(|q| (q.expiry - first.expiry).abs() > MATURITY_TOL)
            {
                tracing::warn!(expiry = first.expiry, "slice mixes maturities");
            }
        }

        quotes[..n]
            .iter()
            .zip(&mid_prices[..n])
            .filter(|&(_, &mid)| mid > 0.0)
            .filter_map(|(quote, &mid)| {
                let iv = self
                    .solver
                    .solve_iv(quote, mid, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE);
                let vol = iv.vol.0;
                if !iv.converged || !vol.is_finite() || vol <= 0.0 {
                    return None;
                }
                let k = quote.log_moneyness();
                let mut weight = 1.0;
                if cfg.use_vega_weights {
                    let vega = self.solver.oracle().price_and_sensitivities(quote, vol).vega;
                    weight = vega.max(cfg.min_vega);
                }
                weight /= 1.0 + k.abs().powf(cfg.wing_damping_pow);
                Some(CalibrationPoint {
                    k,
                    w: vol * vol * quote.expiry,
                    weight,
                })
            })
            .collect()
    }

    /// Calibrated SVI parameters. Never fails; see [`calibrate_with_report`](Self::calibrate_with_report).
    pub fn calibrate(&self, quotes: &[OptionQuote], mid_prices: &[f64]) -> SviParams {
        self.calibrate_with_report(quotes, mid_prices).params
    }

    /// Calibrate and report which terminal state produced the curve.
    pub fn calibrate_with_report(&self, quotes: &[OptionQuote], mid_prices: &[f64]) -> SliceReport {
        let cfg = &self.config;
        let mut points = self.points(quotes, mid_prices);
        points.sort_by(|a, b| a.k.total_cmp(&b.k));
        let n_points = points.len();

        #[cfg(feature = "logging")]
        tracing::debug!(n_quotes = quotes.len(), n_points, "slice calibration started");

        let objective = SviObjective::new(&points);
        let finish = |params: SviParams, outcome: SliceOutcome| {
            #[cfg(feature = "logging")]
            tracing::debug!(?outcome, ?params, "slice calibration complete");
            SliceReport {
                params,
                outcome,
                n_points,
                rmse: objective.rmse(&params),
            }
        };

        if n_points < cfg.min_points.max(FALLBACK_MIN_POINTS) {
            let m = match (points.first(), points.last()) {
                (Some(lo), Some(hi)) => 0.5 * (lo.k + hi.k),
                _ => 0.0,
            };
            let params = SviParams::new(FALLBACK_A, FALLBACK_B, 0.0, m, FALLBACK_SIGMA);
            return finish(params, SliceOutcome::Fallback);
        }

        if n_points < MIN_FIT_POINTS {
            let (k_lo, k_hi) = (points[0].k, points[n_points - 1].k);
            let w_min = points.iter().map(|p| p.w).fold(f64::INFINITY, f64::min);
            let sigma = (SPARSE_SIGMA_FRACTION * (k_hi - k_lo)).max(SPARSE_SIGMA_MIN);
            let a = (w_min - FALLBACK_B * sigma).max(SPARSE_A_FLOOR);
            let params = SviParams::new(a, FALLBACK_B, 0.0, 0.5 * (k_lo + k_hi), sigma);
            return finish(params, SliceOutcome::Sparse);
        }

        let seed = heuristic_seed(&points, &cfg.seed);
        let mut best: Option<(f64, SviParams)> = None;
        for start in seed.starts(&cfg.seed) {
            let res = optim::minimize(
                &start,
                &seed.lower,
                &seed.upper,
                |x, g| objective.value_and_gradient(x, g),
                cfg.seed.max_iters,
                cfg.seed.tolerance,
                &cfg.seed.optimizer,
            );

            #[cfg(feature = "logging")]
            tracing::debug!(
                ?start,
                iterations = res.iterations,
                converged = res.converged,
                objective = res.objective,
                "multi-start run finished"
            );

            if !res.converged {
                continue;
            }
            let Ok(x) = <[f64; 5]>::try_from(res.x.as_slice()) else {
                continue;
            };
            let rmse = (2.0 * res.objective).max(0.0).sqrt();
            if best.is_none_or(|(best_rmse, _)| rmse < best_rmse) {
                best = Some((rmse, SviParams::from_array(x)));
            }
        }

        match best {
            Some((_, params)) if params.is_arbitrage_sane() => finish(params, SliceOutcome::Fitted),
            _ => finish(seed.clamped(), SliceOutcome::Clamped),
        }
    }
}

/// Calibrate one slice with the Black–Scholes pricer.
pub fn calibrate_slice(
    quotes: &[OptionQuote],
    mid_prices: &[f64],
    config: &SliceConfig,
) -> SviParams {
    SliceCalibrator::with_config(*config).calibrate(quotes, mid_prices)
}

/// Calibrate independent maturities, in input order.
///
/// With the `parallel` feature the slices are calibrated concurrently.
pub fn calibrate_slices(slices: &[SliceQuotes], config: &SliceConfig) -> Vec<SviParams> {
    #[cfg(feature = "logging")]
    tracing::debug!(n_slices = slices.len(), "calibrating slices");

    let calibrator = SliceCalibrator::with_config(*config);
    let calibrate_one = |s: &SliceQuotes| calibrator.calibrate(&s.quotes, &s.mid_prices);

    #[cfg(feature = "parallel")]
    let params: Vec<SviParams> = slices.par_iter().map(calibrate_one).collect();
    #[cfg(not(feature = "parallel"))]
    let params: Vec<SviParams> = slices.iter().map(calibrate_one).collect();

    params
}
