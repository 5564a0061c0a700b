//! Black–Scholes implied volatility via bracketed Newton with Brent fallback.
//!
//! The solver screens the target price against the no-arbitrage band
//! `[discounted intrinsic, price ceiling]` before searching, builds a bracket
//! `f(lo) ≤ 0 ≤ f(hi)` for `f(σ) = price(σ) − target`, then runs
//! [`root::polish`](crate::root::polish).

use serde::{Deserialize, Serialize};

use crate::pricing::{BlackScholes, PricingOracle};
use crate::root::{self, Bracket, RootConfig};
use crate::types::{OptionQuote, Vol};
use crate::validate::validate_non_negative;

/// Smallest volatility the solver will probe or report.
pub const MIN_VOL: f64 = 1e-9;
/// Largest volatility the solver will report.
pub const MAX_VOL: f64 = 5.0;
/// Absolute floor on the step tolerance.
const VOL_TOL_FLOOR: f64 = 1e-12;
/// Absolute floor on the price residual tolerance.
const PRICE_TOL_FLOOR: f64 = 1e-12;
/// Lowest value the lower probe may be pushed down to.
const LOWER_PROBE_FLOOR: f64 = 1e-12;
/// Guard against `ln(0)` and `sqrt` of tiny values in the initial guess.
const GUESS_EPS: f64 = 1e-12;

/// Numerical limits for the implied-vol solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IvSolverConfig {
    pub min_vol: f64,
    pub max_vol: f64,
    pub max_newton_iters: usize,
    pub max_fallback_iters: usize,
    /// Geometric expansions of the upper probe before widening to `max_vol`.
    pub max_bracket_expansions: usize,
    pub bracket_growth: f64,
    /// Expiries below this get `short_expiry_tol` as a tolerance floor.
    pub short_expiry: f64,
    pub short_expiry_tol: f64,
    /// Targets within this relative band above intrinsic resolve to zero vol.
    pub intrinsic_band: f64,
    /// Relative slack when rejecting targets outside `[intrinsic, ceiling]`.
    pub boundary_rel_eps: f64,
    /// Targets within this relative band below the ceiling are rejected.
    pub ceiling_band: f64,
    /// Price residual tolerance, relative to `max(1, target)`.
    pub residual_rel_tol: f64,
}

impl Default for IvSolverConfig {
    fn default() -> Self {
        Self {
            min_vol: MIN_VOL,
            max_vol: MAX_VOL,
            max_newton_iters: 20,
            max_fallback_iters: 100,
            max_bracket_expansions: 12,
            bracket_growth: 1.5,
            short_expiry: 1.0 / 365.0,
            short_expiry_tol: 1e-6,
            intrinsic_band: 1e-4,
            boundary_rel_eps: 1e-10,
            ceiling_band: 1e-12,
            residual_rel_tol: 1e-12,
        }
    }
}

/// Outcome of an implied-vol inversion.
///
/// A failed inversion carries `vol = Vol(NaN)` and `converged = false`.
/// `fallback_iterations > 0` means Newton ran out of budget and Brent finished
/// the job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IvResult {
    pub vol: Vol,
    pub newton_iterations: usize,
    pub fallback_iterations: usize,
    pub converged: bool,
}

impl IvResult {
    fn failed(newton_iterations: usize, fallback_iterations: usize) -> Self {
        Self {
            vol: Vol(f64::NAN),
            newton_iterations,
            fallback_iterations,
            converged: false,
        }
    }

    fn intrinsic() -> Self {
        Self {
            vol: Vol(0.0),
            newton_iterations: 0,
            fallback_iterations: 0,
            converged: true,
        }
    }
}

/// Implied volatility solver over a [`PricingOracle`].
///
/// # Examples
/// ```
/// use volslice::implied::BlackImpliedVol;
/// use volslice::pricing::{BlackScholes, PricingOracle};
/// use volslice::types::{OptionQuote, OptionType};
///
/// let quote = OptionQuote::new(100.0, 120.0, 0.01, 0.0, 0.75, OptionType::Put);
/// let price = BlackScholes.price(&quote, 0.35);
///
/// let solver: BlackImpliedVol = BlackImpliedVol::default();
/// let res = solver.solve_iv(&quote, price, 0.2, 1e-12);
/// assert!(res.converged);
/// assert!((res.vol.0 - 0.35).abs() < 1e-8);
/// ```
#[derive(Debug, Clone)]
pub struct BlackImpliedVol<O = BlackScholes> {
    oracle: O,
    config: IvSolverConfig,
}

impl Default for BlackImpliedVol {
    fn default() -> Self {
        Self::new(BlackScholes, IvSolverConfig::default())
    }
}

impl<O: PricingOracle> BlackImpliedVol<O> {
    pub fn new(oracle: O, config: IvSolverConfig) -> Self {
        Self { oracle, config }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn config(&self) -> &IvSolverConfig {
        &self.config
    }

    /// Invert `target_price` into a volatility.
    ///
    /// Never fails outward: invalid inputs and prices outside the
    /// no-arbitrage band return `converged = false` with a NaN vol; a price at
    /// intrinsic returns zero vol with zero iterations.
    pub fn solve_iv(
        &self,
        quote: &OptionQuote,
        target_price: f64,
        initial_guess: f64,
        tolerance: f64,
    ) -> IvResult {
        let cfg = &self.config;
        if quote.validate().is_err()
            || validate_non_negative(target_price, "target price").is_err()
        {
            return IvResult::failed(0, 0);
        }

        let intrinsic = quote.discounted_intrinsic();
        let ceiling = quote.price_ceiling();
        if target_price < intrinsic * (1.0 - cfg.boundary_rel_eps) {
            return IvResult::failed(0, 0);
        }
        if target_price <= intrinsic * (1.0 + cfg.intrinsic_band) {
            return IvResult::intrinsic();
        }
        if target_price >= ceiling * (1.0 - cfg.ceiling_band) {
            // At or above the ceiling the vol diverges.
            return IvResult::failed(0, 0);
        }

        let mut tolerance = tolerance;
        if quote.expiry < cfg.short_expiry {
            tolerance = tolerance.max(cfg.short_expiry_tol);
        }
        let newton = RootConfig {
            residual_tol: (cfg.residual_rel_tol * target_price.max(1.0)).max(PRICE_TOL_FLOOR),
            step_tol: tolerance.max(VOL_TOL_FLOOR),
            max_iter: cfg.max_newton_iters,
        };
        let fallback = RootConfig {
            max_iter: cfg.max_fallback_iters,
            ..newton
        };

        let seed = self.initial_guess(quote, target_price, initial_guess);
        let Some(bracket) = self.bracket(quote, target_price, seed) else {
            #[cfg(feature = "logging")]
            tracing::debug!(strike = quote.strike, target_price, "no implied-vol bracket");
            return IvResult::failed(0, 0);
        };

        let report = root::polish(
            |vol| {
                let g = self.oracle.price_and_sensitivities(quote, vol);
                (g.price - target_price, g.vega)
            },
            |vol| self.oracle.price(quote, vol) - target_price,
            seed,
            bracket,
            &newton,
            &fallback,
        );

        #[cfg(feature = "logging")]
        tracing::debug!(
            strike = quote.strike,
            newton_iterations = report.newton_iterations,
            fallback_iterations = report.fallback_iterations,
            converged = report.converged,
            "implied vol solved"
        );

        if !report.converged {
            return IvResult::failed(report.newton_iterations, report.fallback_iterations);
        }
        IvResult {
            vol: Vol(report.root.clamp(cfg.min_vol, cfg.max_vol)),
            newton_iterations: report.newton_iterations,
            fallback_iterations: report.fallback_iterations,
            converged: true,
        }
    }

    /// Starting point for Newton.
    ///
    /// A supplied guess is used when finite and inside `(0, max_vol)`.
    /// Otherwise blends the Brenner–Subrahmanyam at-the-money estimate
    /// `√(2π/T) · C/(S·e^{−qT})` with the log-moneyness scale `√(2|ln(F/K)|/T)`,
    /// clamped to `[min_vol, 1]`.
    pub fn initial_guess(&self, quote: &OptionQuote, target_price: f64, supplied: f64) -> f64 {
        let cfg = &self.config;
        if supplied.is_finite() && supplied > 0.0 && supplied < cfg.max_vol {
            return supplied;
        }
        let t = quote.expiry;
        let normalized = target_price / (quote.spot * quote.carry_discount());
        let atm = (2.0 * std::f64::consts::PI / t).max(GUESS_EPS).sqrt() * normalized.max(GUESS_EPS);
        let x = (quote.forward() / quote.strike).ln().abs();
        let moneyness_scale = (2.0 * x / t).max(GUESS_EPS).sqrt();
        (0.5 * (atm + moneyness_scale)).clamp(cfg.min_vol, 1.0)
    }

    /// Build a bracket with `f(lo) ≤ 0 ≤ f(hi)` for `f(σ) = price(σ) − target`.
    ///
    /// Probes `lo` at `min_vol` (pushed down once if the price there already
    /// exceeds the target) and expands `hi` geometrically from
    /// `clamp(2·seed, 0.5, 1)`. If that fails, tries the full
    /// `[min_vol, max_vol]` range. Returns `None` when no sign change exists.
    pub fn bracket(&self, quote: &OptionQuote, target_price: f64, seed: f64) -> Option<Bracket> {
        let cfg = &self.config;
        let f = |vol: f64| self.oracle.price(quote, vol) - target_price;

        let mut lo = cfg.min_vol;
        let mut f_lo = f(lo);
        if f_lo > 0.0 {
            lo = (0.25 * lo).max(LOWER_PROBE_FLOOR);
            f_lo = f(lo);
        }

        let mut hi = (2.0 * seed).clamp(0.5, 1.0);
        let mut f_hi = f(hi);
        let mut expansions = 0;
        while f_hi < 0.0 && hi < cfg.max_vol && expansions < cfg.max_bracket_expansions {
            hi *= cfg.bracket_growth;
            f_hi = f(hi);
            expansions += 1;
        }

        if f_lo <= 0.0 && f_hi >= 0.0 {
            return Bracket::from_values(lo, hi, f_lo, f_hi).ok();
        }

        let (lo, hi) = (cfg.min_vol, cfg.max_vol);
        let (f_lo, f_hi) = (f(lo), f(hi));
        if f_lo <= 0.0 && f_hi >= 0.0 {
            Bracket::from_values(lo, hi, f_lo, f_hi).ok()
        } else {
            None
        }
    }
}
