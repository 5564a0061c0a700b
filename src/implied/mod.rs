//! Implied volatility extraction from option prices.
//!
//! [`BlackImpliedVol`] inverts a [`PricingOracle`](crate::pricing::PricingOracle)
//! price with a bracketed, safeguarded Newton iteration and a Brent fallback.
//! [`solve_implied_volatility`] is the flat-argument entry point over the
//! built-in Black–Scholes pricer.

pub mod black;

pub use black::{BlackImpliedVol, IvResult, IvSolverConfig, MAX_VOL, MIN_VOL};

use crate::types::{OptionQuote, OptionType};

/// Initial guess used when the caller has none.
pub const DEFAULT_INITIAL_GUESS: f64 = 0.2;
/// Default step tolerance on the volatility.
pub const DEFAULT_IV_TOLERANCE: f64 = 1e-10;

/// Black–Scholes implied volatility of a European option.
///
/// Pass [`DEFAULT_INITIAL_GUESS`] and [`DEFAULT_IV_TOLERANCE`] for the
/// standard behaviour.
///
/// # Examples
/// ```
/// use volslice::implied::{solve_implied_volatility, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE};
/// use volslice::OptionType;
///
/// let res = solve_implied_volatility(
///     100.0, 100.0, 0.05, 0.0, 1.0, 10.450583572185565,
///     OptionType::Call, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE,
/// );
/// assert!(res.converged);
/// assert!((res.vol.0 - 0.2).abs() < 1e-8);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn solve_implied_volatility(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    expiry: f64,
    target_price: f64,
    option_type: OptionType,
    initial_guess: f64,
    tolerance: f64,
) -> IvResult {
    let quote = OptionQuote::new(spot, strike, rate, dividend_yield, expiry, option_type);
    let solver: BlackImpliedVol = BlackImpliedVol::default();
    solver.solve_iv(&quote, target_price, initial_guess, tolerance)
}
