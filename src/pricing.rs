//! Pricing oracle consumed by the implied-vol solver and the slice calibrator.
//!
//! The solver only relies on the contract below, so any reentrant pricer can
//! be plugged in through [`PricingOracle`]:
//!
//! - `price` is deterministic and increasing in volatility for `T > 0`, and
//!   returns intrinsic value when `T ≤ 0`.
//! - `price_and_sensitivities` reports vega **per unit of volatility** (not per
//!   vol point). Newton steps and calibration weights depend on this scale.
//!
//! [`BlackScholes`] is the closed-form Black–Scholes–Merton implementation with
//! continuous carry.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::types::{OptionQuote, OptionType};

/// Price and first-order sensitivities of a European option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
    /// ∂V/∂σ per unit of volatility.
    pub vega: f64,
    /// ∂V/∂t per year.
    pub theta: f64,
    /// ∂V/∂r per unit of rate.
    pub rho: f64,
}

/// A stateless option pricer parameterized by volatility.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`: independent slices may be
/// calibrated concurrently against one shared oracle.
pub trait PricingOracle: Send + Sync {
    /// Option price at the given volatility.
    fn price(&self, quote: &OptionQuote, vol: f64) -> f64;

    /// Option price together with its sensitivities at the given volatility.
    fn price_and_sensitivities(&self, quote: &OptionQuote, vol: f64) -> Greeks;
}

/// Closed-form Black–Scholes–Merton pricer with continuous dividend yield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlackScholes;

/// Standard normal PDF.
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Standard normal CDF via the complementary error function.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

fn undiscounted_intrinsic(quote: &OptionQuote) -> f64 {
    match quote.option_type {
        OptionType::Call => (quote.spot - quote.strike).max(0.0),
        OptionType::Put => (quote.strike - quote.spot).max(0.0),
    }
}

fn d1_d2(quote: &OptionQuote, vol: f64) -> (f64, f64) {
    let sqrt_t = quote.expiry.sqrt();
    let d1 = ((quote.spot / quote.strike).ln()
        + (quote.rate - quote.dividend_yield + 0.5 * vol * vol) * quote.expiry)
        / (vol * sqrt_t);
    (d1, d1 - vol * sqrt_t)
}

impl PricingOracle for BlackScholes {
    fn price(&self, quote: &OptionQuote, vol: f64) -> f64 {
        if quote.expiry <= 0.0 {
            return undiscounted_intrinsic(quote);
        }
        if vol <= 0.0 {
            return quote.discounted_intrinsic();
        }
        let df_r = quote.rate_discount();
        let forward = quote.forward();
        let (d1, d2) = d1_d2(quote, vol);
        match quote.option_type {
            OptionType::Call => df_r * (forward * norm_cdf(d1) - quote.strike * norm_cdf(d2)),
            OptionType::Put => df_r * (quote.strike * norm_cdf(-d2) - forward * norm_cdf(-d1)),
        }
    }

    fn price_and_sensitivities(&self, quote: &OptionQuote, vol: f64) -> Greeks {
        if quote.expiry <= 0.0 || vol <= 0.0 {
            let delta = match quote.option_type {
                OptionType::Call if quote.spot > quote.strike => 1.0,
                OptionType::Put if quote.spot < quote.strike => -1.0,
                _ => 0.0,
            };
            return Greeks {
                price: self.price(quote, vol),
                delta,
                gamma: 0.0,
                vega: 0.0,
                theta: 0.0,
                rho: 0.0,
            };
        }

        let (s, k, r, q, t) = (
            quote.spot,
            quote.strike,
            quote.rate,
            quote.dividend_yield,
            quote.expiry,
        );
        let sqrt_t = t.sqrt();
        let df_r = quote.rate_discount();
        let df_q = quote.carry_discount();
        let (d1, d2) = d1_d2(quote, vol);
        let pdf_d1 = norm_pdf(d1);

        let gamma = df_q * pdf_d1 / (s * vol * sqrt_t);
        let vega = s * df_q * pdf_d1 * sqrt_t;
        let decay = -0.5 * s * df_q * pdf_d1 * vol / sqrt_t;

        let (delta, theta, rho) = match quote.option_type {
            OptionType::Call => (
                df_q * norm_cdf(d1),
                decay + q * s * df_q * norm_cdf(d1) - r * k * df_r * norm_cdf(d2),
                t * k * df_r * norm_cdf(d2),
            ),
            OptionType::Put => (
                df_q * (norm_cdf(d1) - 1.0),
                decay - q * s * df_q * norm_cdf(-d1) + r * k * df_r * norm_cdf(-d2),
                -t * k * df_r * norm_cdf(-d2),
            ),
        };

        Greeks {
            price: self.price(quote, vol),
            delta,
            gamma,
            vega,
            theta,
            rho,
        }
    }
}
