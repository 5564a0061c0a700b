//! Core domain types for implied-vol inversion and slice calibration.
//!
//! # Newtype Strategy
//!
//! **Outputs use newtypes**: [`Vol`] and [`Variance`] wrap returned values so
//! callers can't accidentally mix a volatility with a total variance.
//!
//! **Inputs use bare `f64`**: [`OptionQuote`] carries raw floats. Validation
//! happens where the quote is consumed, because the implied-vol solver must
//! accept (and reject gracefully) non-finite market data rather than refusing
//! to construct it.
//!
//! # Why no `Eq` or `Ord`?
//! These types wrap `f64`, which does not implement `Eq` or `Ord` because `NaN`
//! breaks total ordering. We derive `PartialEq` and `PartialOrd` only.

use serde::{Deserialize, Serialize};

use crate::conventions;
use crate::validate::{validate_finite, validate_positive};

/// Implied volatility `σ`, measured as annualized standard deviation.
///
/// A vol of 0.20 represents 20% annualized volatility. A failed inversion is
/// reported as `Vol(f64::NAN)`.
///
/// # Examples
/// ```
/// use volslice::types::Vol;
/// let vol = Vol(0.20);
/// assert!(vol.is_valid());
/// assert!(!Vol(f64::NAN).is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vol(pub f64);

impl Vol {
    /// `true` when the volatility is finite and non-negative.
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }

    /// Total variance σ²T over the given expiry.
    pub fn total_variance(self, expiry: f64) -> Variance {
        Variance(self.0 * self.0 * expiry)
    }
}

/// Total variance `σ²T`.
///
/// Variance is additive across strikes at a fixed maturity, which is why the
/// SVI curve is fitted in total-variance space.
///
/// # Examples
/// ```
/// use volslice::types::Variance;
/// let var = Variance(0.04);
/// assert!((var.vol(1.0).0 - 0.2).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Variance(pub f64);

impl Variance {
    /// Implied volatility √(w / T), flooring negative variance at zero.
    pub fn vol(self, expiry: f64) -> Vol {
        Vol((self.0.max(0.0) / expiry).sqrt())
    }
}

/// Option type: call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Right to buy at strike price.
    Call,
    /// Right to sell at strike price.
    Put,
}

impl OptionType {
    /// `true` for calls.
    pub fn is_call(self) -> bool {
        matches!(self, OptionType::Call)
    }
}

/// A single European option quote contract: everything the pricer needs
/// except the volatility.
///
/// # Examples
/// ```
/// use volslice::types::{OptionQuote, OptionType};
///
/// let quote = OptionQuote::new(100.0, 110.0, 0.01, 0.0, 0.75, OptionType::Call);
/// assert!(quote.validate().is_ok());
/// assert!(quote.log_moneyness() > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Spot price `S`.
    pub spot: f64,
    /// Strike `K`.
    pub strike: f64,
    /// Continuously compounded risk-free rate `r`.
    pub rate: f64,
    /// Continuous dividend / carry yield `q`.
    pub dividend_yield: f64,
    /// Time to maturity `T` in years.
    pub expiry: f64,
    /// Call or put.
    pub option_type: OptionType,
}

impl OptionQuote {
    pub fn new(
        spot: f64,
        strike: f64,
        rate: f64,
        dividend_yield: f64,
        expiry: f64,
        option_type: OptionType,
    ) -> Self {
        Self {
            spot,
            strike,
            rate,
            dividend_yield,
            expiry,
            option_type,
        }
    }

    /// Check that the quote can be priced: positive finite spot, strike and
    /// expiry; finite rate and yield.
    ///
    /// # Errors
    /// Returns [`VolSliceError::InvalidInput`](crate::VolSliceError::InvalidInput)
    /// naming the first offending field.
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_positive(self.spot, "spot")?;
        validate_positive(self.strike, "strike")?;
        validate_positive(self.expiry, "expiry")?;
        validate_finite(self.rate, "rate")?;
        validate_finite(self.dividend_yield, "dividend yield")?;
        Ok(())
    }

    /// Forward price F = S · exp((r − q) · T).
    pub fn forward(&self) -> f64 {
        conventions::forward_price(self.spot, self.rate, self.dividend_yield, self.expiry)
    }

    /// Log-moneyness k = ln(K / F).
    pub fn log_moneyness(&self) -> f64 {
        conventions::log_moneyness(self.strike, self.forward())
    }

    /// Discount factor on the strike leg, exp(−r · T).
    pub fn rate_discount(&self) -> f64 {
        conventions::discount_factor(self.rate, self.expiry)
    }

    /// Discount factor on the spot leg, exp(−q · T).
    pub fn carry_discount(&self) -> f64 {
        conventions::discount_factor(self.dividend_yield, self.expiry)
    }

    /// Discounted intrinsic value: max(0, ±(S·e^{−qT} − K·e^{−rT})).
    pub fn discounted_intrinsic(&self) -> f64 {
        let spot_leg = self.spot * self.carry_discount();
        let strike_leg = self.strike * self.rate_discount();
        match self.option_type {
            OptionType::Call => (spot_leg - strike_leg).max(0.0),
            OptionType::Put => (strike_leg - spot_leg).max(0.0),
        }
    }

    /// No-arbitrage price ceiling: S·e^{−qT} for calls, K·e^{−rT} for puts.
    pub fn price_ceiling(&self) -> f64 {
        match self.option_type {
            OptionType::Call => self.spot * self.carry_discount(),
            OptionType::Put => self.strike * self.rate_discount(),
        }
    }
}
