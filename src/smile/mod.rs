//! SVI curves and their strike-space view.
//!
//! [`SviParams`] is what the slice calibrator produces: a total-variance curve
//! in log-moneyness. Pinning it to a forward and an expiry gives an
//! [`SviSmile`], queried through [`SmileSection`] by strike.

pub mod arbitrage;
pub mod svi;

pub use arbitrage::{ArbitrageReport, ButterflyScan, ButterflyViolation};
pub use svi::{SviParams, SviSmile, curve_is_arbitrage_sane, curve_total_variance};

use crate::error;
use crate::types::{Variance, Vol};

/// Strike-space queries on one maturity.
///
/// Implementations are `Send + Sync`; a calibrated slice is read-only and may
/// be shared across threads.
pub trait SmileSection: Send + Sync {
    /// Black volatility at `strike`.
    fn vol(&self, strike: f64) -> error::Result<Vol>;

    /// Total variance `σ²T` at `strike`, from [`vol`](SmileSection::vol) by default.
    fn variance(&self, strike: f64) -> error::Result<Variance> {
        let v = self.vol(strike)?;
        Ok(Variance(v.0 * v.0 * self.expiry()))
    }

    /// Risk-neutral density at `strike` (second strike derivative of the
    /// undiscounted call price).
    fn density(&self, strike: f64) -> error::Result<f64>;

    fn forward(&self) -> f64;

    fn expiry(&self) -> f64;

    /// Butterfly arbitrage report over the implementation's default scan.
    fn is_arbitrage_free(&self) -> error::Result<ArbitrageReport>;
}
