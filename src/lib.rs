//! # volslice
//!
//! Implied volatility inversion and single-maturity SVI calibration from
//! option mid prices.
//!
//! The pipeline: option quotes and mid prices → implied vols → weighted
//! `(log-moneyness, total variance)` observations → raw SVI curve fitted by
//! box-constrained least squares from heuristic multi-start seeds.
//!
//! ## Architecture
//!
//! - **`root`**: Safeguarded Newton on a bracket with a Brent fallback
//! - **`implied`**: Implied volatility over a [`PricingOracle`]
//! - **`optim`**: Projected-gradient minimization on a box
//! - **`slice`**: Slice calibration with seeding, multi-start fit and fallbacks
//! - **`smile`**: SVI curve parameters and a strike-space [`SmileSection`] view
//!
//! ## Design
//!
//! - **No failure leaks out of the numerical pipeline.** The IV solver reports
//!   `converged = false` with a NaN vol; the calibrator always returns a
//!   curve and says how it got there via [`SliceOutcome`]. [`Result`] appears
//!   only where a caller can act on it: brackets, root finding, validated
//!   smile construction and smile queries.
//! - **No panics.** Library code never calls `unwrap()` or `expect()`.
//! - **Deterministic.** No randomness or shared state; identical inputs give
//!   bit-identical curves.
//! - **Thread-safe.** [`PricingOracle`] and [`SmileSection`] require
//!   `Send + Sync`, so independent maturities can be calibrated concurrently
//!   (see [`calibrate_slices`] and the `parallel` feature).
//! - **Serializable.** Value types, results and configs implement Serde
//!   `Serialize` / `Deserialize`; configs accept partial documents.
//!
//! ## Quick start
//!
//! ```
//! use volslice::{OptionQuote, OptionType, SliceConfig, calibrate_slice, curve_is_arbitrage_sane};
//!
//! let quotes = vec![OptionQuote::new(100.0, 100.0, 0.01, 0.0, 1.0, OptionType::Call); 5];
//! let mids = vec![0.0; 5];
//! // no usable prices: conservative fallback curve
//! let params = calibrate_slice(&quotes, &mids, &SliceConfig::default());
//! assert!(curve_is_arbitrage_sane(&params));
//! ```

pub mod conventions;
pub mod error;
pub mod implied;
pub mod optim;
pub mod pricing;
pub mod root;
pub mod slice;
pub mod smile;
pub mod types;
mod validate;

#[doc(inline)]
pub use error::{Result, VolSliceError};
#[doc(inline)]
pub use implied::{IvResult, solve_implied_volatility};
#[doc(inline)]
pub use optim::LeastSquaresResult;
#[doc(inline)]
pub use pricing::{BlackScholes, Greeks, PricingOracle};
#[doc(inline)]
pub use slice::{
    CalibrationPoint, SliceCalibrator, SliceConfig, SliceOutcome, SliceQuotes, SliceReport,
    calibrate_slice, calibrate_slices,
};
#[doc(inline)]
pub use smile::{SmileSection, SviParams, SviSmile, curve_is_arbitrage_sane, curve_total_variance};
#[doc(inline)]
pub use types::{OptionQuote, OptionType, Variance, Vol};
