//! Butterfly arbitrage checks for a calibrated slice.
//!
//! A raw SVI curve is free of butterfly arbitrage exactly when the
//! Gatheral–Jacquier function `g(k)` is non-negative; the risk-neutral density
//! is `g(k)` times a positive factor. [`ButterflyScan`] samples `g` on a
//! log-moneyness grid and reports every node where it goes negative.
//!
//! # References
//! - Breeden, D.T. & Litzenberger, R.H. "Prices of State-Contingent Claims
//!   Implicit in Option Prices" (1978)
//! - Gatheral, J. & Jacquier, A. "Arbitrage-free SVI Volatility Surfaces" (2014)

use serde::{Deserialize, Serialize};

/// Log-moneyness grid for the butterfly scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButterflyScan {
    pub k_min: f64,
    pub k_max: f64,
    /// Grid nodes, endpoints included.
    pub points: usize,
    /// `g(k) < −tolerance` counts as a violation.
    pub tolerance: f64,
}

impl Default for ButterflyScan {
    fn default() -> Self {
        Self {
            k_min: -3.0,
            k_max: 3.0,
            points: 200,
            tolerance: 1e-10,
        }
    }
}

impl ButterflyScan {
    /// Grid nodes in increasing order. Fewer than two points yields `k_min`
    /// alone (or nothing for zero points).
    pub fn grid(&self) -> impl Iterator<Item = f64> + '_ {
        let last = self.points.saturating_sub(1).max(1) as f64;
        (0..self.points).map(move |i| self.k_min + (self.k_max - self.k_min) * i as f64 / last)
    }
}

/// Outcome of a butterfly scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageReport {
    /// No violation found on the scanned grid.
    pub is_free: bool,
    /// Violations in increasing log-moneyness.
    pub butterfly_violations: Vec<ButterflyViolation>,
}

impl ArbitrageReport {
    pub fn clean() -> Self {
        Self {
            is_free: true,
            butterfly_violations: Vec::new(),
        }
    }

    /// Report over the given violations; free when there are none.
    pub fn from_violations(butterfly_violations: Vec<ButterflyViolation>) -> Self {
        Self {
            is_free: butterfly_violations.is_empty(),
            butterfly_violations,
        }
    }

    /// Violation with the largest density magnitude.
    ///
    /// # Examples
    ///
    /// ```
    /// use volslice::smile::{ArbitrageReport, ButterflyViolation};
    ///
    /// let v = |k: f64, density: f64| ButterflyViolation {
    ///     log_moneyness: k,
    ///     strike: 100.0 * k.exp(),
    ///     g: density * 10.0,
    ///     density,
    ///     magnitude: density.abs(),
    /// };
    /// let report = ArbitrageReport::from_violations(vec![v(-0.4, -0.001), v(-0.2, -0.005)]);
    /// assert!(!report.is_free);
    /// assert_eq!(report.worst_violation().map(|w| w.log_moneyness), Some(-0.2));
    /// ```
    pub fn worst_violation(&self) -> Option<&ButterflyViolation> {
        self.butterfly_violations
            .iter()
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
    }

    /// Log-moneyness span `(first, last)` covered by violations.
    pub fn violation_span(&self) -> Option<(f64, f64)> {
        let first = self.butterfly_violations.first()?;
        let last = self.butterfly_violations.last()?;
        Some((first.log_moneyness, last.log_moneyness))
    }
}

/// A grid node where the density goes negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButterflyViolation {
    pub log_moneyness: f64,
    pub strike: f64,
    /// Gatheral–Jacquier `g(k)`, negative here.
    pub g: f64,
    /// Risk-neutral density at `strike`.
    pub density: f64,
    pub magnitude: f64,
}
