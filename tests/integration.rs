//! Integration tests for the volslice pipeline.
//!
//! Exercises the full path from option mid prices through implied-vol
//! inversion, seeding and multi-start fitting to a queryable SVI smile,
//! plus the degradation, fallback and determinism guarantees.

use std::sync::Arc;
use std::thread;

use approx::assert_abs_diff_eq;
use volslice::implied::{BlackImpliedVol, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE};
use volslice::smile::SmileSection;
use volslice::{
    BlackScholes, Greeks, OptionQuote, OptionType, PricingOracle, SliceCalibrator, SliceConfig,
    SliceOutcome, SliceQuotes, SviParams, SviSmile, calibrate_slice, calibrate_slices,
    curve_is_arbitrage_sane, curve_total_variance, solve_implied_volatility,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const GRID: [f64; 11] = [-0.8, -0.6, -0.4, -0.2, -0.1, 0.0, 0.1, 0.2, 0.4, 0.6, 0.8];

/// Synthetic slice: one quote per grid log-moneyness, priced off `truth`.
struct Market {
    quotes: Vec<OptionQuote>,
    mids: Vec<f64>,
    forward: f64,
    expiry: f64,
}

fn make_slice(truth: &SviParams, spot: f64, rate: f64, expiry: f64, otm_puts: bool) -> Market {
    let forward = spot * (rate * expiry).exp();
    let (quotes, mids) = GRID
        .iter()
        .map(|&k| {
            let option_type = if otm_puts && k < 0.0 {
                OptionType::Put
            } else {
                OptionType::Call
            };
            let quote = OptionQuote::new(spot, forward * k.exp(), rate, 0.0, expiry, option_type);
            let vol = (curve_total_variance(k, truth) / expiry).max(1e-10).sqrt();
            (quote, BlackScholes.price(&quote, vol))
        })
        .unzip();
    Market {
        quotes,
        mids,
        forward,
        expiry,
    }
}

fn scenario_truth() -> SviParams {
    SviParams::new(0.035, 0.18, -0.35, -0.05, 0.22)
}

fn degradation_truth() -> SviParams {
    SviParams::new(0.030, 0.16, -0.25, -0.02, 0.21)
}

fn bits(p: &SviParams) -> [u64; 5] {
    p.as_array().map(f64::to_bits)
}

// ---------------------------------------------------------------------------
// Scenario: recover a known skewed smile
// ---------------------------------------------------------------------------

#[test]
fn scenario_recovers_synthetic_smile() {
    let truth = scenario_truth();
    let market = make_slice(&truth, 100.0, 0.01, 0.75, false);
    let params = calibrate_slice(&market.quotes, &market.mids, &SliceConfig::default());

    assert!(curve_is_arbitrage_sane(&params));
    for &k in &GRID {
        let want = curve_total_variance(k, &truth);
        let got = curve_total_variance(k, &params);
        assert!(
            (got - want).abs() <= 0.1 * want,
            "k={k}: fitted {got} vs truth {want}"
        );
    }
}

#[test]
fn scenario_with_out_of_the_money_puts() {
    let truth = scenario_truth();
    let market = make_slice(&truth, 100.0, 0.01, 0.75, true);
    let report = SliceCalibrator::default().calibrate_with_report(&market.quotes, &market.mids);

    assert_eq!(report.outcome, SliceOutcome::Fitted);
    assert_eq!(report.n_points, GRID.len());
    for &k in &GRID {
        assert_abs_diff_eq!(
            report.params.total_variance(k),
            truth.total_variance(k),
            epsilon = 1e-3
        );
    }
}

#[test]
fn calibrated_smile_reprices_market_vols() -> Result<(), Box<dyn std::error::Error>> {
    let truth = scenario_truth();
    let market = make_slice(&truth, 100.0, 0.01, 0.75, false);
    let params = calibrate_slice(&market.quotes, &market.mids, &SliceConfig::default());
    let smile = SviSmile::new(market.forward, market.expiry, params)?;

    for (quote, &mid) in market.quotes.iter().zip(&market.mids) {
        let iv = solve_implied_volatility(
            quote.spot,
            quote.strike,
            quote.rate,
            quote.dividend_yield,
            quote.expiry,
            mid,
            quote.option_type,
            DEFAULT_INITIAL_GUESS,
            DEFAULT_IV_TOLERANCE,
        );
        assert!(iv.converged);
        assert_abs_diff_eq!(smile.vol(quote.strike)?.0, iv.vol.0, epsilon = 1e-3);
    }
    assert!(smile.is_arbitrage_free()?.is_free);
    Ok(())
}

// ---------------------------------------------------------------------------
// Degradation and fallback
// ---------------------------------------------------------------------------

#[test]
fn knocked_out_quotes_degrade_gracefully() {
    let truth = degradation_truth();
    let mut market = make_slice(&truth, 90.0, 0.005, 0.5, false);
    market.mids[1] = 0.0;
    market.mids[4] = 0.0;
    if let Some(last) = market.mids.last_mut() {
        *last = 0.0;
    }
    let cfg = SliceConfig {
        min_points: 4,
        ..SliceConfig::default()
    };

    let report = SliceCalibrator::with_config(cfg).calibrate_with_report(&market.quotes, &market.mids);
    assert_eq!(report.n_points, 8);
    assert!(curve_is_arbitrage_sane(&report.params));
    for &k in &GRID {
        let err = (report.params.total_variance(k) - truth.total_variance(k)).abs();
        assert!(err < 0.05, "k={k}: |Δw| = {err}");
    }
}

#[test]
fn all_zero_prices_fall_back_for_any_quote_count() {
    for n in 0..=12 {
        let quotes = vec![OptionQuote::new(100.0, 100.0, 0.01, 0.0, 1.0, OptionType::Call); n];
        let mids = vec![0.0; n];
        let report = SliceCalibrator::default().calibrate_with_report(&quotes, &mids);
        let p = report.params;
        assert_eq!(report.outcome, SliceOutcome::Fallback, "n={n}");
        assert!(p.a >= 0.0 && p.b > 0.0 && p.sigma > 0.0);
        assert!(curve_is_arbitrage_sane(&p));
    }
}

#[test]
fn degenerate_quotes_never_fail() {
    let quotes = vec![
        OptionQuote::new(f64::NAN, 100.0, 0.01, 0.0, 1.0, OptionType::Call),
        OptionQuote::new(100.0, -5.0, 0.01, 0.0, 1.0, OptionType::Put),
        OptionQuote::new(100.0, 100.0, 0.01, 0.0, 0.0, OptionType::Call),
        OptionQuote::new(100.0, 100.0, f64::INFINITY, 0.0, 1.0, OptionType::Call),
    ];
    let mids = vec![5.0, 5.0, 5.0, 5.0, 5.0];
    let report = SliceCalibrator::default().calibrate_with_report(&quotes, &mids);
    assert_eq!(report.n_points, 0);
    assert_eq!(report.outcome, SliceOutcome::Fallback);
    assert!(curve_is_arbitrage_sane(&report.params));
}

#[test]
fn mismatched_lengths_use_the_shorter_sequence() {
    let truth = scenario_truth();
    let market = make_slice(&truth, 100.0, 0.01, 0.75, false);
    let calibrator = SliceCalibrator::default();

    let mut long_mids = market.mids.clone();
    long_mids.extend([1.0, 2.0, 3.0]);
    assert_eq!(
        bits(&calibrator.calibrate(&market.quotes, &long_mids)),
        bits(&calibrator.calibrate(&market.quotes, &market.mids))
    );

    let report = calibrator.calibrate_with_report(&market.quotes[..7], &market.mids);
    assert_eq!(report.n_points, 7);
}

// ---------------------------------------------------------------------------
// Determinism and concurrency
// ---------------------------------------------------------------------------

#[test]
fn calibration_is_bit_identical_across_calls() {
    let market = make_slice(&degradation_truth(), 90.0, 0.005, 0.5, true);
    let cfg = SliceConfig::default();
    let first = calibrate_slice(&market.quotes, &market.mids, &cfg);
    let second = calibrate_slice(&market.quotes, &market.mids, &cfg);
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn concurrent_calibrations_match_serial() -> Result<(), Box<dyn std::error::Error>> {
    let calibrator = Arc::new(SliceCalibrator::default());
    let markets: Vec<Market> = (0..4)
        .map(|i| make_slice(&scenario_truth(), 100.0, 0.01, 0.25 + 0.25 * i as f64, false))
        .collect();
    let serial: Vec<SviParams> = markets
        .iter()
        .map(|m| calibrator.calibrate(&m.quotes, &m.mids))
        .collect();

    let handles: Vec<_> = markets
        .into_iter()
        .map(|m| {
            let c = Arc::clone(&calibrator);
            thread::spawn(move || c.calibrate(&m.quotes, &m.mids))
        })
        .collect();

    for (handle, expected) in handles.into_iter().zip(&serial) {
        let got = handle.join().map_err(|_| "calibration thread panicked")?;
        assert_eq!(bits(&got), bits(expected));
    }
    Ok(())
}

#[test]
fn multi_maturity_batch_matches_single_calls() {
    let cfg = SliceConfig::default();
    let slices: Vec<SliceQuotes> = [0.25, 0.5, 1.0]
        .iter()
        .map(|&t| {
            let m = make_slice(&scenario_truth(), 100.0, 0.02, t, true);
            SliceQuotes {
                quotes: m.quotes,
                mid_prices: m.mids,
            }
        })
        .collect();
    let batch = calibrate_slices(&slices, &cfg);
    assert_eq!(batch.len(), slices.len());
    for (s, p) in slices.iter().zip(&batch) {
        assert_eq!(bits(p), bits(&calibrate_slice(&s.quotes, &s.mid_prices, &cfg)));
    }
}

// ---------------------------------------------------------------------------
// Custom pricing oracle
// ---------------------------------------------------------------------------

/// Black–Scholes evaluated at `vol + shift`: its implied vols sit `shift`
/// below the Black–Scholes ones.
struct ShiftedBlack {
    shift: f64,
}

impl PricingOracle for ShiftedBlack {
    fn price(&self, quote: &OptionQuote, vol: f64) -> f64 {
        BlackScholes.price(quote, vol + self.shift)
    }

    fn price_and_sensitivities(&self, quote: &OptionQuote, vol: f64) -> Greeks {
        BlackScholes.price_and_sensitivities(quote, vol + self.shift)
    }
}

#[test]
fn solver_and_calibrator_accept_custom_oracle() {
    let shift = 0.05;
    let quote = OptionQuote::new(100.0, 110.0, 0.02, 0.01, 0.5, OptionType::Call);
    let target = BlackScholes.price(&quote, 0.3);

    let solver = BlackImpliedVol::new(ShiftedBlack { shift }, Default::default());
    let res = solver.solve_iv(&quote, target, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE);
    assert!(res.converged);
    assert_abs_diff_eq!(res.vol.0, 0.3 - shift, epsilon = 1e-8);

    let market = make_slice(&scenario_truth(), 100.0, 0.01, 0.75, false);
    let calibrator = SliceCalibrator::with_oracle(ShiftedBlack { shift }, SliceConfig::default());
    let points = calibrator.points(&market.quotes, &market.mids);
    assert_eq!(points.len(), GRID.len());
    for (p, &k) in points.iter().zip(&GRID) {
        let vol = (scenario_truth().total_variance(k) / 0.75).sqrt() - shift;
        assert_abs_diff_eq!(p.w, vol * vol * 0.75, epsilon = 1e-8);
    }
}
