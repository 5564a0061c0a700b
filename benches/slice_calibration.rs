use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use volslice::implied::{BlackImpliedVol, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE};
use volslice::{
    BlackScholes, OptionQuote, OptionType, PricingOracle, SliceCalibrator, SliceConfig,
    SliceQuotes, SviParams, calibrate_slices,
};

/// Synthetic slice priced off a skewed SVI curve: OTM puts left of the
/// forward, calls right of it.
fn generate_slice(spot: f64, rate: f64, expiry: f64, n_strikes: usize) -> SliceQuotes {
    let truth = SviParams::new(0.035, 0.18, -0.35, -0.05, 0.22);
    let forward = spot * (rate * expiry).exp();
    let (quotes, mid_prices) = (0..n_strikes)
        .map(|i| {
            let k = -0.8 + 1.6 * (i as f64 / (n_strikes - 1) as f64);
            let ty = if k < 0.0 { OptionType::Put } else { OptionType::Call };
            let quote = OptionQuote::new(spot, forward * k.exp(), rate, 0.0, expiry, ty);
            let vol = (truth.total_variance(k) / expiry).sqrt();
            (quote, BlackScholes.price(&quote, vol))
        })
        .unzip();
    SliceQuotes { quotes, mid_prices }
}

fn implied_vol_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("implied_vol");
    let solver: BlackImpliedVol = BlackImpliedVol::default();

    // At-the-money: Newton from the Brenner–Subrahmanyam seed
    let atm = OptionQuote::new(100.0, 100.0, 0.01, 0.0, 0.5, OptionType::Call);
    let atm_price = BlackScholes.price(&atm, 0.25);
    group.bench_function("atm_call", |b| {
        b.iter(|| {
            solver.solve_iv(
                black_box(&atm),
                black_box(atm_price),
                DEFAULT_INITIAL_GUESS,
                DEFAULT_IV_TOLERANCE,
            )
        });
    });

    // Far wing: small vega, bracket expansion
    let wing = OptionQuote::new(100.0, 180.0, 0.01, 0.0, 0.25, OptionType::Call);
    let wing_price = BlackScholes.price(&wing, 0.6);
    group.bench_function("otm_wing_call", |b| {
        b.iter(|| {
            solver.solve_iv(
                black_box(&wing),
                black_box(wing_price),
                DEFAULT_INITIAL_GUESS,
                DEFAULT_IV_TOLERANCE,
            )
        });
    });

    group.finish();
}

fn calibration_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibration");
    let calibrator = SliceCalibrator::default();

    for n in [11, 25] {
        let slice = generate_slice(100.0, 0.01, 0.75, n);
        group.bench_function(format!("svi_slice_{n}_strikes"), |b| {
            b.iter(|| calibrator.calibrate(black_box(&slice.quotes), black_box(&slice.mid_prices)));
        });
    }

    // Multi-maturity batch: parallel under the `parallel` feature
    let slices: Vec<SliceQuotes> = (1..=8)
        .map(|i| generate_slice(100.0, 0.01, 0.25 * i as f64, 15))
        .collect();
    let config = SliceConfig::default();
    group.bench_function("svi_batch_8_slices", |b| {
        b.iter(|| calibrate_slices(black_box(&slices), black_box(&config)));
    });

    group.finish();
}

criterion_group!(benches, implied_vol_benchmarks, calibration_benchmarks);
criterion_main!(benches);
