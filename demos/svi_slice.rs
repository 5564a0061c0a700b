//! SVI slice demo: calibration from mid prices, outcome reporting, smile
//! queries, arb checks, serde.
//!
//! Run with: `cargo run --example svi_slice`

use volslice::{
    BlackScholes, OptionQuote, OptionType, PricingOracle, SliceCalibrator, SliceConfig,
    SmileSection, SviParams, SviSmile,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Equity-like skew, 9M tenor
    let truth = SviParams::new(0.035, 0.18, -0.35, -0.05, 0.22);
    let (spot, rate, expiry): (f64, f64, f64) = (100.0, 0.01, 0.75);
    let forward = spot * (rate * expiry).exp();

    let ks: [f64; 11] = [-0.8, -0.6, -0.4, -0.2, -0.1, 0.0, 0.1, 0.2, 0.4, 0.6, 0.8];
    let (quotes, mut mids): (Vec<_>, Vec<_>) = ks
        .iter()
        .map(|&k| {
            let ty = if k < 0.0 { OptionType::Put } else { OptionType::Call };
            let quote = OptionQuote::new(spot, forward * k.exp(), rate, 0.0, expiry, ty);
            let vol = (truth.total_variance(k) / expiry).sqrt();
            (quote, BlackScholes.price(&quote, vol))
        })
        .unzip();

    // Full slice
    let calibrator = SliceCalibrator::default();
    let report = calibrator.calibrate_with_report(&quotes, &mids);
    let p = report.params;
    println!("=== Calibration ===");
    println!("Outcome: {:?}  points: {}  rmse: {:?}", report.outcome, report.n_points, report.rmse);
    println!("a={:.6} b={:.6} ρ={:.4} m={:.4} σ={:.4}", p.a, p.b, p.rho, p.m, p.sigma);
    println!("truth a={:.6} b={:.6} ρ={:.4} m={:.4} σ={:.4}", truth.a, truth.b, truth.rho, truth.m, truth.sigma);
    println!();

    // Smile queries in strike space
    let smile = SviSmile::new(forward, expiry, p)?;
    println!("{:<10} {:>10} {:>12} {:>12}", "Strike", "Vol (%)", "Variance", "Density");
    println!("{:-<10} {:-<10} {:-<12} {:-<12}", "", "", "", "");
    for &k in &[60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 140.0] {
        let vol = smile.vol(k)?;
        let var = smile.variance(k)?;
        let density = smile.density(k)?;
        println!("{:<10.0} {:>10.2} {:>12.6} {:>12.6}", k, vol.0 * 100.0, var.0, density);
    }
    println!();

    // Butterfly arbitrage check
    let arb = smile.is_arbitrage_free()?;
    println!("=== Arbitrage Check ===");
    println!("Butterfly arb-free: {}", arb.is_free);
    if let Some(worst) = arb.worst_violation() {
        println!("Worst violation at K={:.2}: density {:.3e}", worst.strike, worst.density);
    }
    println!();

    // Degraded slice: three quotes lose their prices
    mids[1] = 0.0;
    mids[4] = 0.0;
    mids[10] = 0.0;
    let degraded = SliceCalibrator::with_config(SliceConfig {
        min_points: 4,
        ..SliceConfig::default()
    })
    .calibrate_with_report(&quotes, &mids);
    println!("=== Degraded Slice ===");
    println!("Outcome: {:?}  points: {}", degraded.outcome, degraded.n_points);
    let max_err = ks
        .iter()
        .map(|&k| (degraded.params.total_variance(k) - truth.total_variance(k)).abs())
        .fold(0.0_f64, f64::max);
    println!("Max |Δw| on the grid: {max_err:.2e}");
    println!();

    // No usable prices at all
    let empty = calibrator.calibrate_with_report(&quotes, &vec![0.0; quotes.len()]);
    println!("=== No Prices ===");
    println!("Outcome: {:?}  params: {:?}", empty.outcome, empty.params);
    println!();

    // Serde round-trip
    let json = serde_json::to_string_pretty(&smile)?;
    println!("=== Serde ===");
    println!("{json}");
    let restored: SviSmile = serde_json::from_str(&json)?;
    println!("Round-trip ATM vol: {:.6} → {:.6}", smile.vol(forward)?.0, restored.vol(forward)?.0);

    Ok(())
}
