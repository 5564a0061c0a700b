//! Extract implied volatility from option prices.
//!
//! Shows how to:
//!   - Price an option with Black-Scholes
//!   - Invert the price with the bracketed Newton/Brent solver
//!   - Verify round-trip accuracy
//!   - Recognise prices outside the no-arbitrage band
//!
//! Run with: `cargo run --example implied_vol`

use volslice::implied::{BlackImpliedVol, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE};
use volslice::{BlackScholes, OptionQuote, OptionType, PricingOracle, solve_implied_volatility};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let spot = 100.0;
    let strike = 105.0;
    let rate = 0.03;
    let dividend_yield = 0.01;
    let expiry = 0.5; // 6 months
    let vol = 0.25; // 25% implied vol

    // ---------------------------------------------------------------
    // 1. Price a call and a put
    // ---------------------------------------------------------------

    let call = OptionQuote::new(spot, strike, rate, dividend_yield, expiry, OptionType::Call);
    let put = OptionQuote { option_type: OptionType::Put, ..call };
    call.validate()?;

    let call_price = BlackScholes.price(&call, vol);
    let put_price = BlackScholes.price(&put, vol);

    println!("Black-Scholes pricing");
    println!("  Spot:    {spot}");
    println!("  Forward: {:.6}", call.forward());
    println!("  Strike:  {strike}");
    println!("  Expiry:  {expiry}y");
    println!("  Vol:     {:.0}%", vol * 100.0);
    println!();
    println!("  Call price: {call_price:.6}");
    println!("  Put price:  {put_price:.6}");
    println!(
        "  Put-call parity check: C - P = {:.6}, Se^(-qT) - Ke^(-rT) = {:.6}",
        call_price - put_price,
        spot * call.carry_discount() - strike * call.rate_discount()
    );

    // ---------------------------------------------------------------
    // 2. Extract implied vol from the prices
    // ---------------------------------------------------------------

    let solver: BlackImpliedVol = BlackImpliedVol::default();
    let iv_call = solver.solve_iv(&call, call_price, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE);
    let iv_put = solver.solve_iv(&put, put_price, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE);

    println!("\nImplied vol extraction");
    println!(
        "  From call: {:.12} ({} Newton, {} Brent)",
        iv_call.vol.0, iv_call.newton_iterations, iv_call.fallback_iterations
    );
    println!(
        "  From put:  {:.12} ({} Newton, {} Brent)",
        iv_put.vol.0, iv_put.newton_iterations, iv_put.fallback_iterations
    );
    println!("  Input vol: {vol:.12}");

    // ---------------------------------------------------------------
    // 3. Round-trip accuracy
    // ---------------------------------------------------------------

    let call_reprice = BlackScholes.price(&call, iv_call.vol.0);
    println!("\nRound-trip accuracy");
    println!("  Original price:  {call_price:.15}");
    println!("  Repriced:        {call_reprice:.15}");
    println!("  Error:           {:.2e}", (call_price - call_reprice).abs());

    // ---------------------------------------------------------------
    // 4. Scan across strikes
    // ---------------------------------------------------------------

    println!("\n--- IV extraction across strikes ---\n");
    println!("{:>8} {:>12} {:>12} {:>14}", "Strike", "Call Price", "IV", "Round-trip err");
    println!("{}", "-".repeat(50));

    for k in [60.0, 80.0, 90.0, 100.0, 110.0, 120.0, 160.0] {
        let quote = OptionQuote { strike: k, ..call };
        let price = BlackScholes.price(&quote, vol);
        let iv = solve_implied_volatility(
            spot,
            k,
            rate,
            dividend_yield,
            expiry,
            price,
            OptionType::Call,
            DEFAULT_INITIAL_GUESS,
            DEFAULT_IV_TOLERANCE,
        );
        let err = (price - BlackScholes.price(&quote, iv.vol.0)).abs();
        println!("{k:>8.0} {price:>12.6} {:>11.8}% {err:>14.2e}", iv.vol.0 * 100.0);
    }

    // ---------------------------------------------------------------
    // 5. Prices outside the no-arbitrage band
    // ---------------------------------------------------------------

    println!("\n--- Boundary prices ---\n");
    let intrinsic = call.discounted_intrinsic();
    let ceiling = call.price_ceiling();
    for (label, price) in [
        ("below intrinsic", intrinsic - 0.5),
        ("at intrinsic", intrinsic),
        ("above ceiling", ceiling + 1.0),
    ] {
        let iv = solver.solve_iv(&call, price, DEFAULT_INITIAL_GUESS, DEFAULT_IV_TOLERANCE);
        println!("  {label:<16} price={price:>9.4}  converged={}  vol={}", iv.converged, iv.vol.0);
    }

    Ok(())
}
