//! Market conventions: forwards, discounting and moneyness.

/// Forward price under continuous carry: F = S · exp((r − q) · T).
pub fn forward_price(spot: f64, rate: f64, dividend_yield: f64, expiry: f64) -> f64 {
    spot * ((rate - dividend_yield) * expiry).exp()
}

/// Continuously compounded discount factor exp(−r · T).
pub fn discount_factor(rate: f64, expiry: f64) -> f64 {
    (-rate * expiry).exp()
}

/// Convert a strike to log-moneyness: k = ln(K / F).
pub fn log_moneyness(strike: f64, forward: f64) -> f64 {
    (strike / forward).ln()
}

/// Strike at a given log-moneyness: K = F · exp(k).
pub fn strike_from_log_moneyness(k: f64, forward: f64) -> f64 {
    forward * k.exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn forward_includes_carry() {
        let f = forward_price(100.0, 0.05, 0.02, 2.0);
        assert_abs_diff_eq!(f, 100.0 * (0.06_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn forward_without_carry_is_spot() {
        assert_eq!(forward_price(42.0, 0.03, 0.03, 1.0), 42.0);
    }

    #[test]
    fn log_moneyness_round_trips_strike() {
        let fwd = 101.3;
        for k in [-0.8, -0.1, 0.0, 0.25, 0.8] {
            let strike = strike_from_log_moneyness(k, fwd);
            assert_abs_diff_eq!(log_moneyness(strike, fwd), k, epsilon = 1e-14);
        }
    }

    #[test]
    fn discount_factor_at_zero_rate() {
        assert_eq!(discount_factor(0.0, 5.0), 1.0);
        assert!(discount_factor(0.05, 1.0) < 1.0);
    }
}
