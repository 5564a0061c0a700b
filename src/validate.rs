//! Input validation helpers.
//!
//! Standardizes validation across the crate using `!is_finite()` to reject
//! NaN, +Inf, and -Inf uniformly.

use crate::error::VolSliceError;

/// Validate that a value is strictly positive and finite (rejects NaN, Inf, zero, negatives).
pub(crate) fn validate_positive(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(VolSliceError::InvalidInput {
            message: format!("{name} must be positive and finite, got {value}"),
        });
    }
    Ok(value)
}

/// Validate that a value is non-negative and finite (rejects NaN, Inf, negatives).
pub(crate) fn validate_non_negative(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(VolSliceError::InvalidInput {
            message: format!("{name} must be non-negative and finite, got {value}"),
        });
    }
    Ok(value)
}

/// Validate that a value is finite (rejects NaN and Inf; allows zero and negatives).
pub(crate) fn validate_finite(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() {
        return Err(VolSliceError::InvalidInput {
            message: format!("{name} must be finite, got {value}"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero_nan_and_inf() {
        assert!(validate_positive(0.0, "spot").is_err());
        assert!(validate_positive(f64::NAN, "spot").is_err());
        assert!(validate_positive(f64::INFINITY, "spot").is_err());
        assert_eq!(validate_positive(1.5, "spot").unwrap(), 1.5);
    }

    #[test]
    fn non_negative_allows_zero() {
        assert_eq!(validate_non_negative(0.0, "price").unwrap(), 0.0);
        assert!(validate_non_negative(-1e-12, "price").is_err());
    }

    #[test]
    fn finite_allows_negatives() {
        assert_eq!(validate_finite(-0.03, "rate").unwrap(), -0.03);
        let err = validate_finite(f64::NEG_INFINITY, "rate").unwrap_err();
        assert!(format!("{err}").contains("rate"));
    }
}
