//! Error types for the volslice library.
//!
//! Errors surface at the seams where a caller can act on them: bracket
//! construction, root finding, validated smile construction and smile
//! queries. The implied-vol solver and the slice calibrator never return
//! errors; they fold every failure into `converged = false` or a fallback
//! curve.

use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, VolSliceError>;

/// Errors that can occur during root finding, smile construction and queries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VolSliceError {
    /// Input data is invalid (e.g., non-positive spot, NaN strike, zero expiry).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Numerical computation failed (e.g., NaN, negative total variance).
    #[error("numerical error: {message}")]
    NumericalError { message: String },

    /// The supplied interval does not enclose a root.
    #[error("no sign change on [{lo}, {hi}]: f(lo) = {f_lo}, f(hi) = {f_hi}")]
    NoSignChange {
        lo: f64,
        hi: f64,
        /// Function value at the lower end.
        f_lo: f64,
        /// Function value at the upper end.
        f_hi: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sign_change_fields_accessible() {
        let err = VolSliceError::NoSignChange {
            lo: 0.1,
            hi: 2.0,
            f_lo: 0.5,
            f_hi: 1.5,
        };
        match &err {
            VolSliceError::NoSignChange { lo, hi, f_lo, f_hi } => {
                assert_eq!(*lo, 0.1);
                assert_eq!(*hi, 2.0);
                assert_eq!(*f_lo, 0.5);
                assert_eq!(*f_hi, 1.5);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn invalid_input_message_accessible() {
        let err = VolSliceError::InvalidInput {
            message: "strike must be positive".into(),
        };
        match &err {
            VolSliceError::InvalidInput { message } => {
                assert!(message.contains("positive"));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn error_display_includes_message() {
        let err = VolSliceError::InvalidInput {
            message: "bad input".into(),
        };
        assert!(format!("{err}").contains("bad input"));

        let err2 = VolSliceError::NumericalError {
            message: "NaN detected".into(),
        };
        assert!(format!("{err2}").contains("NaN detected"));

        let err3 = VolSliceError::NoSignChange {
            lo: 1.0,
            hi: 2.0,
            f_lo: 3.0,
            f_hi: 4.0,
        };
        let display = format!("{err3}");
        assert!(display.contains("no sign change"));
        assert!(display.contains("[1, 2]"));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VolSliceError>();
    }
}
