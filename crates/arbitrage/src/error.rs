//! Error types for surebet detection.
//!
//! Only conditions that indicate malformed input or configuration are errors.
//! Unmatched events, suspended prices and plans made unsafe by rounding are
//! regular outcomes of a scan and never surface here.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while scanning odds for surebets.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurebetError {
    /// Odds below 1.0 (or non-positive) reached the engine.
    #[error("invalid odds {value} ({context})")]
    InvalidOdds {
        /// The offending odds value.
        value: Decimal,
        /// Where the value was found.
        context: String,
    },

    /// Configuration cannot drive a scan.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An odds vector does not have one price per outcome.
    #[error("expected {expected} odds, got {actual}")]
    OutcomeCountMismatch {
        /// Outcomes in the market.
        expected: usize,
        /// Odds supplied.
        actual: usize,
    },
}

impl SurebetError {
    /// Creates an invalid odds error.
    pub fn invalid_odds(value: Decimal, context: impl Into<String>) -> Self {
        Self::InvalidOdds {
            value,
            context: context.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Returns true if the error was caused by upstream odds data.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidOdds { .. } | Self::OutcomeCountMismatch { .. }
        )
    }
}

/// Result alias for surebet operations.
pub type Result<T> = std::result::Result<T, SurebetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_odds_display() {
        let err = SurebetError::invalid_odds(dec!(0), "Betfair / Arsenal v Spurs");
        assert_eq!(err.to_string(), "invalid odds 0 (Betfair / Arsenal v Spurs)");
        assert!(err.is_data_error());
    }

    #[test]
    fn test_invalid_config_display() {
        let err = SurebetError::invalid_config("rounding_base must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration: rounding_base must be positive"
        );
        assert!(!err.is_data_error());
    }

    #[test]
    fn test_outcome_count_mismatch_display() {
        let err = SurebetError::OutcomeCountMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "expected 3 odds, got 2");
    }
}
