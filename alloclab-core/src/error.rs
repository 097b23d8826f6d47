//! Engine error taxonomy.
//!
//! Every variant is fail-fast: a simulation or summary that hits one of these
//! aborts immediately and reports the offending period and field.

use thiserror::Error;

use crate::domain::Period;

/// Errors raised by the simulation loop and the metrics calculator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Observation and allocation period sets differ.
    #[error("alignment error at row {index}: observations have {observation}, allocations have {allocation}")]
    Alignment {
        index: usize,
        observation: String,
        allocation: String,
    },

    /// A field is non-numeric, NaN, out of range, or out of order.
    #[error("malformed input at {period}, field '{field}': {reason}")]
    MalformedInput {
        period: String,
        field: String,
        reason: String,
    },

    /// Too few periods to compute the requested quantity.
    #[error("insufficient data: need at least {required} periods, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid cadence, adjustment mode, or other run parameter.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    pub fn malformed(period: &Period, field: &str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            period: period.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Short machine-readable tag, used in logs and exit diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Alignment { .. } => "alignment",
            Self::MalformedInput { .. } => "malformed_input",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::Configuration(_) => "configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn malformed_message_names_period_and_field() {
        let period = Period::daily(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let err = EngineError::malformed(&period, "price", "NaN");
        assert_eq!(
            err.to_string(),
            "malformed input at 2024-03-01, field 'price': NaN"
        );
        assert_eq!(err.tag(), "malformed_input");
    }

    #[test]
    fn tags_are_distinct() {
        let tags = [
            EngineError::Alignment {
                index: 0,
                observation: "a".into(),
                allocation: "b".into(),
            }
            .tag(),
            EngineError::InsufficientData {
                required: 2,
                actual: 1,
            }
            .tag(),
            EngineError::config("x").tag(),
        ];
        assert_eq!(tags, ["alignment", "insufficient_data", "configuration"]);
    }
}
