//! Funding model — per-period funding or risk-free rate proxy.
//!
//! The loop charges `held_weight * rate` each period, so a long position pays
//! the rate and a short position receives it. Subtracting it turns the raw
//! return series into an excess-return series.

use super::state::FundingMode;
use crate::domain::Observation;
use crate::error::EngineError;

/// Pluggable funding-rate source.
pub trait FundingModel: Send + Sync {
    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool {
        true
    }

    /// Per-period funding rate for this observation.
    fn rate(&self, observation: &Observation) -> Result<f64, EngineError>;
}

/// No funding adjustment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFunding;

impl FundingModel for NoFunding {
    fn name(&self) -> &str {
        "none"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn rate(&self, _observation: &Observation) -> Result<f64, EngineError> {
        Ok(0.0)
    }
}

/// Funding rate read from a macro field, multiplied by `scale`.
///
/// Use `scale` to convert quoted rates, e.g. `1/252` for an annual rate on
/// daily periods.
#[derive(Debug, Clone)]
pub struct ExcessReturnFunding {
    pub field: String,
    pub scale: f64,
}

impl ExcessReturnFunding {
    pub fn new(field: impl Into<String>, scale: f64) -> Self {
        Self {
            field: field.into(),
            scale,
        }
    }
}

impl FundingModel for ExcessReturnFunding {
    fn name(&self) -> &str {
        "excess_return"
    }

    fn rate(&self, observation: &Observation) -> Result<f64, EngineError> {
        let value = observation.field(&self.field).ok_or_else(|| {
            EngineError::malformed(&observation.period, &self.field, "field is missing")
        })?;
        if !value.is_finite() {
            return Err(EngineError::malformed(
                &observation.period,
                &self.field,
                format!("{value} is not finite"),
            ));
        }
        Ok(value * self.scale)
    }
}

/// Build the funding model a configuration names.
pub fn build_funding_model(mode: &FundingMode) -> Box<dyn FundingModel> {
    match mode {
        FundingMode::None => Box::new(NoFunding),
        FundingMode::ExcessReturn { field, scale } => {
            Box::new(ExcessReturnFunding::new(field.clone(), *scale))
        }
    }
}
