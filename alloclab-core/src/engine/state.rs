//! Simulation configuration, engine variants, and per-run portfolio state.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

fn default_scale() -> f64 {
    1.0
}

/// Transaction-cost adjustment mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CostMode {
    None,
    /// `charge = coefficient * trade_size * sigma`, with sigma the sample
    /// standard deviation of the last `lookback` asset returns.
    VolatilityScaled { coefficient: f64, lookback: usize },
}

/// Funding-rate adjustment mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FundingMode {
    None,
    /// Per-period funding rate = `scale * observation[field]`.
    ExcessReturn {
        field: String,
        #[serde(default = "default_scale")]
        scale: f64,
    },
}

impl CostMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, CostMode::None)
    }
}

impl FundingMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, FundingMode::None)
    }
}

/// Named engine presets. Both run the same loop; the variant only decides
/// which adjustments are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineVariant {
    /// Weight path taken verbatim, no cost or funding.
    FixedWeight,
    /// Cost and/or funding adjustment enabled.
    Adjusted,
}

impl EngineVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineVariant::FixedWeight => "fixed_weight",
            EngineVariant::Adjusted => "adjusted",
        }
    }
}

/// Configuration for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Rebalance every `cadence` periods, counting from the first period.
    pub cadence: usize,
    pub cost: CostMode,
    pub funding: FundingMode,
    pub initial_nav: f64,
    pub max_abs_weight: f64,
    /// Macro field used as the price series instead of `Observation::price`.
    pub return_field: Option<String>,
}

impl SimConfig {
    /// Fixed-weight preset: no cost, no funding.
    pub fn fixed_weight(cadence: usize) -> Self {
        Self {
            cadence,
            cost: CostMode::None,
            funding: FundingMode::None,
            initial_nav: 1.0,
            max_abs_weight: 1.0,
            return_field: None,
        }
    }

    /// Adjusted preset: at least one of cost or funding must be enabled.
    pub fn adjusted(
        cadence: usize,
        cost: CostMode,
        funding: FundingMode,
    ) -> Result<Self, EngineError> {
        Self::for_variant(EngineVariant::Adjusted, cadence, cost, funding)
    }

    /// Build a config for a named variant, rejecting adjustments the variant
    /// does not allow.
    pub fn for_variant(
        variant: EngineVariant,
        cadence: usize,
        cost: CostMode,
        funding: FundingMode,
    ) -> Result<Self, EngineError> {
        let adjusted = cost.is_enabled() || funding.is_enabled();
        match variant {
            EngineVariant::FixedWeight if adjusted => {
                return Err(EngineError::config(
                    "fixed_weight variant does not allow cost or funding adjustment",
                ))
            }
            EngineVariant::Adjusted if !adjusted => {
                return Err(EngineError::config(
                    "adjusted variant requires cost and/or funding adjustment",
                ))
            }
            _ => {}
        }
        let config = Self {
            cost,
            funding,
            ..Self::fixed_weight(cadence)
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_initial_nav(mut self, initial_nav: f64) -> Self {
        self.initial_nav = initial_nav;
        self
    }

    pub fn with_max_abs_weight(mut self, max_abs_weight: f64) -> Self {
        self.max_abs_weight = max_abs_weight;
        self
    }

    pub fn with_return_field(mut self, field: impl Into<String>) -> Self {
        self.return_field = Some(field.into());
        self
    }

    /// The variant this configuration belongs to.
    pub fn variant(&self) -> EngineVariant {
        if self.cost.is_enabled() || self.funding.is_enabled() {
            EngineVariant::Adjusted
        } else {
            EngineVariant::FixedWeight
        }
    }

    pub fn is_rebalance(&self, index: usize) -> bool {
        index % self.cadence == 0
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.cadence == 0 {
            return Err(EngineError::config("rebalance cadence must be >= 1"));
        }
        if !(self.initial_nav.is_finite() && self.initial_nav > 0.0) {
            return Err(EngineError::config(format!(
                "initial_nav must be positive, got {}",
                self.initial_nav
            )));
        }
        if !(self.max_abs_weight.is_finite() && self.max_abs_weight > 0.0) {
            return Err(EngineError::config(format!(
                "max_abs_weight must be positive, got {}",
                self.max_abs_weight
            )));
        }
        if let CostMode::VolatilityScaled {
            coefficient,
            lookback,
        } = &self.cost
        {
            if !(coefficient.is_finite() && *coefficient >= 0.0) {
                return Err(EngineError::config(format!(
                    "cost coefficient must be non-negative, got {coefficient}"
                )));
            }
            if *lookback < 2 {
                return Err(EngineError::config(format!(
                    "volatility lookback must be >= 2, got {lookback}"
                )));
            }
        }
        if let FundingMode::ExcessReturn { field, scale } = &self.funding {
            if field.is_empty() {
                return Err(EngineError::config("funding field name is empty"));
            }
            if !scale.is_finite() {
                return Err(EngineError::config(format!(
                    "funding scale must be finite, got {scale}"
                )));
            }
        }
        Ok(())
    }
}

/// Mutable portfolio state, owned by exactly one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub current_weight: f64,
    pub nav: f64,
    pub cumulative_cost: f64,
    pub cumulative_funding: f64,
}

impl PortfolioState {
    pub fn new(initial_nav: f64) -> Self {
        Self {
            current_weight: 0.0,
            nav: initial_nav,
            cumulative_cost: 0.0,
            cumulative_funding: 0.0,
        }
    }

    /// Compound one period's adjusted return into NAV and book the charges.
    pub fn apply(&mut self, period_return: f64, cost_paid: f64, funding_paid: f64) {
        self.nav *= 1.0 + period_return;
        self.cumulative_cost += cost_paid;
        self.cumulative_funding += funding_paid;
    }
}
