//! PeriodResult — one record of the simulation output series.

use serde::{Deserialize, Serialize};

use super::Period;

/// Per-period output of the simulation loop.
///
/// All return-like fields are fractions of the previous period's NAV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    pub period: Period,
    /// NAV at the end of the period.
    pub nav: f64,
    /// Return applied to NAV, after funding and cost adjustments.
    pub period_return: f64,
    /// `|target - held|` at a rebalance period, 0 otherwise.
    pub turnover: f64,
    pub cost_paid: f64,
    /// Signed: positive when a long position pays funding, negative when a
    /// short position receives it.
    pub funding_paid: f64,
    /// Weight held during the period (set at the previous rebalance).
    pub weight: f64,
    /// `weight * asset_return`, before any adjustment.
    pub gross_return: f64,
    /// A trade was made but its cost was not charged: the trailing
    /// volatility window was incomplete or flat.
    #[serde(default)]
    pub cost_suppressed: bool,
}

impl PeriodResult {
    /// The opening record: NAV at its baseline, nothing held, nothing paid.
    pub fn seed(period: Period, nav: f64) -> Self {
        Self {
            period,
            nav,
            period_return: 0.0,
            turnover: 0.0,
            cost_paid: 0.0,
            funding_paid: 0.0,
            weight: 0.0,
            gross_return: 0.0,
            cost_suppressed: false,
        }
    }

    /// Period return with the funding adjustment added back.
    pub fn raw_return(&self) -> f64 {
        self.period_return + self.funding_paid
    }

    pub fn is_trade(&self) -> bool {
        self.turnover > 0.0
    }
}
