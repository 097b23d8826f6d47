//! Cost model — transaction-cost drag charged at rebalance periods.
//!
//! A cost model maps `(trade_size, volatility)` to a charge expressed as a
//! fraction of NAV. Implementations must be monotonic non-decreasing in both
//! arguments and return zero for a zero trade size. The loop only calls
//! `charge` when a trailing volatility estimate exists and is positive.

use super::state::CostMode;

/// Pluggable transaction-cost formula.
pub trait CostModel: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the loop should charge this model at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Number of trailing asset returns the volatility estimate needs.
    fn lookback(&self) -> usize;

    /// Charge for a trade of `trade_size` given per-period volatility `volatility`.
    fn charge(&self, trade_size: f64, volatility: f64) -> f64;
}

/// No cost adjustment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCost;

impl CostModel for NoCost {
    fn name(&self) -> &str {
        "none"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn lookback(&self) -> usize {
        0
    }

    fn charge(&self, _trade_size: f64, _volatility: f64) -> f64 {
        0.0
    }
}

/// Cost proportional to trade size and trailing volatility.
///
/// `charge = coefficient * trade_size * volatility`. Larger trades and
/// choppier markets cost more; a zero trade costs nothing.
#[derive(Debug, Clone)]
pub struct VolatilityScaledCost {
    pub coefficient: f64,
    pub lookback: usize,
}

impl VolatilityScaledCost {
    pub fn new(coefficient: f64, lookback: usize) -> Self {
        Self {
            coefficient,
            lookback,
        }
    }
}

impl CostModel for VolatilityScaledCost {
    fn name(&self) -> &str {
        "volatility_scaled"
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn charge(&self, trade_size: f64, volatility: f64) -> f64 {
        self.coefficient * trade_size.abs() * volatility.max(0.0)
    }
}

/// Build the cost model a configuration names.
pub fn build_cost_model(mode: &CostMode) -> Box<dyn CostModel> {
    match mode {
        CostMode::None => Box::new(NoCost),
        CostMode::VolatilityScaled {
            coefficient,
            lookback,
        } => Box::new(VolatilityScaledCost::new(*coefficient, *lookback)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cost_is_disabled() {
        let model = NoCost;
        assert!(!model.is_enabled());
        assert_eq!(model.charge(1.0, 0.05), 0.0);
    }

    #[test]
    fn zero_trade_costs_nothing() {
        let model = VolatilityScaledCost::new(0.5, 20);
        assert_eq!(model.charge(0.0, 0.02), 0.0);
    }

    #[test]
    fn charge_formula() {
        let model = VolatilityScaledCost::new(0.5, 20);
        // 0.5 * 0.4 * 0.01 = 0.002
        assert!((model.charge(0.4, 0.01) - 0.002).abs() < 1e-15);
    }

    #[test]
    fn monotonic_in_trade_and_volatility() {
        let model = VolatilityScaledCost::new(0.3, 10);
        assert!(model.charge(0.2, 0.01) <= model.charge(0.5, 0.01));
        assert!(model.charge(0.2, 0.01) <= model.charge(0.2, 0.03));
    }

    #[test]
    fn factory_matches_mode() {
        assert_eq!(build_cost_model(&CostMode::None).name(), "none");
        let model = build_cost_model(&CostMode::VolatilityScaled {
            coefficient: 1.0,
            lookback: 5,
        });
        assert_eq!(model.name(), "volatility_scaled");
        assert_eq!(model.lookback(), 5);
    }
}
