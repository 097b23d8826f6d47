//! Rebalance diagnostics — trade counts, quadrants, and adjustment totals.
//!
//! Each non-zero trade is classified by its direction (weight increase or
//! decrease) and by the sign of the asset return over the following period
//! (rising, or falling when the return is zero or negative). A trade in the
//! final period has no following period and is left out of the quadrants.

use alloclab_core::engine::SimConfig;
use alloclab_core::{AllocationDecision, PeriodResult};
use serde::{Deserialize, Serialize};

/// Per-strategy rebalance statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub periods: usize,
    /// Rebalance periods, including the seed period.
    pub rebalances: usize,
    /// Rebalances with a non-zero trade.
    pub trades: usize,
    pub increase_rising: usize,
    pub increase_falling: usize,
    pub decrease_rising: usize,
    pub decrease_falling: usize,
    pub total_turnover: f64,
    pub total_cost: f64,
    pub total_funding: f64,
    /// Trades the loop left uncharged for lack of a volatility estimate.
    pub cost_suppressed: usize,
}

impl Diagnostics {
    /// Compute diagnostics for one simulated run.
    ///
    /// `asset_returns` is the raw return series the loop used (seed return 0
    /// at index 0); `allocations` supplies the direction of each trade.
    pub fn compute(
        results: &[PeriodResult],
        allocations: &[AllocationDecision],
        asset_returns: &[f64],
        config: &SimConfig,
    ) -> Self {
        let mut diag = Self {
            periods: results.len(),
            ..Self::default()
        };
        for (t, r) in results.iter().enumerate() {
            if config.is_rebalance(t) {
                diag.rebalances += 1;
            }
            diag.total_turnover += r.turnover;
            diag.total_cost += r.cost_paid;
            diag.total_funding += r.funding_paid;

            if !r.is_trade() {
                continue;
            }
            diag.trades += 1;

            if r.cost_suppressed {
                diag.cost_suppressed += 1;
            }

            let (Some(alloc), Some(&next_return)) = (allocations.get(t), asset_returns.get(t + 1))
            else {
                continue;
            };
            let increase = alloc.target_weight > r.weight;
            let rising = next_return > 0.0;
            match (increase, rising) {
                (true, true) => diag.increase_rising += 1,
                (true, false) => diag.increase_falling += 1,
                (false, true) => diag.decrease_rising += 1,
                (false, false) => diag.decrease_falling += 1,
            }
        }
        diag
    }

    /// Trades that landed in a quadrant (every trade except one in the final period).
    pub fn classified(&self) -> usize {
        self.increase_rising + self.increase_falling + self.decrease_rising + self.decrease_falling
    }
}
