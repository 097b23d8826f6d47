//! Period-by-period simulation loop.
//!
//! Per period `t`:
//! 1. Gross return: weight held since the last rebalance times the asset return
//! 2. Rebalance check: `t % cadence == 0`, trade size against the held weight
//! 3. Cost: charged on the trade, scaled by trailing volatility
//! 4. Funding: charged on the held weight
//! 5. Compound NAV, then adopt the target weight at a rebalance

use tracing::{debug, warn};

use crate::data::{check_alignment, return_price, validate_allocations, validate_observations};
use crate::domain::{AllocationDecision, Observation, PeriodResult};
use crate::error::EngineError;

use super::cost_model::{build_cost_model, CostModel};
use super::funding::{build_funding_model, FundingModel};
use super::state::{PortfolioState, SimConfig};
use super::volatility::trailing_volatility;

/// Run a simulation with the cost and funding models the configuration names.
pub fn simulate(
    observations: &[Observation],
    allocations: &[AllocationDecision],
    config: &SimConfig,
) -> Result<Vec<PeriodResult>, EngineError> {
    let cost_model = build_cost_model(&config.cost);
    let funding_model = build_funding_model(&config.funding);
    simulate_with(
        observations,
        allocations,
        config,
        cost_model.as_ref(),
        funding_model.as_ref(),
    )
}

/// Run a simulation with caller-supplied cost and funding models.
///
/// The models in `config.cost` / `config.funding` are ignored; only the
/// cadence, initial NAV, weight bound, and return field are read from it.
pub fn simulate_with(
    observations: &[Observation],
    allocations: &[AllocationDecision],
    config: &SimConfig,
    cost_model: &dyn CostModel,
    funding_model: &dyn FundingModel,
) -> Result<Vec<PeriodResult>, EngineError> {
    config.validate()?;
    if cost_model.is_enabled() && cost_model.lookback() < 2 {
        return Err(EngineError::config(format!(
            "cost model '{}' needs a volatility lookback >= 2, got {}",
            cost_model.name(),
            cost_model.lookback()
        )));
    }
    check_alignment(observations, allocations)?;
    if observations.is_empty() {
        return Err(EngineError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    let return_field = config.return_field.as_deref();
    validate_observations(observations, return_field)?;
    validate_allocations(allocations, config.max_abs_weight)?;

    let prices = observations
        .iter()
        .map(|obs| return_price(obs, return_field))
        .collect::<Result<Vec<f64>, _>>()?;
    let asset_returns = asset_returns(&prices);

    let mut state = PortfolioState::new(config.initial_nav);
    let mut results = Vec::with_capacity(observations.len());

    // Seed period: baseline NAV, opening allocation adopted without a trade.
    results.push(PeriodResult::seed(observations[0].period, state.nav));
    state.current_weight = allocations[0].target_weight;

    let mut rebalances = 1usize;
    let mut suppressed = 0usize;

    for t in 1..observations.len() {
        let obs = &observations[t];
        let held = state.current_weight;
        let gross_return = held * asset_returns[t];

        let rebalance = config.is_rebalance(t);
        let target = allocations[t].target_weight;
        let turnover = if rebalance { (target - held).abs() } else { 0.0 };

        let mut cost_suppressed = false;
        let cost_paid = if turnover > 0.0 && cost_model.is_enabled() {
            match trailing_volatility(&asset_returns, t, cost_model.lookback()) {
                Some(sigma) => cost_model.charge(turnover, sigma),
                None => {
                    suppressed += 1;
                    cost_suppressed = true;
                    0.0
                }
            }
        } else {
            0.0
        };

        let funding_paid = if funding_model.is_enabled() {
            held * funding_model.rate(obs)?
        } else {
            0.0
        };

        let period_return = gross_return - funding_paid - cost_paid;
        state.apply(period_return, cost_paid, funding_paid);
        if !state.nav.is_finite() {
            return Err(EngineError::malformed(
                &obs.period,
                "nav",
                format!("{} is not finite", state.nav),
            ));
        }

        if rebalance {
            rebalances += 1;
            state.current_weight = target;
        }

        results.push(PeriodResult {
            period: obs.period,
            nav: state.nav,
            period_return,
            turnover,
            cost_paid,
            funding_paid,
            weight: held,
            gross_return,
            cost_suppressed,
        });
    }

    if suppressed > 0 {
        warn!(
            suppressed,
            lookback = cost_model.lookback(),
            "cost charge suppressed for lack of volatility history"
        );
    }
    debug!(
        periods = results.len(),
        rebalances,
        cost_model = cost_model.name(),
        funding_model = funding_model.name(),
        final_nav = state.nav,
        total_cost = state.cumulative_cost,
        total_funding = state.cumulative_funding,
        "simulation complete"
    );

    Ok(results)
}

/// Simple returns `p(t)/p(t-1) - 1`, with 0 for the seed period.
pub fn asset_returns(prices: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(prices.len());
    if prices.is_empty() {
        return returns;
    }
    returns.push(0.0);
    returns.extend(prices.windows(2).map(|w| w[1] / w[0] - 1.0));
    returns
}
