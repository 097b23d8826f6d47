//! Simulation engine — period-by-period loop and its pluggable adjustments.
//!
//! The engine consumes period-aligned observations and allocation decisions
//! and replays them in strictly increasing period order:
//!
//! 1. Gross return at the weight held since the last rebalance
//! 2. Rebalance check and trade sizing
//! 3. Cost and funding adjustments
//! 4. NAV compounding and weight update

pub mod cost_model;
pub mod funding;
pub mod loop_runner;
pub mod state;
pub mod volatility;

pub use cost_model::{build_cost_model, CostModel, NoCost, VolatilityScaledCost};
pub use funding::{build_funding_model, ExcessReturnFunding, FundingModel, NoFunding};
pub use loop_runner::{asset_returns, simulate, simulate_with};
pub use state::{CostMode, EngineVariant, FundingMode, PortfolioState, SimConfig};
pub use volatility::trailing_volatility;
