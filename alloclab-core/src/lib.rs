//! AllocLab Core — domain types, simulation loop, adjustments, metrics.
//!
//! This crate contains the heart of the portfolio simulator:
//! - Domain types (periods, observations, allocation decisions, period results)
//! - Input alignment and validation
//! - Period-by-period simulation loop with pluggable cost and funding models
//! - Performance metrics over raw or excess return series
//! - Deterministic configuration and dataset fingerprints

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod metrics;

pub use domain::{AllocationDecision, Observation, Period, PeriodResult};
pub use engine::{
    simulate, simulate_with, CostMode, CostModel, EngineVariant, FundingMode, FundingModel,
    PortfolioState, SimConfig,
};
pub use error::EngineError;
pub use fingerprint::{ConfigHash, DatasetHash};
pub use metrics::{summarize, MetricsSummary, ReturnSeries};
