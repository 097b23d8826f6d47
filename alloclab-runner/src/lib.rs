//! AllocLab Runner — batch orchestration, ingestion, diagnostics, export.
//!
//! This crate builds on `alloclab-core` to provide:
//! - TOML batch configuration with per-strategy engine settings
//! - CSV ingestion by column name
//! - Sequential or rayon-parallel batch execution in configuration order
//! - Rebalance diagnostics (trade quadrants, suppressed costs)
//! - Per-period, summary, diagnostics, and manifest exports
//! - Deterministic synthetic datasets for demos

pub mod config;
pub mod data_loader;
pub mod diagnostics;
pub mod export;
pub mod runner;
pub mod synthetic;

pub use config::{BatchConfig, ConfigError, DataConfig, OutputConfig, StrategyEntry};
pub use data_loader::{
    load_allocations, load_observations, AllocationSchema, LoadError, LoadedData,
    ObservationSchema,
};
pub use diagnostics::Diagnostics;
pub use export::{import_manifest, import_periods_csv, OutputSink, RunManifest};
pub use runner::{
    load_batch_data, run_batch, run_strategy, BatchReport, RunError, RunOptions, StrategyRun,
    SCHEMA_VERSION,
};
pub use synthetic::{write_dataset, SyntheticFiles, SyntheticSpec};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BatchConfig>();
        assert_sync::<BatchConfig>();
        assert_send::<StrategyEntry>();
        assert_sync::<StrategyEntry>();
    }

    #[test]
    fn strategy_run_is_send_sync() {
        assert_send::<StrategyRun>();
        assert_sync::<StrategyRun>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }

    #[test]
    fn diagnostics_is_send_sync() {
        assert_send::<Diagnostics>();
        assert_sync::<Diagnostics>();
    }
}
