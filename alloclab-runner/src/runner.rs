//! Batch runner — wires together loading, engine, metrics, and export.
//!
//! Two entry points:
//! - `run_strategy()`: one strategy against pre-loaded observations, no output I/O.
//! - `run_batch()`: every strategy in a config, in file order, with exports.
//!
//! Strategies are independent, so `run_batch` can simulate them on the rayon
//! pool. Results are still collected and written in configuration order, and
//! the first failure (in that order) stops the batch.

use std::path::PathBuf;

use alloclab_core::data::return_price;
use alloclab_core::engine::{asset_returns, EngineVariant};
use alloclab_core::fingerprint::allocation_hash;
use alloclab_core::{
    simulate, summarize, ConfigHash, DatasetHash, EngineError, MetricsSummary, Observation,
    PeriodResult,
};
use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{BatchConfig, ConfigError, StrategyEntry};
use crate::data_loader::{
    load_allocations, load_observations, AllocationSchema, LoadError, LoadedData,
    ObservationSchema,
};
use crate::diagnostics::Diagnostics;
use crate::export::OutputSink;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] LoadError),
    #[error("strategy '{strategy}' failed")]
    Engine {
        strategy: String,
        #[source]
        source: EngineError,
    },
}

impl RunError {
    fn engine(strategy: &str, source: EngineError) -> Self {
        Self::Engine {
            strategy: strategy.to_string(),
            source,
        }
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete in-memory result of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    pub id: String,
    pub variant: EngineVariant,
    pub config_hash: ConfigHash,
    pub allocation_hash: DatasetHash,
    pub results: Vec<PeriodResult>,
    pub summary: MetricsSummary,
    pub diagnostics: Diagnostics,
}

/// Command-line overrides for a batch.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub output_dir: Option<PathBuf>,
    /// `Some` overrides `[output] parallel`.
    pub parallel: Option<bool>,
}

/// Summary of a completed batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub dataset_hash: String,
    pub runs: Vec<StrategyRun>,
}

/// Load the observation dataset a batch references.
pub fn load_batch_data(config: &BatchConfig) -> Result<LoadedData, RunError> {
    let schema = ObservationSchema {
        period_column: config.data.period_column.clone(),
        price_column: config.data.price_column.clone(),
        fields: config.referenced_fields(),
        delimiter: config.delimiter()?,
    };
    Ok(load_observations(
        &config.resolve(&config.data.observations),
        &schema,
    )?)
}

/// Run one strategy against pre-loaded observations. No output I/O.
pub fn run_strategy(
    config: &BatchConfig,
    strategy: &StrategyEntry,
    observations: &[Observation],
) -> Result<StrategyRun, RunError> {
    let sim = strategy
        .sim_config()
        .map_err(|e| RunError::engine(&strategy.id, e))?;
    let periods_per_year = config.output.periods_per_year;
    let config_hash = strategy
        .config_hash(periods_per_year)
        .map_err(|e| RunError::engine(&strategy.id, e))?;

    let schema = AllocationSchema {
        period_column: strategy
            .period_column
            .clone()
            .unwrap_or_else(|| config.data.period_column.clone()),
        weight_column: strategy.weight_column.clone(),
        delimiter: config.delimiter()?,
    };
    let allocations = load_allocations(&config.resolve(&strategy.allocations), &schema)?;
    let allocation_hash = allocation_hash(&allocations);

    let results =
        simulate(observations, &allocations, &sim).map_err(|e| RunError::engine(&strategy.id, e))?;
    let summary = summarize(&results, periods_per_year, strategy.series)
        .map_err(|e| RunError::engine(&strategy.id, e))?;

    // Prices were validated by `simulate`, so this cannot fail here.
    let prices = observations
        .iter()
        .map(|o| return_price(o, sim.return_field.as_deref()))
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| RunError::engine(&strategy.id, e))?;
    let diagnostics = Diagnostics::compute(&results, &allocations, &asset_returns(&prices), &sim);

    info!(
        strategy = %strategy.id,
        variant = sim.variant().as_str(),
        series = strategy.series.as_str(),
        periods = results.len(),
        trades = diagnostics.trades,
        annualized_return = summary.annualized_return,
        max_drawdown = summary.max_drawdown,
        "strategy complete"
    );

    Ok(StrategyRun {
        id: strategy.id.clone(),
        variant: sim.variant(),
        config_hash,
        allocation_hash,
        results,
        summary,
        diagnostics,
    })
}

/// Run every strategy in `config` and write all outputs.
///
/// Outputs of strategies that completed before a failure stay on disk.
pub fn run_batch(config: &BatchConfig, opts: &RunOptions) -> anyhow::Result<BatchReport> {
    let output_dir = opts
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir());
    let parallel = opts.parallel.unwrap_or(config.output.parallel);

    let loaded = load_batch_data(config)?;
    let dataset_hash = loaded.dataset_hash.0.clone();
    info!(
        observations = loaded.observations.len(),
        strategies = config.strategies.len(),
        dataset = loaded.dataset_hash.short(),
        parallel,
        "batch start"
    );

    let mut sink = OutputSink::create(&output_dir, &dataset_hash)?;
    let mut runs = Vec::with_capacity(config.strategies.len());

    if parallel {
        // Simulate everything, then write in configuration order.
        let outcomes: Vec<Result<StrategyRun, RunError>> = config
            .strategies
            .par_iter()
            .map(|s| run_strategy(config, s, &loaded.observations))
            .collect();
        for outcome in outcomes {
            let run = outcome?;
            sink.record(&run)
                .with_context(|| format!("failed to export strategy '{}'", run.id))?;
            runs.push(run);
        }
    } else {
        for strategy in &config.strategies {
            let run = run_strategy(config, strategy, &loaded.observations)?;
            sink.record(&run)
                .with_context(|| format!("failed to export strategy '{}'", run.id))?;
            runs.push(run);
        }
    }

    info!(completed = runs.len(), output = %output_dir.display(), "batch complete");
    Ok(BatchReport {
        output_dir,
        dataset_hash,
        runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn fixture(dir: &Path) -> BatchConfig {
        write(
            dir,
            "obs.csv",
            "period,price,rf\n2024-01-01,100,0.001\n2024-01-02,102,0.001\n2024-01-03,99,0.001\n2024-01-04,105,0.001\n",
        );
        write(
            dir,
            "hold.csv",
            "period,target_weight\n2024-01-01,1\n2024-01-02,1\n2024-01-03,1\n2024-01-04,1\n",
        );
        let mut config = BatchConfig::from_toml(
            r#"
            [data]
            observations = "obs.csv"

            [[strategy]]
            id = "hold"
            allocations = "hold.csv"
            variant = "fixed_weight"
            cadence = 1
            series = "raw"
            "#,
        )
        .unwrap();
        config.base_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn run_strategy_reproduces_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        let loaded = load_batch_data(&config).unwrap();
        let run = run_strategy(&config, &config.strategies[0], &loaded.observations).unwrap();
        assert_eq!(run.results.len(), 4);
        assert!((run.summary.max_drawdown - 0.0294).abs() < 1e-4);
        assert_eq!(run.variant, EngineVariant::FixedWeight);
        assert_eq!(run.diagnostics.trades, 0);
        assert_eq!(run.allocation_hash.0.len(), 64);
    }

    #[test]
    fn engine_errors_name_the_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        write(
            dir.path(),
            "hold.csv",
            "period,target_weight\n2024-01-01,1\n2024-01-02,1\n2024-01-03,1\n2024-01-05,1\n",
        );
        let loaded = load_batch_data(&config).unwrap();
        let err = run_strategy(&config, &config.strategies[0], &loaded.observations).unwrap_err();
        match err {
            RunError::Engine {
                ref strategy,
                ref source,
            } => {
                assert_eq!(strategy, "hold");
                assert_eq!(source.tag(), "alignment");
            }
            ref other => panic!("expected engine error, got {other}"),
        }
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.starts_with("strategy 'hold' failed: "), "{chain}");
        assert_eq!(chain.matches("strategy 'hold'").count(), 1, "{chain}");
    }

    #[test]
    fn missing_file_reported_once_in_chain() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        std::fs::remove_file(dir.path().join("obs.csv")).unwrap();
        let err = anyhow::Error::new(load_batch_data(&config).unwrap_err());
        let chain = format!("{err:#}");
        assert_eq!(chain.matches("failed to read").count(), 1, "{chain}");
        assert_eq!(chain.matches("obs.csv").count(), 1, "{chain}");
        assert!(err.chain().count() >= 2, "{chain}");
    }
}
