//! Serializable batch configuration.
//!
//! A batch file names one observation dataset and any number of strategies,
//! each pairing an allocation file with engine settings:
//!
//! ```toml
//! [data]
//! observations = "observations.csv"
//!
//! [output]
//! dir = "output"
//! periods_per_year = 252
//!
//! [[strategy]]
//! id = "momentum"
//! allocations = "momentum.csv"
//! variant = "adjusted"
//! cadence = 5
//! series = "excess"
//! cost = { mode = "volatility_scaled", coefficient = 0.5, lookback = 20 }
//! funding = { mode = "excess_return", field = "rf", scale = 0.004 }
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use alloclab_core::engine::{CostMode, EngineVariant, FundingMode, SimConfig};
use alloclab_core::{ConfigHash, EngineError, ReturnSeries};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a batch configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    #[error("invalid strategy '{id}'")]
    Strategy {
        id: String,
        #[source]
        source: EngineError,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_period_column() -> String {
    "period".into()
}

fn default_price_column() -> String {
    "price".into()
}

fn default_weight_column() -> String {
    "target_weight".into()
}

fn default_delimiter() -> String {
    ",".into()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_periods_per_year() -> f64 {
    252.0
}

fn default_one() -> f64 {
    1.0
}

fn no_cost() -> CostMode {
    CostMode::None
}

fn no_funding() -> FundingMode {
    FundingMode::None
}

/// Top-level batch configuration (one TOML file).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "strategy", default)]
    pub strategies: Vec<StrategyEntry>,
    /// Directory relative paths are resolved against (the config file's parent).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Observation dataset location and column mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    pub observations: PathBuf,
    #[serde(default = "default_period_column")]
    pub period_column: String,
    #[serde(default = "default_price_column")]
    pub price_column: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

/// Output location and batch-wide run settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,
    /// Run strategies concurrently on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            periods_per_year: default_periods_per_year(),
            parallel: false,
        }
    }
}

/// One strategy: an allocation stream plus engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyEntry {
    pub id: String,
    pub allocations: PathBuf,
    #[serde(default = "default_weight_column")]
    pub weight_column: String,
    /// Period column of the allocation file; defaults to the dataset's.
    #[serde(default)]
    pub period_column: Option<String>,
    pub variant: EngineVariant,
    pub cadence: usize,
    #[serde(default = "no_cost")]
    pub cost: CostMode,
    #[serde(default = "no_funding")]
    pub funding: FundingMode,
    #[serde(default = "default_one")]
    pub initial_nav: f64,
    #[serde(default = "default_one")]
    pub max_abs_weight: f64,
    #[serde(default)]
    pub return_field: Option<String>,
    /// Return series the summary is computed on. No default.
    pub series: ReturnSeries,
}

/// Everything that determines a strategy's output, in hash order.
#[derive(Serialize)]
struct StrategyFingerprint<'a> {
    id: &'a str,
    sim: &'a SimConfig,
    series: ReturnSeries,
    periods_per_year: f64,
}

impl StrategyEntry {
    /// Build the engine configuration, enforcing the variant's rules.
    pub fn sim_config(&self) -> Result<SimConfig, EngineError> {
        let mut config = SimConfig::for_variant(
            self.variant,
            self.cadence,
            self.cost.clone(),
            self.funding.clone(),
        )?
        .with_initial_nav(self.initial_nav)
        .with_max_abs_weight(self.max_abs_weight);
        if let Some(field) = &self.return_field {
            config = config.with_return_field(field.clone());
        }
        config.validate()?;
        Ok(config)
    }

    /// Macro fields this strategy reads from the observation dataset.
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if let FundingMode::ExcessReturn { field, .. } = &self.funding {
            fields.push(field.clone());
        }
        if let Some(field) = &self.return_field {
            fields.push(field.clone());
        }
        fields
    }

    pub fn config_hash(&self, periods_per_year: f64) -> Result<ConfigHash, EngineError> {
        let sim = self.sim_config()?;
        ConfigHash::of(&StrategyFingerprint {
            id: &self.id,
            sim: &sim,
            series: self.series,
            periods_per_year,
        })
    }
}

impl BatchConfig {
    /// Load and validate a TOML batch file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Parse and validate TOML text. Relative paths resolve against the
    /// current directory.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve a path from the config against its base directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output.dir)
    }

    pub fn delimiter(&self) -> Result<u8, ConfigError> {
        match self.data.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ if self.data.delimiter == "\\t" => Ok(b'\t'),
            _ => Err(ConfigError::Invalid(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.data.delimiter
            ))),
        }
    }

    /// Union of macro fields referenced by any strategy, sorted.
    pub fn referenced_fields(&self) -> Vec<String> {
        let fields: BTreeSet<String> = self
            .strategies
            .iter()
            .flat_map(|s| s.referenced_fields())
            .collect();
        fields.into_iter().collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiter()?;
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid("no [[strategy]] entries".into()));
        }
        let ppy = self.output.periods_per_year;
        if !(ppy.is_finite() && ppy > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "periods_per_year must be positive, got {ppy}"
            )));
        }

        let mut seen = HashSet::new();
        for strategy in &self.strategies {
            if strategy.id.is_empty()
                || !strategy
                    .id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            {
                return Err(ConfigError::Invalid(format!(
                    "strategy id '{}' must be non-empty and use only [A-Za-z0-9_.-]",
                    strategy.id
                )));
            }
            if !seen.insert(strategy.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate strategy id '{}'",
                    strategy.id
                )));
            }
            strategy
                .sim_config()
                .map_err(|source| ConfigError::Strategy {
                    id: strategy.id.clone(),
                    source,
                })?;
            if strategy.series == ReturnSeries::Excess && !strategy.funding.is_enabled() {
                return Err(ConfigError::Strategy {
                    id: strategy.id.clone(),
                    source: EngineError::config(
                        "series = \"excess\" requires funding adjustment",
                    ),
                });
            }
        }
        Ok(())
    }
}
