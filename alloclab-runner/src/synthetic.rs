//! Synthetic inputs for demos and tests.
//!
//! Produces a deterministic random-walk observation file (price plus a
//! funding-rate column), three allocation streams, and a batch config that
//! runs them. The same seed label always yields byte-identical files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Parameters for a synthetic dataset.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    /// Number of periods (business days).
    pub periods: usize,
    pub start: NaiveDate,
    /// Seed label; hashed with BLAKE3 into the RNG seed.
    pub seed: String,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            periods: 504,
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            seed: "alloclab".into(),
        }
    }
}

/// One generated row.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticRow {
    pub date: NaiveDate,
    pub price: f64,
    /// Annualized funding rate.
    pub rf: f64,
}

/// Paths of the generated files.
#[derive(Debug, Clone)]
pub struct SyntheticFiles {
    pub observations: PathBuf,
    pub allocations: Vec<PathBuf>,
    pub config: PathBuf,
}

/// Generate the synthetic series in memory.
///
/// Weekends are skipped. Daily returns are uniform in ±2% with a slow
/// sinusoidal drift; the funding rate wanders between 0% and 5%.
pub fn generate_rows(spec: &SyntheticSpec) -> Vec<SyntheticRow> {
    let seed: [u8; 32] = *blake3::hash(spec.seed.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut rows = Vec::with_capacity(spec.periods);
    let mut price = 100.0_f64;
    let mut rf = 0.02_f64;
    let mut current = spec.start;

    while rows.len() < spec.periods {
        let weekday = current.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }
        if !rows.is_empty() {
            let drift = 0.0004 * (rows.len() as f64 / 60.0).sin();
            let daily_return: f64 = rng.gen_range(-0.02_f64..0.02) + drift;
            price *= 1.0 + daily_return;
            rf = (rf + rng.gen_range(-0.0005_f64..0.0005)).clamp(0.0, 0.05);
        }
        rows.push(SyntheticRow {
            date: current,
            price,
            rf,
        });
        current += chrono::Duration::days(1);
    }
    rows
}

/// Trend-following weights: long when price is above its trailing mean,
/// short otherwise. The first `window` periods stay flat.
pub fn momentum_weights(rows: &[SyntheticRow], window: usize) -> Vec<f64> {
    (0..rows.len())
        .map(|t| {
            if window == 0 || t < window {
                return 0.0;
            }
            let mean = rows[t - window..t].iter().map(|r| r.price).sum::<f64>() / window as f64;
            if rows[t].price > mean {
                1.0
            } else {
                -0.5
            }
        })
        .collect()
}

fn write_weights(path: &Path, rows: &[SyntheticRow], weights: &[f64]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    wtr.write_record(["period", "target_weight"])?;
    for (row, w) in rows.iter().zip(weights) {
        wtr.write_record([row.date.to_string(), w.to_string()])?;
    }
    wtr.flush()
        .with_context(|| format!("failed to write {}", path.display()))
}

fn batch_toml(periods_per_year: u32) -> String {
    format!(
        r#"[data]
observations = "observations.csv"

[output]
dir = "output"
periods_per_year = {periods_per_year}

[[strategy]]
id = "buy_and_hold"
allocations = "buy_and_hold.csv"
variant = "fixed_weight"
cadence = 1
series = "raw"

[[strategy]]
id = "balanced"
allocations = "balanced.csv"
variant = "adjusted"
cadence = 21
series = "excess"
funding = {{ mode = "excess_return", field = "rf", scale = {scale} }}

[[strategy]]
id = "momentum"
allocations = "momentum.csv"
variant = "adjusted"
cadence = 5
series = "excess"
cost = {{ mode = "volatility_scaled", coefficient = 0.5, lookback = 20 }}
funding = {{ mode = "excess_return", field = "rf", scale = {scale} }}
"#,
        scale = 1.0 / periods_per_year as f64,
    )
}

/// Write observations, allocation files, and a runnable `alloclab.toml`.
pub fn write_dataset(dir: &Path, spec: &SyntheticSpec) -> Result<SyntheticFiles> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let rows = generate_rows(spec);

    let observations = dir.join("observations.csv");
    let mut wtr = csv::Writer::from_path(&observations)
        .with_context(|| format!("failed to create {}", observations.display()))?;
    wtr.write_record(["period", "price", "rf"])?;
    for row in &rows {
        wtr.write_record([row.date.to_string(), row.price.to_string(), row.rf.to_string()])?;
    }
    wtr.flush()
        .with_context(|| format!("failed to write {}", observations.display()))?;

    let streams: [(&str, Vec<f64>); 3] = [
        ("buy_and_hold", vec![1.0; rows.len()]),
        ("balanced", vec![0.6; rows.len()]),
        ("momentum", momentum_weights(&rows, 20)),
    ];
    let mut allocations = Vec::with_capacity(streams.len());
    for (name, weights) in &streams {
        let path = dir.join(format!("{name}.csv"));
        write_weights(&path, &rows, weights)?;
        allocations.push(path);
    }

    let config = dir.join("alloclab.toml");
    std::fs::write(&config, batch_toml(252))
        .with_context(|| format!("failed to write {}", config.display()))?;

    Ok(SyntheticFiles {
        observations,
        allocations,
        config,
    })
}
