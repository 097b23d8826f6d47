//! Output export — per-period CSV, summary and diagnostics tables, manifest.
//!
//! Layout under the output directory:
//! - `periods/<strategy_id>-<hash12>.csv` — one row per period
//! - `summary.csv` — one row per completed strategy
//! - `diagnostics.csv` — one row per completed strategy
//! - `manifest.json` — dataset hash plus per-strategy identity
//!
//! A strategy's per-period file from an earlier configuration is removed
//! once the new one is recorded.
//!
//! Floats are written in shortest round-trip form, so re-reading a file
//! reproduces the in-memory values exactly. Nothing time-dependent is
//! written: identical runs produce identical bytes.

use std::path::{Path, PathBuf};

use alloclab_core::fingerprint::SHORT_HASH_LEN;
use alloclab_core::{MetricsSummary, PeriodResult};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::runner::{StrategyRun, SCHEMA_VERSION};

pub const PERIODS_DIR: &str = "periods";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const DIAGNOSTICS_FILE: &str = "diagnostics.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

const PERIOD_HEADER: [&str; 9] = [
    "period",
    "nav",
    "period_return",
    "turnover",
    "cost_paid",
    "funding_paid",
    "weight",
    "gross_return",
    "cost_suppressed",
];

const SUMMARY_HEADER: [&str; 8] = [
    "strategy_id",
    "variant",
    "series",
    "annualized_return",
    "annualized_volatility",
    "max_drawdown",
    "calmar_ratio",
    "sharpe_ratio",
];

const DIAGNOSTICS_HEADER: [&str; 12] = [
    "strategy_id",
    "periods",
    "rebalances",
    "trades",
    "increase_rising",
    "increase_falling",
    "decrease_rising",
    "decrease_falling",
    "total_turnover",
    "total_cost",
    "total_funding",
    "cost_suppressed",
];

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ─── Per-period CSV ─────────────────────────────────────────────────

/// Render a period series as CSV.
pub fn export_periods_csv(results: &[PeriodResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(PERIOD_HEADER)?;
    for r in results {
        wtr.write_record([
            r.period.to_string(),
            r.nav.to_string(),
            r.period_return.to_string(),
            r.turnover.to_string(),
            r.cost_paid.to_string(),
            r.funding_paid.to_string(),
            r.weight.to_string(),
            r.gross_return.to_string(),
            r.cost_suppressed.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Read a per-period CSV back into results.
pub fn import_periods_csv(path: &Path) -> Result<Vec<PeriodResult>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let header = rdr.headers()?.clone();
    if header.iter().ne(PERIOD_HEADER.iter().copied()) {
        bail!(
            "{} is not a per-period export (header: {})",
            path.display(),
            header.iter().collect::<Vec<_>>().join(",")
        );
    }

    let mut results = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("{} row {}", path.display(), i + 1))?;
        let number = |idx: usize| -> Result<f64> {
            let raw = &record[idx];
            raw.parse::<f64>().with_context(|| {
                format!(
                    "{} row {}, column '{}': '{raw}' is not a number",
                    path.display(),
                    i + 1,
                    PERIOD_HEADER[idx]
                )
            })
        };
        results.push(PeriodResult {
            period: record[0]
                .parse()
                .with_context(|| format!("{} row {}", path.display(), i + 1))?,
            nav: number(1)?,
            period_return: number(2)?,
            turnover: number(3)?,
            cost_paid: number(4)?,
            funding_paid: number(5)?,
            weight: number(6)?,
            gross_return: number(7)?,
            cost_suppressed: record[8].parse::<bool>().with_context(|| {
                format!(
                    "{} row {}, column 'cost_suppressed': '{}' is not true/false",
                    path.display(),
                    i + 1,
                    &record[8]
                )
            })?,
        });
    }
    Ok(results)
}

// ─── Summary / diagnostics rows ─────────────────────────────────────

fn summary_row(strategy_id: &str, variant: &str, summary: &MetricsSummary) -> [String; 8] {
    [
        strategy_id.to_string(),
        variant.to_string(),
        summary.series.as_str().to_string(),
        summary.annualized_return.to_string(),
        summary.annualized_volatility.to_string(),
        summary.max_drawdown.to_string(),
        optional(summary.calmar_ratio),
        optional(summary.sharpe_ratio),
    ]
}

fn diagnostics_row(strategy_id: &str, d: &Diagnostics) -> [String; 12] {
    [
        strategy_id.to_string(),
        d.periods.to_string(),
        d.rebalances.to_string(),
        d.trades.to_string(),
        d.increase_rising.to_string(),
        d.increase_falling.to_string(),
        d.decrease_rising.to_string(),
        d.decrease_falling.to_string(),
        d.total_turnover.to_string(),
        d.total_cost.to_string(),
        d.total_funding.to_string(),
        d.cost_suppressed.to_string(),
    ]
}

// ─── Manifest ───────────────────────────────────────────────────────

/// Identity of one completed strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub config_hash: String,
    /// Content hash of the allocation stream the strategy ran on.
    #[serde(default)]
    pub allocation_hash: String,
    pub variant: String,
    pub series: String,
    /// Per-period file, relative to the output directory.
    pub file: String,
}

/// Record of an invocation's completed strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub dataset_hash: String,
    pub strategies: Vec<ManifestEntry>,
}

/// Parse a manifest, rejecting unknown schema versions.
pub fn import_manifest(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize run manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── Output sink ────────────────────────────────────────────────────

/// Writes one invocation's outputs.
///
/// Nothing under the output directory is touched until the first strategy
/// completes. Each `record` call then writes the strategy's per-period file
/// and replaces `summary.csv`, `diagnostics.csv` and `manifest.json` with
/// every strategy recorded so far. Each file is written to a temporary path
/// and renamed into place, so a failure leaves the previous contents intact.
#[derive(Debug)]
pub struct OutputSink {
    dir: PathBuf,
    manifest: RunManifest,
    summary_rows: Vec<[String; 8]>,
    diagnostics_rows: Vec<[String; 12]>,
}

impl OutputSink {
    pub fn create(dir: &Path, dataset_hash: &str) -> Result<Self> {
        std::fs::create_dir_all(dir.join(PERIODS_DIR))
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            manifest: RunManifest {
                schema_version: SCHEMA_VERSION,
                dataset_hash: dataset_hash.to_string(),
                strategies: Vec::new(),
            },
            summary_rows: Vec::new(),
            diagnostics_rows: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    /// Relative path of a strategy's per-period file.
    pub fn periods_file_name(run: &StrategyRun) -> String {
        format!("{PERIODS_DIR}/{}-{}.csv", run.id, run.config_hash.short())
    }

    /// Write every output for one completed strategy.
    pub fn record(&mut self, run: &StrategyRun) -> Result<PathBuf> {
        let file = Self::periods_file_name(run);
        let path = self.dir.join(&file);
        write_atomic(&path, export_periods_csv(&run.results)?.as_bytes())?;

        self.summary_rows
            .push(summary_row(&run.id, run.variant.as_str(), &run.summary));
        self.diagnostics_rows
            .push(diagnostics_row(&run.id, &run.diagnostics));
        write_atomic(
            &self.dir.join(SUMMARY_FILE),
            &render_table(&SUMMARY_HEADER, &self.summary_rows)?,
        )?;
        write_atomic(
            &self.dir.join(DIAGNOSTICS_FILE),
            &render_table(&DIAGNOSTICS_HEADER, &self.diagnostics_rows)?,
        )?;

        self.manifest.strategies.push(ManifestEntry {
            id: run.id.clone(),
            config_hash: run.config_hash.0.clone(),
            allocation_hash: run.allocation_hash.0.clone(),
            variant: run.variant.as_str().to_string(),
            series: run.summary.series.as_str().to_string(),
            file,
        });
        self.write_manifest()?;

        let removed = self.prune_periods(&run.id, &path)?;
        if removed > 0 {
            debug!(strategy = %run.id, removed, "removed superseded per-period files");
        }
        Ok(path)
    }

    fn write_manifest(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.manifest)
            .context("failed to serialize run manifest")?;
        write_atomic(&self.dir.join(MANIFEST_FILE), json.as_bytes())
    }

    /// Delete per-period files an earlier configuration of `id` left behind.
    fn prune_periods(&self, id: &str, keep: &Path) -> Result<usize> {
        let periods_dir = self.dir.join(PERIODS_DIR);
        let entries = std::fs::read_dir(&periods_dir)
            .with_context(|| format!("failed to list {}", periods_dir.display()))?;
        let mut removed = 0;
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list {}", periods_dir.display()))?
                .path();
            if path == keep {
                continue;
            }
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| is_periods_file_of(name, id));
            if matches {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Whether `name` is `<id>-<hash12>.csv`, the per-period file name of `id`
/// under any configuration.
fn is_periods_file_of(name: &str, id: &str) -> bool {
    name.strip_prefix(id)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|rest| rest.strip_suffix(".csv"))
        .is_some_and(|hash| {
            hash.len() == SHORT_HASH_LEN
                && hash
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        })
}

fn render_table<const N: usize>(header: &[&str; N], rows: &[[String; N]]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.into_inner().context("failed to flush CSV writer")
}

/// Write `contents` next to `path`, then rename over it.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);
    std::fs::write(&tmp_path, contents)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        anyhow::Error::new(e).context(format!("failed to move output into {}", path.display()))
    })
}
