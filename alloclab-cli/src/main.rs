//! AllocLab CLI — batch runs, synthetic data, and summaries of exported runs.
//!
//! Commands:
//! - `run`: execute every strategy in a TOML batch file
//! - `generate`: write a deterministic synthetic dataset and batch config
//! - `summarize`: recompute metrics from an exported per-period file

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use alloclab_core::{summarize, MetricsSummary, ReturnSeries};
use alloclab_runner::{
    import_periods_csv, run_batch, write_dataset, BatchConfig, RunOptions, SyntheticSpec,
};

#[derive(Parser)]
#[command(
    name = "alloclab",
    about = "AllocLab CLI — portfolio allocation simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every strategy in a TOML batch file, in file order.
    Run {
        /// Path to the batch config.
        #[arg(long)]
        config: PathBuf,

        /// Output directory. Overrides `[output] dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Simulate strategies concurrently.
        #[arg(long, default_value_t = false, conflicts_with = "sequential")]
        parallel: bool,

        /// Simulate strategies one at a time, even if the config enables parallelism.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Write a deterministic synthetic dataset plus a runnable batch config.
    Generate {
        /// Target directory. Created if missing.
        #[arg(long, default_value = "demo")]
        dir: PathBuf,

        /// Number of business-day periods.
        #[arg(long, default_value_t = 504)]
        periods: usize,

        /// First calendar date (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        /// Seed label for the random walk.
        #[arg(long, default_value = "alloclab")]
        seed: String,
    },
    /// Recompute a metrics summary from an exported per-period CSV.
    Summarize {
        /// Per-period file written by `run`.
        #[arg(long)]
        file: PathBuf,

        /// Periods per year used for annualization.
        #[arg(long, default_value_t = 252.0)]
        periods_per_year: f64,

        /// Return series: `raw` or `excess`.
        #[arg(long)]
        series: ReturnSeries,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            parallel,
            sequential,
        } => {
            let parallel = match (parallel, sequential) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            run_cmd(config, output_dir, parallel)
        }
        Commands::Generate {
            dir,
            periods,
            start,
            seed,
        } => generate_cmd(dir, periods, &start, seed),
        Commands::Summarize {
            file,
            periods_per_year,
            series,
            json,
        } => summarize_cmd(file, periods_per_year, series, json),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_cmd(config_path: PathBuf, output_dir: Option<PathBuf>, parallel: Option<bool>) -> Result<()> {
    let config = BatchConfig::from_file(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let report = run_batch(
        &config,
        &RunOptions {
            output_dir,
            parallel,
        },
    )?;

    println!(
        "{:<20} {:<13} {:<7} {:>10} {:>10} {:>8} {:>8} {:>8}",
        "strategy", "variant", "series", "ann_ret", "ann_vol", "max_dd", "calmar", "sharpe"
    );
    for run in &report.runs {
        print_summary_row(&run.id, run.variant.as_str(), &run.summary);
    }
    println!("\nOutputs written to {}", report.output_dir.display());
    Ok(())
}

fn generate_cmd(dir: PathBuf, periods: usize, start: &str, seed: String) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("invalid start date '{start}' (expected YYYY-MM-DD)"))?;
    let files = write_dataset(
        &dir,
        &SyntheticSpec {
            periods,
            start,
            seed,
        },
    )?;
    info!(dir = %dir.display(), periods, "synthetic dataset written");
    println!("Observations: {}", files.observations.display());
    for path in &files.allocations {
        println!("Allocations:  {}", path.display());
    }
    println!(
        "Run it with:  alloclab run --config {}",
        files.config.display()
    );
    Ok(())
}

fn summarize_cmd(file: PathBuf, periods_per_year: f64, series: ReturnSeries, json: bool) -> Result<()> {
    let results = import_periods_csv(&file)?;
    let summary = summarize(&results, periods_per_year, series)
        .with_context(|| format!("failed to summarize {}", file.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        print_summary_row(&name, "-", &summary);
    }
    Ok(())
}

fn print_summary_row(id: &str, variant: &str, s: &MetricsSummary) {
    let ratio = |r: Option<f64>| r.map(|v| format!("{v:.3}")).unwrap_or_else(|| "n/a".into());
    println!(
        "{:<20} {:<13} {:<7} {:>9.2}% {:>9.2}% {:>7.2}% {:>8} {:>8}",
        id,
        variant,
        s.series.as_str(),
        s.annualized_return * 100.0,
        s.annualized_volatility * 100.0,
        s.max_drawdown * 100.0,
        ratio(s.calmar_ratio),
        ratio(s.sharpe_ratio),
    );
}
