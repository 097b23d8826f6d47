//! Performance metrics — pure functions over a simulated period series.
//!
//! `summarize` picks the return series (raw or excess), then every metric is
//! a plain function of that series or its NAV path. No state, no I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::PeriodResult;
use crate::error::EngineError;

/// Which return series a summary is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnSeries {
    /// Period returns with the funding adjustment added back.
    Raw,
    /// Period returns net of funding.
    Excess,
}

impl ReturnSeries {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnSeries::Raw => "raw",
            ReturnSeries::Excess => "excess",
        }
    }

    /// Per-period returns after the seed period.
    pub fn returns(&self, results: &[PeriodResult]) -> Vec<f64> {
        results
            .iter()
            .skip(1)
            .map(|r| match self {
                ReturnSeries::Raw => r.raw_return(),
                ReturnSeries::Excess => r.period_return,
            })
            .collect()
    }
}

impl fmt::Display for ReturnSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnSeries {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(ReturnSeries::Raw),
            "excess" => Ok(ReturnSeries::Excess),
            other => Err(EngineError::config(format!(
                "unknown return series '{other}', expected 'raw' or 'excess'"
            ))),
        }
    }
}

/// Summary statistics for one simulated strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub series: ReturnSeries,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// Positive fraction in `[0, 1]`.
    pub max_drawdown: f64,
    /// `None` when there was no drawdown.
    pub calmar_ratio: Option<f64>,
    /// `None` when volatility is zero.
    pub sharpe_ratio: Option<f64>,
}

/// Compute the summary for a period series.
///
/// `results[0]` is the seed period and contributes only its NAV as the path
/// origin.
pub fn summarize(
    results: &[PeriodResult],
    periods_per_year: f64,
    series: ReturnSeries,
) -> Result<MetricsSummary, EngineError> {
    if results.len() < 2 {
        return Err(EngineError::InsufficientData {
            required: 2,
            actual: results.len(),
        });
    }
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(EngineError::config(format!(
            "periods_per_year must be positive, got {periods_per_year}"
        )));
    }

    let returns = series.returns(results);
    let path = match series {
        ReturnSeries::Excess => results.iter().map(|r| r.nav).collect(),
        ReturnSeries::Raw => nav_path(results[0].nav, &returns),
    };

    let ann_return = annualized_return(&returns, periods_per_year);
    let ann_vol = annualized_volatility(&returns, periods_per_year);
    let dd = max_drawdown(&path);

    Ok(MetricsSummary {
        series,
        annualized_return: ann_return,
        annualized_volatility: ann_vol,
        max_drawdown: dd,
        calmar_ratio: calmar_ratio(ann_return, dd),
        sharpe_ratio: sharpe_ratio(ann_return, ann_vol),
    })
}

// ─── Individual metric functions ────────────────────────────────────

/// Arithmetic mean return scaled to a year.
pub fn annualized_return(returns: &[f64], periods_per_year: f64) -> f64 {
    mean_f64(returns) * periods_per_year
}

/// Sample standard deviation scaled by `sqrt(periods_per_year)`.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    std_dev(returns) * periods_per_year.sqrt()
}

/// Largest peak-to-trough decline as a positive fraction.
///
/// Returns 0.0 for monotonically non-decreasing or single-point paths.
pub fn max_drawdown(nav_path: &[f64]) -> f64 {
    let Some(&first) = nav_path.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &nav in nav_path {
        if nav > peak {
            peak = nav;
        }
        if peak > 0.0 {
            let dd = (peak - nav) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Annualized return over max drawdown; `None` without a drawdown.
pub fn calmar_ratio(annualized_return: f64, max_drawdown: f64) -> Option<f64> {
    if max_drawdown > 0.0 {
        Some(annualized_return / max_drawdown)
    } else {
        None
    }
}

/// Annualized return over annualized volatility; `None` at zero volatility.
pub fn sharpe_ratio(annualized_return: f64, annualized_volatility: f64) -> Option<f64> {
    if annualized_volatility > 0.0 {
        Some(annualized_return / annualized_volatility)
    } else {
        None
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Compound `returns` onto `start`; the output includes `start`.
pub fn nav_path(start: f64, returns: &[f64]) -> Vec<f64> {
    let mut path = Vec::with_capacity(returns.len() + 1);
    let mut nav = start;
    path.push(nav);
    for r in returns {
        nav *= 1.0 + r;
        path.push(nav);
    }
    path
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
