//! Series loading for the runner.
//!
//! Reads delimited text with a header row. Columns are looked up by name, so
//! their order in the file does not matter. Only the columns a batch actually
//! references are parsed; anything else in the file is ignored.
//!
//! Loading checks shape only (columns present, cells numeric, periods
//! parseable). Ordering, finiteness, and bounds are the engine's job.

use std::path::{Path, PathBuf};

use alloclab_core::fingerprint::{dataset_hash, DatasetHash};
use alloclab_core::{AllocationDecision, Observation, Period};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}'")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("'{path}' has no column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("'{path}' row {row}, column '{column}': {reason}")]
    Cell {
        path: PathBuf,
        row: usize,
        column: String,
        reason: String,
    },

    #[error("'{path}' contains no data rows")]
    Empty { path: PathBuf },
}

/// Column layout of an observation file.
#[derive(Debug, Clone)]
pub struct ObservationSchema {
    pub period_column: String,
    pub price_column: String,
    /// Macro columns to load; each must be present.
    pub fields: Vec<String>,
    pub delimiter: u8,
}

impl Default for ObservationSchema {
    fn default() -> Self {
        Self {
            period_column: "period".into(),
            price_column: "price".into(),
            fields: Vec::new(),
            delimiter: b',',
        }
    }
}

/// Column layout of an allocation file.
#[derive(Debug, Clone)]
pub struct AllocationSchema {
    pub period_column: String,
    pub weight_column: String,
    pub delimiter: u8,
}

impl Default for AllocationSchema {
    fn default() -> Self {
        Self {
            period_column: "period".into(),
            weight_column: "target_weight".into(),
            delimiter: b',',
        }
    }
}

/// Loaded observations with their content hash.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub observations: Vec<Observation>,
    pub dataset_hash: DatasetHash,
}

fn open(path: &Path, delimiter: u8) -> Result<csv::Reader<std::fs::File>, LoadError> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn headers(
    reader: &mut csv::Reader<std::fs::File>,
    path: &Path,
) -> Result<csv::StringRecord, LoadError> {
    reader.headers().cloned().map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Index of `column` in the header. The period column also answers to
/// `date` when the configured name is the default `period`.
fn column_index(header: &csv::StringRecord, column: &str, path: &Path) -> Result<usize, LoadError> {
    let find = |name: &str| header.iter().position(|h| h == name);
    find(column)
        .or_else(|| (column == "period").then(|| find("date")).flatten())
        .ok_or_else(|| LoadError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

struct CellReader<'a> {
    path: &'a Path,
    /// 1-based data row number (the header is row 0).
    row: usize,
    record: &'a csv::StringRecord,
}

impl CellReader<'_> {
    fn cell_error(&self, column: &str, reason: impl Into<String>) -> LoadError {
        LoadError::Cell {
            path: self.path.to_path_buf(),
            row: self.row,
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    fn raw(&self, index: usize, column: &str) -> Result<&str, LoadError> {
        self.record
            .get(index)
            .ok_or_else(|| self.cell_error(column, "cell is missing"))
    }

    fn period(&self, index: usize, column: &str) -> Result<Period, LoadError> {
        let raw = self.raw(index, column)?;
        raw.parse::<Period>()
            .map_err(|e| self.cell_error(column, e.to_string()))
    }

    fn number(&self, index: usize, column: &str) -> Result<f64, LoadError> {
        let raw = self.raw(index, column)?;
        raw.parse::<f64>()
            .map_err(|_| self.cell_error(column, format!("'{raw}' is not a number")))
    }
}

/// Load an observation file.
pub fn load_observations(path: &Path, schema: &ObservationSchema) -> Result<LoadedData, LoadError> {
    let mut reader = open(path, schema.delimiter)?;
    let header = headers(&mut reader, path)?;
    let period_idx = column_index(&header, &schema.period_column, path)?;
    let price_idx = column_index(&header, &schema.price_column, path)?;
    let field_idx = schema
        .fields
        .iter()
        .map(|f| column_index(&header, f, path).map(|i| (f.as_str(), i)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut observations = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let cells = CellReader {
            path,
            row: i + 1,
            record: &record,
        };
        let period = cells.period(period_idx, &schema.period_column)?;
        let price = cells.number(price_idx, &schema.price_column)?;
        let mut obs = Observation::new(period, price);
        for &(name, idx) in &field_idx {
            obs = obs.with_field(name, cells.number(idx, name)?);
        }
        observations.push(obs);
    }

    if observations.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    let dataset_hash = dataset_hash(&observations);
    Ok(LoadedData {
        observations,
        dataset_hash,
    })
}

/// Load an allocation file.
pub fn load_allocations(
    path: &Path,
    schema: &AllocationSchema,
) -> Result<Vec<AllocationDecision>, LoadError> {
    let mut reader = open(path, schema.delimiter)?;
    let header = headers(&mut reader, path)?;
    let period_idx = column_index(&header, &schema.period_column, path)?;
    let weight_idx = column_index(&header, &schema.weight_column, path)?;

    let mut allocations = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let cells = CellReader {
            path,
            row: i + 1,
            record: &record,
        };
        let period = cells.period(period_idx, &schema.period_column)?;
        let weight = cells.number(weight_idx, &schema.weight_column)?;
        allocations.push(AllocationDecision::new(period, weight));
    }

    if allocations.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(allocations)
}
