//! Fingerprinting — deterministic identities for configurations and datasets.
//!
//! - `ConfigHash`: BLAKE3 over the canonical JSON of any serializable config.
//! - `DatasetHash`: BLAKE3 over periods, prices, and macro fields.
//!
//! Both are stable across runs and platforms, so an output file named after a
//! hash is overwritten by a rerun of the same configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{AllocationDecision, Observation, Period};
use crate::error::EngineError;

/// Length of the hash prefix used in file names.
pub const SHORT_HASH_LEN: usize = 12;

/// Identity of a strategy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    /// Hash the canonical JSON form of `config`.
    ///
    /// Struct fields serialize in declaration order and maps should be
    /// `BTreeMap`, so the JSON is deterministic.
    pub fn of<T: Serialize>(config: &T) -> Result<Self, EngineError> {
        let json = serde_json::to_string(config)
            .map_err(|e| EngineError::config(format!("config is not serializable: {e}")))?;
        Ok(Self(blake3::hash(json.as_bytes()).to_hex().to_string()))
    }

    pub fn short(&self) -> &str {
        &self.0[..SHORT_HASH_LEN.min(self.0.len())]
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of an input series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn short(&self) -> &str {
        &self.0[..SHORT_HASH_LEN.min(self.0.len())]
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn update_period(hasher: &mut blake3::Hasher, period: &Period) {
    hasher.update(period.date.to_string().as_bytes());
    hasher.update(&period.seq.to_le_bytes());
}

/// Hash an observation series. Macro fields are visited in name order.
pub fn dataset_hash(observations: &[Observation]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for obs in observations {
        update_period(&mut hasher, &obs.period);
        hasher.update(&obs.price.to_bits().to_le_bytes());
        for (name, value) in &obs.macro_fields {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.update(b"\n");
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}

/// Hash an allocation stream.
pub fn allocation_hash(allocations: &[AllocationDecision]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for alloc in allocations {
        update_period(&mut hasher, &alloc.period);
        hasher.update(&alloc.target_weight.to_bits().to_le_bytes());
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}
