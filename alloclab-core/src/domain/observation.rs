//! Observation: one row of the market dataset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Period;

/// Price plus named macro fields for a single period.
///
/// Macro fields live in a `BTreeMap` so iteration (and therefore hashing)
/// order is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub period: Period,
    pub price: f64,
    #[serde(default)]
    pub macro_fields: BTreeMap<String, f64>,
}

impl Observation {
    pub fn new(period: Period, price: f64) -> Self {
        Self {
            period,
            price,
            macro_fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter for a macro field.
    pub fn with_field(mut self, name: impl Into<String>, value: f64) -> Self {
        self.macro_fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<f64> {
        self.macro_fields.get(name).copied()
    }
}
