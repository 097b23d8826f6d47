//! Target weight decisions produced outside the engine.

use serde::{Deserialize, Serialize};

use super::Period;

/// Target weight for a period. Sign encodes direction: positive is long,
/// negative is short.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationDecision {
    pub period: Period,
    pub target_weight: f64,
}

impl AllocationDecision {
    pub fn new(period: Period, target_weight: f64) -> Self {
        Self {
            period,
            target_weight,
        }
    }
}
