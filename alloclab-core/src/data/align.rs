//! Period alignment between the market dataset and the allocation stream.
//!
//! The two series must cover exactly the same period set, row for row.
//! Nothing is forward-filled or dropped: the first mismatch is an error.

use crate::domain::{AllocationDecision, Observation};
use crate::error::EngineError;

const MISSING: &str = "<missing>";

/// Verify that observations and allocations share an identical period sequence.
pub fn check_alignment(
    observations: &[Observation],
    allocations: &[AllocationDecision],
) -> Result<(), EngineError> {
    for (index, (obs, alloc)) in observations.iter().zip(allocations).enumerate() {
        if obs.period != alloc.period {
            return Err(EngineError::Alignment {
                index,
                observation: obs.period.to_string(),
                allocation: alloc.period.to_string(),
            });
        }
    }

    let common = observations.len().min(allocations.len());
    if observations.len() != allocations.len() {
        let observation = observations
            .get(common)
            .map(|o| o.period.to_string())
            .unwrap_or_else(|| MISSING.to_string());
        let allocation = allocations
            .get(common)
            .map(|a| a.period.to_string())
            .unwrap_or_else(|| MISSING.to_string());
        return Err(EngineError::Alignment {
            index: common,
            observation,
            allocation,
        });
    }

    Ok(())
}
