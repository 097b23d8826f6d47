//! Input validation — fail fast on anything the loop cannot replay.
//!
//! Checks period ordering, price sanity, and weight bounds. Every failure
//! names the offending period and field.

use crate::domain::{AllocationDecision, Observation, Period};
use crate::error::EngineError;

/// Periods must be strictly increasing (which also rules out duplicates).
fn check_order(prev: Option<Period>, current: Period) -> Result<(), EngineError> {
    match prev {
        Some(p) if current <= p => Err(EngineError::malformed(
            &current,
            "period",
            format!("does not follow {p}"),
        )),
        _ => Ok(()),
    }
}

/// Price used for return computation: the observation price, or the named
/// macro field when one is configured as a proxy.
pub fn return_price(observation: &Observation, return_field: Option<&str>) -> Result<f64, EngineError> {
    let (field, value) = match return_field {
        None => ("price", observation.price),
        Some(name) => match observation.field(name) {
            Some(v) => (name, v),
            None => {
                return Err(EngineError::malformed(
                    &observation.period,
                    name,
                    "field is missing",
                ))
            }
        },
    };
    if !value.is_finite() {
        return Err(EngineError::malformed(
            &observation.period,
            field,
            format!("{value} is not finite"),
        ));
    }
    if value <= 0.0 {
        return Err(EngineError::malformed(
            &observation.period,
            field,
            format!("{value} is not positive"),
        ));
    }
    Ok(value)
}

/// Validate ordering and price sanity for every observation.
pub fn validate_observations(
    observations: &[Observation],
    return_field: Option<&str>,
) -> Result<(), EngineError> {
    let mut prev = None;
    for obs in observations {
        check_order(prev, obs.period)?;
        return_price(obs, None)?;
        if return_field.is_some() {
            return_price(obs, return_field)?;
        }
        prev = Some(obs.period);
    }
    Ok(())
}

/// Validate ordering, finiteness, and the weight bound for every decision.
pub fn validate_allocations(
    allocations: &[AllocationDecision],
    max_abs_weight: f64,
) -> Result<(), EngineError> {
    let mut prev = None;
    for alloc in allocations {
        check_order(prev, alloc.period)?;
        let w = alloc.target_weight;
        if !w.is_finite() {
            return Err(EngineError::malformed(
                &alloc.period,
                "target_weight",
                format!("{w} is not finite"),
            ));
        }
        if w.abs() > max_abs_weight {
            return Err(EngineError::malformed(
                &alloc.period,
                "target_weight",
                format!("{w} outside [-{max_abs_weight}, {max_abs_weight}]"),
            ));
        }
        prev = Some(alloc.period);
    }
    Ok(())
}
