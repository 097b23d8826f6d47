//! Domain types for AllocLab

pub mod allocation;
pub mod observation;
pub mod period;
pub mod result;

pub use allocation::AllocationDecision;
pub use observation::Observation;
pub use period::{Period, PeriodParseError};
pub use result::PeriodResult;
