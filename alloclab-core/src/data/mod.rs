//! Input alignment and validation

pub mod align;
pub mod validate;

pub use align::check_alignment;
pub use validate::{return_price, validate_allocations, validate_observations};
