//! Listing draft rules.

mod validation;

pub use validation::{ValidationError, ValidationResult, normalize, validate_listing};
