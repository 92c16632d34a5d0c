//! Data hygiene predicates
//!
//! Both return `true` for pairs that should be kept. Rejected pairs are
//! dropped silently by the pipeline.

use super::Example;

/// Keep a pair only if neither slice contains a NaN
pub fn filter_nans(example: &Example) -> bool {
    !example.input.iter().chain(example.target.iter()).any(|v| v.is_nan())
}

/// Keep a pair only if both slices are non-degenerate and of equal shape
pub fn filter_incomplete(example: &Example) -> bool {
    !example.input.is_empty()
        && !example.target.is_empty()
        && example.input.dim() == example.target.dim()
}
