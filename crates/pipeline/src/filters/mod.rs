//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod minimum_rating;
pub mod recency;
pub mod runtime;

// Re-export for convenience
pub use minimum_rating::{DEFAULT_MIN_RATING, DEFAULT_MIN_VOTES, MinimumRatingFilter};
pub use recency::RecencyFilter;
pub use runtime::RuntimeFilter;
