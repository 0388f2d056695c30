//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::error::Result;
use crate::traits::Filter;
use sources::CandidateMovie;
use tracing;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(RuntimeFilter::default())
///     .add_filter(RecencyFilter::default())
///     .add_filter(MinimumRatingFilter::new(6.0, 1000.0));
///
/// let filtered = pipeline.apply(candidates)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Number of filters in the pipeline
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence to the candidates.
    ///
    /// ## Algorithm
    /// 1. Start with the input candidates
    /// 2. For each filter in order:
    ///    a. Log filter name and input count
    ///    b. Apply the filter
    ///    c. Log output count
    /// 3. Return final filtered set
    pub fn apply(&self, candidates: Vec<CandidateMovie>) -> Result<Vec<CandidateMovie>> {
        let mut current = candidates;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter.apply(current)?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{MinimumRatingFilter, RuntimeFilter};

    fn candidates() -> Vec<CandidateMovie> {
        vec![
            CandidateMovie::new("tt1", 2000.0, 120.0, "Drama", 8.0, 5000.0),
            CandidateMovie::new("tt2", 2000.0, 0.0, "Drama", 8.0, 5000.0),
            CandidateMovie::new("tt3", 2000.0, 95.0, "Comedy", 5.5, 5000.0),
        ]
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        assert!(pipeline.is_empty());

        let filtered = pipeline.apply(candidates()).unwrap();
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_single_filter() {
        let pipeline = FilterPipeline::new().add_filter(RuntimeFilter::default());

        let filtered = pipeline.apply(candidates()).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].external_id.as_deref(), Some("tt1"));
        assert_eq!(filtered[1].external_id.as_deref(), Some("tt3"));
    }

    #[test]
    fn test_filters_compose_in_order() {
        let pipeline = FilterPipeline::new()
            .add_filter(RuntimeFilter::default())
            .add_filter(MinimumRatingFilter::default());
        assert_eq!(pipeline.len(), 2);

        let filtered = pipeline.apply(candidates()).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].external_id.as_deref(), Some("tt1"));
    }
}
