//! Filter for implausibly old release years.
//!
//! Catalog rows with a year at or before 1900 are placeholders or
//! data-entry errors, not films anyone should be recommended.

use crate::error::Result;
use crate::traits::Filter;
use sources::CandidateMovie;

/// Keeps candidates released strictly after `min_year`.
pub struct RecencyFilter {
    min_year: f64,
}

impl RecencyFilter {
    pub fn new(min_year: f64) -> Self {
        Self { min_year }
    }
}

impl Default for RecencyFilter {
    fn default() -> Self {
        Self::new(1900.0)
    }
}

impl Filter for RecencyFilter {
    fn name(&self) -> &str {
        "RecencyFilter"
    }

    fn apply(&self, candidates: Vec<CandidateMovie>) -> Result<Vec<CandidateMovie>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| candidate.release_year > self.min_year)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recency_filter() {
        let candidates = vec![
            CandidateMovie::new("tt1", 1900.0, 100.0, "Drama", 8.0, 5000.0),
            CandidateMovie::new("tt2", 1901.0, 100.0, "Drama", 8.0, 5000.0),
            CandidateMovie::new("tt3", 1895.0, 100.0, "Drama", 8.0, 5000.0),
        ];

        let filtered = RecencyFilter::default().apply(candidates).unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].external_id.as_deref(), Some("tt2"));
    }
}
