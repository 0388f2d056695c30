//! Filter to ensure minimum quality threshold.
//!
//! Removes catalog titles with a low average rating or too few votes,
//! so only well-established titles are recommended.

use crate::error::Result;
use crate::traits::Filter;
use sources::CandidateMovie;

/// Lowest catalog rating a candidate may have (0-10 scale)
pub const DEFAULT_MIN_RATING: f64 = 6.0;

/// Fewest catalog votes a candidate may have
pub const DEFAULT_MIN_VOTES: f64 = 1000.0;

/// Removes candidates below quality thresholds.
///
/// ## Algorithm
/// For each candidate:
/// 1. Check if external_rating >= min_rating
/// 2. Check if external_rating_count >= min_count
/// 3. Keep only if both conditions met
pub struct MinimumRatingFilter {
    min_rating: f64,
    min_count: f64,
}

impl MinimumRatingFilter {
    /// Create a new MinimumRatingFilter.
    ///
    /// # Arguments
    /// * `min_rating` - Minimum catalog rating (typically 6.0)
    /// * `min_count` - Minimum number of votes (typically 1000)
    pub fn new(min_rating: f64, min_count: f64) -> Self {
        Self {
            min_rating,
            min_count,
        }
    }
}

impl Default for MinimumRatingFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RATING, DEFAULT_MIN_VOTES)
    }
}

impl Filter for MinimumRatingFilter {
    fn name(&self) -> &str {
        "MinimumRatingFilter"
    }

    fn apply(&self, candidates: Vec<CandidateMovie>) -> Result<Vec<CandidateMovie>> {
        let filtered: Vec<CandidateMovie> = candidates
            .into_iter()
            .filter(|candidate| {
                candidate.external_rating >= self.min_rating
                    && candidate.external_rating_count >= self.min_count
            })
            .collect();

        Ok(filtered)
    }
}
