//! Filter for titles without a real runtime.

use crate::error::Result;
use crate::traits::Filter;
use sources::CandidateMovie;

/// Removes candidates whose runtime is zero or negative.
///
/// The catalog uses 0 for "unknown", which would otherwise be scaled as a
/// genuine (very short) film.
#[derive(Default)]
pub struct RuntimeFilter;

impl Filter for RuntimeFilter {
    fn name(&self) -> &str {
        "RuntimeFilter"
    }

    fn apply(&self, candidates: Vec<CandidateMovie>) -> Result<Vec<CandidateMovie>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| candidate.duration_minutes > 0.0)
            .collect())
    }
}
