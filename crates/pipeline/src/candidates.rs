//! Candidate preparation.
//!
//! Turns the external catalog snapshot into the bounded, quality-ordered
//! list of movies that will be scored for every region:
//! 1. Parse the catalog (rename, coerce, derive primary genre)
//! 2. Run the quality filters
//! 3. Sort by catalog rating, then vote count, both descending
//! 4. Keep the first `limit`

use crate::error::Result;
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{MinimumRatingFilter, RecencyFilter, RuntimeFilter};
use data_loader::Table;
use sources::{CandidateMovie, parse_catalog};
use std::cmp::Ordering;
use tracing::info;

/// Filters a catalog title must pass to be recommended
pub fn quality_filters() -> FilterPipeline {
    FilterPipeline::new()
        .add_filter(RuntimeFilter)
        .add_filter(RecencyFilter::default())
        .add_filter(MinimumRatingFilter::default())
}

/// Prepare up to `limit` candidates from a raw catalog table.
///
/// An empty result is not an error here; it simply yields no predictions.
pub fn prepare_candidates(catalog: Table, limit: usize) -> Result<Vec<CandidateMovie>> {
    let parsed = parse_catalog(catalog)?;
    let parsed_count = parsed.len();

    let selected = select_candidates(parsed, limit)?;
    info!(
        parsed = parsed_count,
        selected = selected.len(),
        limit,
        "Prepared candidates"
    );
    Ok(selected)
}

/// Filter, order and truncate already-parsed candidates
pub fn select_candidates(candidates: Vec<CandidateMovie>, limit: usize) -> Result<Vec<CandidateMovie>> {
    let mut eligible = quality_filters().apply(candidates)?;

    // stable: equal (rating, votes) keep catalog order
    eligible.sort_by(by_quality_desc);
    eligible.truncate(limit);
    Ok(eligible)
}

fn by_quality_desc(a: &CandidateMovie, b: &CandidateMovie) -> Ordering {
    b.external_rating
        .total_cmp(&a.external_rating)
        .then_with(|| b.external_rating_count.total_cmp(&a.external_rating_count))
}
