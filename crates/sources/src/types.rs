//! Candidate types produced from the external movie catalog.

use serde::{Deserialize, Serialize};

/// Genre used when the catalog has no genre for a title
pub const UNKNOWN_GENRE: &str = "unknown";

/// A movie from the external catalog, cleaned and ready to be scored.
///
/// The catalog has its own id namespace (`tt0111161`-style ids), unrelated
/// to the warehouse's movie keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMovie {
    pub external_id: Option<String>,
    pub name: Option<String>,
    pub release_year: f64,
    pub duration_minutes: f64,
    /// First genre of the catalog's comma-separated list
    pub primary_genre: String,
    /// Catalog average rating (0-10 scale)
    pub external_rating: f64,
    /// Number of votes behind `external_rating`
    pub external_rating_count: f64,
}

impl CandidateMovie {
    /// Create a candidate with the fields the filters look at. Name and
    /// id default to the given id.
    pub fn new(
        external_id: impl Into<String>,
        release_year: f64,
        duration_minutes: f64,
        primary_genre: impl Into<String>,
        external_rating: f64,
        external_rating_count: f64,
    ) -> Self {
        let external_id = external_id.into();
        Self {
            name: Some(external_id.clone()),
            external_id: Some(external_id),
            release_year,
            duration_minutes,
            primary_genre: primary_genre.into(),
            external_rating,
            external_rating_count,
        }
    }

    /// Builder-style name override
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
