//! Catalog Source - external movie metadata
//!
//! Turns a raw catalog snapshot into [`CandidateMovie`]s:
//! 1. Resolve columns through the rename table (raw export names or the
//!    upstream IMDb dataset names)
//! 2. Coerce year, runtime, rating and vote count to numbers
//! 3. Derive a single primary genre from the comma-separated genre list
//! 4. Drop rows where any of the four numeric fields is null
//!
//! Quality filtering, ordering and truncation happen later in the
//! `pipeline` crate, where the filters are composable.

use crate::types::{CandidateMovie, UNKNOWN_GENRE};
use data_loader::{Result, Table, clean_cell, coerce_numeric, normalize_columns};
use tracing::{debug, instrument};

/// Logical name of the catalog snapshot
pub const CATALOG_TABLE: &str = "imdb_movies";

// Canonical name first, then the raw export name, then the IMDb name.
const EXTERNAL_ID: &[&str] = &["external_id", "raw_id", "tconst"];
const NAME: &[&str] = &["name", "raw_name", "primarytitle"];
const RELEASE_YEAR: &[&str] = &["release_year", "raw_release_year", "startyear"];
const DURATION_MINUTES: &[&str] = &["duration_minutes", "raw_duration", "runtimeminutes"];
const GENRES: &[&str] = &["genre", "raw_genres", "genres"];
const RATING: &[&str] = &["external_rating", "raw_rating", "averagerating"];
const VOTE_COUNT: &[&str] = &["external_rating_count", "raw_vote_count", "numvotes"];

/// Column positions resolved once per table
struct CatalogColumns {
    external_id: usize,
    name: usize,
    release_year: usize,
    duration_minutes: usize,
    genres: usize,
    rating: usize,
    vote_count: usize,
}

impl CatalogColumns {
    fn resolve(table: &Table) -> Result<Self> {
        Ok(Self {
            external_id: table.find_column(EXTERNAL_ID)?,
            name: table.find_column(NAME)?,
            release_year: table.find_column(RELEASE_YEAR)?,
            duration_minutes: table.find_column(DURATION_MINUTES)?,
            genres: table.find_column(GENRES)?,
            rating: table.find_column(RATING)?,
            vote_count: table.find_column(VOTE_COUNT)?,
        })
    }
}

/// Pick the leading genre of a comma-separated list
///
/// Example: "Drama,Romance" -> "Drama"
///          ",Drama" -> ""
///          None -> "unknown"
pub fn primary_genre(raw: Option<&str>) -> String {
    raw.map(|genres| genres.split(',').next().unwrap_or_default().trim().to_string())
        .unwrap_or_else(|| UNKNOWN_GENRE.to_string())
}

/// Parse every usable catalog row, in catalog order
#[instrument(skip(table), fields(table = table.name(), rows = table.len()))]
pub fn parse_catalog(table: Table) -> Result<Vec<CandidateMovie>> {
    let table = normalize_columns(table);
    let cols = CatalogColumns::resolve(&table)?;

    let candidates: Vec<CandidateMovie> = (0..table.len())
        .filter_map(|row| {
            let number = |col| coerce_numeric(table.value(row, col));

            Some(CandidateMovie {
                external_id: table.value(row, cols.external_id).and_then(clean_cell),
                name: table.value(row, cols.name).and_then(clean_cell),
                release_year: number(cols.release_year)?,
                duration_minutes: number(cols.duration_minutes)?,
                primary_genre: primary_genre(table.value(row, cols.genres)),
                external_rating: number(cols.rating)?,
                external_rating_count: number(cols.vote_count)?,
            })
        })
        .collect();

    debug!(
        parsed = candidates.len(),
        dropped = table.len() - candidates.len(),
        "Parsed catalog rows"
    );
    Ok(candidates)
}
