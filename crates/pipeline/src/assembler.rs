//! Training dataset assembly.
//!
//! Joins ratings, movie metadata, revenue and addresses into one supervised
//! training set:
//! 1. Normalize the four source tables
//! 2. Resolve one region per user (most frequent region over their
//!    payments)
//! 3. Ratings LEFT JOIN movies on movie_id, then INNER JOIN user regions
//!    on user_id
//! 4. Coerce year, duration and rating to numbers
//! 5. Drop rows with any null feature or target
//! 6. Collect the sorted set of regions seen in the surviving rows

use crate::error::Result;
use data_loader::{
    AddressRecord, MovieMetadata, RatingRecord, RevenueRecord, SourceRecord, Table, TableSource,
    UserId, coerce_numeric, normalize_columns,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// One supervised example: a user's rating of a movie, plus the movie's
/// attributes and the user's region. Every field is present and numeric
/// fields are finite.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub user_id: UserId,
    pub movie_id: String,
    pub rating_value: f64,
    pub release_year: f64,
    pub duration_minutes: f64,
    pub genre: String,
    pub region: String,
}

/// Output of the assembler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingDataset {
    pub rows: Vec<TrainingRow>,
    /// Distinct regions in `rows`, sorted
    pub regions: Vec<String>,
}

impl TrainingDataset {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The four raw warehouse tables
#[derive(Debug, Clone)]
pub struct TrainingSources {
    pub ratings: Table,
    pub movies: Table,
    pub revenue: Table,
    pub addresses: Table,
}

impl TrainingSources {
    /// Read all four tables from `source`, qualified with `schema`
    /// (e.g. `dw_alv.avaliacao`).
    pub async fn load(source: &dyn TableSource, schema: &str) -> Result<Self> {
        let qualified = |table: &str| format!("{schema}.{table}");
        info!("Loading training tables from {}", source.describe());

        Ok(Self {
            ratings: source.read_table(&qualified(RatingRecord::TABLE)).await?,
            movies: source.read_table(&qualified(MovieMetadata::TABLE)).await?,
            revenue: source.read_table(&qualified(RevenueRecord::TABLE)).await?,
            addresses: source.read_table(&qualified(AddressRecord::TABLE)).await?,
        })
    }
}

/// Most frequent region in a user's payment history.
///
/// Frequency ties go to the lexicographically smallest region. If no mode
/// can be computed (empty input) the last observed value is used, which for
/// an empty slice is nothing.
pub fn most_frequent_region(observed: &[&str]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &region in observed {
        *counts.entry(region).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(region_a, count_a), (region_b, count_b)| {
            // higher count wins, then smaller name
            count_a.cmp(count_b).then_with(|| region_b.cmp(region_a))
        })
        .map(|(region, _)| region.to_string())
        .or_else(|| observed.last().map(|r| r.to_string()))
}

/// Resolve one region per user.
///
/// Revenue rows whose address is unknown or has no region are dropped
/// before grouping, so every user in the result has at least one observed
/// region.
pub fn resolve_user_regions(
    revenue: &[RevenueRecord],
    addresses: &[AddressRecord],
) -> BTreeMap<UserId, String> {
    let mut regions_by_address: HashMap<&str, Vec<&str>> = HashMap::new();
    for address in addresses {
        if let (Some(id), Some(region)) = (&address.address_id, &address.region) {
            regions_by_address.entry(id.as_str()).or_default().push(region.as_str());
        }
    }

    let mut observed: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for payment in revenue {
        let (Some(user_id), Some(address_id)) = (&payment.user_id, &payment.address_id) else {
            continue;
        };
        if let Some(regions) = regions_by_address.get(address_id.as_str()) {
            observed.entry(user_id.as_str()).or_default().extend(regions);
        }
    }

    observed
        .into_iter()
        .filter_map(|(user_id, regions)| {
            most_frequent_region(&regions).map(|region| (user_id.to_string(), region))
        })
        .collect()
}

/// Build the training set from the four source tables
#[instrument(skip_all)]
pub fn build_training_dataset(sources: TrainingSources) -> Result<TrainingDataset> {
    let ratings = RatingRecord::from_table(&normalize_columns(sources.ratings))?;
    let movies = MovieMetadata::from_table(&normalize_columns(sources.movies))?;
    let revenue = RevenueRecord::from_table(&normalize_columns(sources.revenue))?;
    let addresses = AddressRecord::from_table(&normalize_columns(sources.addresses))?;

    let user_regions = resolve_user_regions(&revenue, &addresses);
    debug!(users = user_regions.len(), "Resolved user regions");

    let mut movies_by_id: HashMap<&str, Vec<&MovieMetadata>> = HashMap::new();
    for movie in &movies {
        if let Some(id) = &movie.movie_id {
            movies_by_id.entry(id.as_str()).or_default().push(movie);
        }
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for rating in &ratings {
        let Some(user_id) = &rating.user_id else {
            continue;
        };
        // inner join: users without a region are not training material
        let Some(region) = user_regions.get(user_id) else {
            continue;
        };
        // left join: an unknown movie yields null attributes
        let matches = rating
            .movie_id
            .as_deref()
            .and_then(|id| movies_by_id.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if matches.is_empty() {
            dropped += 1;
            continue;
        }

        for movie in matches {
            match complete_row(rating, movie, user_id, region) {
                Some(row) => rows.push(row),
                None => dropped += 1,
            }
        }
    }

    let regions: Vec<String> = rows
        .iter()
        .map(|r| r.region.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    info!(
        ratings = ratings.len(),
        training_rows = rows.len(),
        dropped,
        regions = regions.len(),
        "Assembled training dataset"
    );
    Ok(TrainingDataset { rows, regions })
}

/// Coerce and validate one joined row; `None` if anything is missing
fn complete_row(
    rating: &RatingRecord,
    movie: &MovieMetadata,
    user_id: &str,
    region: &str,
) -> Option<TrainingRow> {
    Some(TrainingRow {
        user_id: user_id.to_string(),
        movie_id: movie.movie_id.clone()?,
        rating_value: coerce_numeric(rating.rating_value.as_deref())?,
        release_year: coerce_numeric(movie.release_year.as_deref())?,
        duration_minutes: coerce_numeric(movie.duration_minutes.as_deref())?,
        genre: movie.genre.clone()?,
        region: region.to_string(),
    })
}
