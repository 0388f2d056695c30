//! Scoring and ranking.
//!
//! Cross-joins candidates with every region, scores each pair, clips the
//! score to the rating scale and keeps the top-K per region.
//!
//! ## Output order
//! Regions ascending, then score descending. Equal scores keep candidate
//! order (candidates arrive sorted by catalog quality), so a run is fully
//! deterministic for a given model.

use crate::error::{PipelineError, Result};
use crate::features::candidate_features;
use chrono::NaiveDate;
use ml_model::{ModelError, Regressor};
use serde::Serialize;
use sources::CandidateMovie;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 5.0;

/// Persisted column names, in order
pub const OUTPUT_COLUMNS: [&str; 11] = [
    "surrogate_key",
    "external_id",
    "name",
    "release_year",
    "duration_minutes",
    "primary_genre",
    "external_rating",
    "external_rating_count",
    "region",
    "predicted_score",
    "reference_date",
];

/// One ranked recommendation. Field order matches [`OUTPUT_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub surrogate_key: i64,
    pub external_id: Option<String>,
    pub name: Option<String>,
    pub release_year: f64,
    pub duration_minutes: f64,
    pub primary_genre: String,
    pub external_rating: f64,
    pub external_rating_count: f64,
    pub region: String,
    pub predicted_score: f64,
    pub reference_date: NaiveDate,
}

/// Clamp a raw model output into the rating scale. NaN maps to the floor.
pub fn clip_score(score: f64) -> f64 {
    if score.is_nan() {
        MIN_SCORE
    } else {
        score.clamp(MIN_SCORE, MAX_SCORE)
    }
}

/// Score every candidate for every region and keep the best `top_k` per
/// region.
///
/// Duplicate regions are scored once. Surrogate keys run 1..=N over the
/// returned rows.
///
/// # Errors
/// - `Configuration` if `regions` is empty
/// - `Model` if the model fails or returns the wrong number of scores
pub fn generate_predictions(
    model: &dyn Regressor,
    candidates: &[CandidateMovie],
    regions: &[String],
    top_k: usize,
    reference_date: NaiveDate,
) -> Result<Vec<Prediction>> {
    if regions.is_empty() {
        return Err(PipelineError::Configuration(
            "no regions to generate recommendations for".to_string(),
        ));
    }
    let regions: BTreeSet<&str> = regions.iter().map(String::as_str).collect();

    let per_region = top_k.min(candidates.len());
    let mut predictions = Vec::with_capacity(per_region * regions.len());

    for &region in &regions {
        let scores = model.predict(&candidate_features(candidates, region))?;
        if scores.len() != candidates.len() {
            return Err(ModelError::PredictionError(format!(
                "{} returned {} scores for {} candidates",
                model.name(),
                scores.len(),
                candidates.len()
            ))
            .into());
        }

        let mut scored: Vec<(&CandidateMovie, f64)> = candidates
            .iter()
            .zip(scores.into_iter().map(clip_score))
            .collect();
        // sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        debug!(region, kept = scored.len(), "Ranked region");

        for (candidate, score) in scored {
            let surrogate_key = predictions.len() as i64 + 1;
            predictions.push(Prediction {
                surrogate_key,
                external_id: candidate.external_id.clone(),
                name: candidate.name.clone(),
                release_year: candidate.release_year,
                duration_minutes: candidate.duration_minutes,
                primary_genre: candidate.primary_genre.clone(),
                external_rating: candidate.external_rating,
                external_rating_count: candidate.external_rating_count,
                region: region.to_string(),
                predicted_score: score,
                reference_date,
            });
        }
    }

    info!(
        model = model.name(),
        candidates = candidates.len(),
        regions = regions.len(),
        top_k,
        predictions = predictions.len(),
        "Generated predictions"
    );
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ml_model::FeatureRow;
    use proptest::prelude::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn regions(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    fn create_test_candidates() -> Vec<CandidateMovie> {
        vec![
            CandidateMovie::new("m1", 1994.0, 142.0, "Drama", 9.0, 5000.0).with_name("First"),
            CandidateMovie::new("m2", 2010.0, 95.0, "Comedy", 6.5, 1200.0).with_name("Second"),
        ]
    }

    /// Returns the same score for every row
    struct Constant(f64);

    impl Regressor for Constant {
        fn name(&self) -> &str {
            "Constant"
        }

        fn predict(&self, rows: &[FeatureRow]) -> ml_model::Result<Vec<f64>> {
            Ok(vec![self.0; rows.len()])
        }
    }

    /// North likes dramas, everyone else likes comedies
    struct RegionalTaste;

    impl Regressor for RegionalTaste {
        fn name(&self) -> &str {
            "RegionalTaste"
        }

        fn predict(&self, rows: &[FeatureRow]) -> ml_model::Result<Vec<f64>> {
            Ok(rows
                .iter()
                .map(|row| match (row.region.as_str(), row.genre.as_str()) {
                    ("North", "Drama") | ("South", "Comedy") => 4.5,
                    _ => 2.0,
                })
                .collect())
        }
    }

    /// Score derived from the release year, shifted per region
    struct ByYear;

    impl Regressor for ByYear {
        fn name(&self) -> &str {
            "ByYear"
        }

        fn predict(&self, rows: &[FeatureRow]) -> ml_model::Result<Vec<f64>> {
            Ok(rows
                .iter()
                .map(|row| row.release_year / 500.0 - row.region.len() as f64)
                .collect())
        }
    }

    struct Truncating;

    impl Regressor for Truncating {
        fn name(&self) -> &str {
            "Truncating"
        }

        fn predict(&self, _rows: &[FeatureRow]) -> ml_model::Result<Vec<f64>> {
            Ok(vec![3.0])
        }
    }

    #[test]
    fn test_clip_score() {
        assert_eq!(clip_score(10.0), 5.0);
        assert_eq!(clip_score(-2.0), 1.0);
        assert_eq!(clip_score(3.25), 3.25);
        assert_eq!(clip_score(f64::NAN), 1.0);
        assert_eq!(clip_score(f64::INFINITY), 5.0);
    }

    #[test]
    fn test_out_of_range_scores_are_clipped() {
        let high = generate_predictions(&Constant(10.0), &create_test_candidates(), &regions(&["SP"]), 25, date()).unwrap();
        assert!(high.iter().all(|p| p.predicted_score == 5.0));

        let low = generate_predictions(&Constant(-4.0), &create_test_candidates(), &regions(&["SP"]), 25, date()).unwrap();
        assert!(low.iter().all(|p| p.predicted_score == 1.0));
    }

    #[test]
    fn test_top_one_per_region() {
        let predictions = generate_predictions(
            &RegionalTaste,
            &create_test_candidates(),
            &regions(&["North", "South"]),
            1,
            date(),
        )
        .unwrap();

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].region, "North");
        assert_eq!(predictions[0].external_id.as_deref(), Some("m1"));
        assert_eq!(predictions[0].surrogate_key, 1);
        assert_eq!(predictions[1].region, "South");
        assert_eq!(predictions[1].external_id.as_deref(), Some("m2"));
        assert_eq!(predictions[1].surrogate_key, 2);
        assert!(predictions.iter().all(|p| p.reference_date == date()));
    }

    #[test]
    fn test_prediction_carries_candidate_fields() {
        let predictions = generate_predictions(&Constant(3.0), &create_test_candidates(), &regions(&["SP"]), 1, date()).unwrap();

        let p = &predictions[0];
        assert_eq!(p.name.as_deref(), Some("First"));
        assert_eq!(p.release_year, 1994.0);
        assert_eq!(p.duration_minutes, 142.0);
        assert_eq!(p.primary_genre, "Drama");
        assert_eq!(p.external_rating, 9.0);
        assert_eq!(p.external_rating_count, 5000.0);
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let predictions = generate_predictions(&Constant(3.0), &create_test_candidates(), &regions(&["SP"]), 2, date()).unwrap();

        let ids: Vec<_> = predictions.iter().filter_map(|p| p.external_id.as_deref()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_regions_are_sorted_and_deduplicated() {
        let predictions = generate_predictions(
            &Constant(3.0),
            &create_test_candidates(),
            &regions(&["SP", "AC", "SP"]),
            5,
            date(),
        )
        .unwrap();

        let seen: Vec<_> = predictions.iter().map(|p| p.region.as_str()).collect();
        assert_eq!(seen, vec!["AC", "AC", "SP", "SP"]);
    }

    #[test]
    fn test_empty_regions_is_configuration_error() {
        let err = generate_predictions(&Constant(3.0), &create_test_candidates(), &[], 25, date()).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_no_candidates_yields_no_predictions() {
        let predictions = generate_predictions(&Constant(3.0), &[], &regions(&["SP"]), 25, date()).unwrap();
        assert!(predictions.is_empty());
    }

    #[test]
    fn test_wrong_score_count_is_model_error() {
        let err = generate_predictions(&Truncating, &create_test_candidates(), &regions(&["SP"]), 25, date()).unwrap_err();
        assert!(matches!(err, PipelineError::Model(ModelError::PredictionError(_))));
    }

    fn arb_candidates() -> impl Strategy<Value = Vec<CandidateMovie>> {
        prop::collection::vec(1000.0..3500.0f64, 0..30).prop_map(|years| {
            years
                .into_iter()
                .enumerate()
                .map(|(i, year)| CandidateMovie::new(format!("tt{i}"), year, 100.0, "Drama", 7.0, 2000.0))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_ranked_output_invariants(
            candidates in arb_candidates(),
            region_names in prop::collection::btree_set("[A-Z]{1,3}", 1..6),
            top_k in 0usize..12,
        ) {
            let region_list: Vec<String> = region_names.iter().cloned().collect();
            let predictions = generate_predictions(&ByYear, &candidates, &region_list, top_k, date()).unwrap();

            let expected_per_region = top_k.min(candidates.len());
            prop_assert_eq!(predictions.len(), expected_per_region * region_list.len());

            for (i, p) in predictions.iter().enumerate() {
                prop_assert_eq!(p.surrogate_key, i as i64 + 1);
                prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&p.predicted_score));
            }
            for region in &region_list {
                let scores: Vec<f64> = predictions
                    .iter()
                    .filter(|p| &p.region == region)
                    .map(|p| p.predicted_score)
                    .collect();
                prop_assert_eq!(scores.len(), expected_per_region);
                prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
            }
        }
    }
}
