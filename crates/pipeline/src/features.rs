//! Projection of training rows and candidates onto the model's four
//! features.

use crate::assembler::TrainingRow;
use ml_model::FeatureRow;
use sources::CandidateMovie;

impl TrainingRow {
    pub fn features(&self) -> FeatureRow {
        FeatureRow::new(
            self.release_year,
            self.duration_minutes,
            self.genre.as_str(),
            self.region.as_str(),
        )
    }
}

/// Split training rows into model inputs and target ratings
pub fn training_matrix(rows: &[TrainingRow]) -> (Vec<FeatureRow>, Vec<f64>) {
    rows.iter()
        .map(|row| (row.features(), row.rating_value))
        .unzip()
}

/// Candidates as seen from one region
pub fn candidate_features(candidates: &[CandidateMovie], region: &str) -> Vec<FeatureRow> {
    candidates
        .iter()
        .map(|candidate| {
            FeatureRow::new(
                candidate.release_year,
                candidate.duration_minutes,
                candidate.primary_genre.as_str(),
                region,
            )
        })
        .collect()
}
