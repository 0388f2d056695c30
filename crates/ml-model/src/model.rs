//! The fitted rating model: preprocessing followed by a random forest.

use crate::forest::{ForestParams, RandomForest};
use crate::preprocess::FeatureEncoder;
use crate::{FeatureRow, ModelError, Regressor, Result};
use linfa::DatasetBase;
use ndarray::Array1;
use tracing::info;

/// Column transformer + forest, fitted together so the encoder only ever
/// sees training data.
#[derive(Debug)]
pub struct RatingModel {
    encoder: FeatureEncoder,
    forest: RandomForest,
}

impl RatingModel {
    /// Fit on feature rows and their target ratings
    pub fn fit(features: &[FeatureRow], targets: &[f64], params: &ForestParams) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(ModelError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        let targets = Array1::from(targets.to_vec());
        let encoder = FeatureEncoder::fit(features, &targets)?;
        let dataset = DatasetBase::new(encoder.transform(features)?, targets);
        let forest = RandomForest::fit(&dataset, params)?;

        info!(
            rows = features.len(),
            encoded_width = encoder.width(),
            trees = forest.n_trees(),
            "Trained rating model"
        );
        Ok(Self { encoder, forest })
    }
}

impl Regressor for RatingModel {
    fn name(&self) -> &str {
        "RandomForestRegressor"
    }

    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let encoded = self.encoder.transform(rows)?;
        Ok(self.forest.predict(&encoded)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_rows() -> (Vec<FeatureRow>, Vec<f64>) {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for i in 0..30 {
            // SP rates higher overall and loves dramas
            features.push(FeatureRow::new(1990.0 + i as f64, 100.0 + i as f64, "Drama", "SP"));
            targets.push(4.5);
            features.push(FeatureRow::new(1990.0 + i as f64, 100.0 + i as f64, "Action", "SP"));
            targets.push(3.0);
            features.push(FeatureRow::new(1990.0 + i as f64, 100.0 + i as f64, "Drama", "RJ"));
            targets.push(2.0);
            features.push(FeatureRow::new(1990.0 + i as f64, 100.0 + i as f64, "Action", "RJ"));
            targets.push(2.5);
        }
        (features, targets)
    }

    fn params() -> ForestParams {
        ForestParams {
            n_estimators: 25,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_model_learns_region_genre_interaction() {
        let (features, targets) = training_rows();
        let model = RatingModel::fit(&features, &targets, &params()).unwrap();

        let scores = model
            .predict(&[
                FeatureRow::new(2000.0, 110.0, "Drama", "SP"),
                FeatureRow::new(2000.0, 110.0, "Drama", "RJ"),
            ])
            .unwrap();
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn test_unseen_categories_still_score() {
        let (features, targets) = training_rows();
        let model = RatingModel::fit(&features, &targets, &params()).unwrap();

        let scores = model.predict(&[FeatureRow::new(2000.0, 110.0, "Western", "AM")]).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores[0].is_finite());
        assert!(model.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_fit_rejects_mismatched_lengths() {
        let (features, _) = training_rows();
        let err = RatingModel::fit(&features, &[1.0], &params()).unwrap_err();
        assert!(matches!(err, ModelError::LengthMismatch { .. }));
    }
}
