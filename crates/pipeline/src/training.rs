//! Model training over the assembled dataset.

use crate::assembler::TrainingRow;
use crate::error::Result;
use crate::features::training_matrix;
use crate::traits::ModelTrainer;
use ml_model::{ForestParams, RatingModel, Regressor};
use tracing::info;

/// Trains the scaled + one-hot + random forest rating model
#[derive(Debug, Clone, Default)]
pub struct ForestTrainer {
    params: ForestParams,
}

impl ForestTrainer {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    /// Fit the concrete model
    pub fn fit(&self, rows: &[TrainingRow]) -> Result<RatingModel> {
        let (features, targets) = training_matrix(rows);
        info!(
            rows = rows.len(),
            trees = self.params.n_estimators,
            max_depth = self.params.max_depth,
            "Training rating model"
        );
        Ok(RatingModel::fit(&features, &targets, &self.params)?)
    }
}

impl ModelTrainer for ForestTrainer {
    fn name(&self) -> &str {
        "ForestTrainer"
    }

    fn train(&self, rows: &[TrainingRow]) -> Result<Box<dyn Regressor>> {
        Ok(Box::new(self.fit(rows)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use ml_model::{FeatureRow, ModelError};

    fn row(genre: &str, region: &str, rating: f64, year: f64) -> TrainingRow {
        TrainingRow {
            user_id: "1".to_string(),
            movie_id: "10".to_string(),
            rating_value: rating,
            release_year: year,
            duration_minutes: 100.0,
            genre: genre.to_string(),
            region: region.to_string(),
        }
    }

    fn small_trainer() -> ForestTrainer {
        ForestTrainer::new(ForestParams {
            n_estimators: 20,
            ..ForestParams::default()
        })
    }

    #[test]
    fn test_trained_model_learns_regional_taste() {
        let mut rows = Vec::new();
        for i in 0..40 {
            let year = 1980.0 + i as f64;
            rows.push(row("Drama", "SP", 4.8, year));
            rows.push(row("Drama", "RJ", 1.5, year));
        }

        let model = small_trainer().train(&rows).unwrap();
        let scores = model
            .predict(&[
                FeatureRow::new(2000.0, 100.0, "Drama", "SP"),
                FeatureRow::new(2000.0, 100.0, "Drama", "RJ"),
            ])
            .unwrap();

        assert!(scores[0] > scores[1]);
        assert!(scores[0] > 4.0);
        assert!(scores[1] < 2.5);
    }

    #[test]
    fn test_unseen_category_does_not_fail() {
        let rows: Vec<_> = (0..20).map(|i| row("Drama", "SP", 3.0, 1990.0 + i as f64)).collect();
        let model = small_trainer().train(&rows).unwrap();

        let scores = model
            .predict(&[FeatureRow::new(2000.0, 100.0, "Western", "AC")])
            .unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores[0].is_finite());
    }

    #[test]
    fn test_empty_training_set() {
        let err = small_trainer().train(&[]).err().expect("training on an empty set should fail");
        assert!(matches!(err, PipelineError::Model(ModelError::EmptyTrainingSet)));
    }
}
