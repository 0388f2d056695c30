//! Rating model: tabular regression over movie attributes and region.
//!
//! This crate provides the in-process scoring model used by the
//! recommendation pipeline. It handles:
//! - The four-feature input contract ([`FeatureRow`])
//! - Preprocessing into an `ndarray` design matrix (linfa standard scaling
//!   + one-hot encoding)
//! - A smartcore random forest over that matrix
//! - The [`Regressor`] trait that the ranker calls, so any scoring strategy
//!   (forest, linear model, test stub) can be plugged in

use thiserror::Error;

pub mod forest;
pub mod model;
pub mod preprocess;

pub use forest::{ForestParams, RandomForest};
pub use model::RatingModel;
pub use preprocess::{FeatureEncoder, OneHotEncoder, numeric_matrix};

/// Errors that can occur while fitting or applying a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("Got {features} feature rows but {targets} targets")]
    LengthMismatch { features: usize, targets: usize },

    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(String),

    #[error("Preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Prediction failed: {0}")]
    PredictionError(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// One input row for the rating model.
///
/// Exactly four features: two numeric, two categorical.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub release_year: f64,
    pub duration_minutes: f64,
    pub genre: String,
    pub region: String,
}

impl FeatureRow {
    pub fn new(
        release_year: f64,
        duration_minutes: f64,
        genre: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            release_year,
            duration_minutes,
            genre: genre.into(),
            region: region.into(),
        }
    }
}

/// Anything that scores feature rows.
///
/// Scores are returned in input order, one per row. Implementations are not
/// required to stay inside the rating scale; callers clip.
pub trait Regressor: Send + Sync {
    /// Returns the name of this model (for logging)
    fn name(&self) -> &str;

    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>>;
}

impl<R: Regressor + ?Sized> Regressor for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>> {
        (**self).predict(rows)
    }
}
