//! Random forest regressor.
//!
//! A thin adapter over smartcore's bagged regression trees. Every tree sees
//! all encoded columns and the whole ensemble is driven by one seed, so two
//! fits on the same data give the same forest.

use crate::{ModelError, Result};
use linfa::DatasetBase;
use ndarray::{Array1, Array2};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::debug;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_depth: 12,
            min_samples_split: 10,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParams("n_estimators must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidParams("max_depth must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParams("min_samples_split must be at least 2".into()));
        }
        Ok(())
    }

    fn to_smartcore(self, n_features: usize) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters::default()
            .with_n_trees(self.n_estimators)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(1)
            .with_m(n_features)
            .with_seed(self.seed)
    }
}

/// A fitted forest
pub struct RandomForest {
    inner: Forest,
    n_trees: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fit on an encoded design matrix and its targets
    pub fn fit(dataset: &DatasetBase<Array2<f64>, Array1<f64>>, params: &ForestParams) -> Result<Self> {
        params.validate()?;
        let x = dataset.records();
        let y = dataset.targets();
        if x.nrows() != y.len() {
            return Err(ModelError::LengthMismatch {
                features: x.nrows(),
                targets: y.len(),
            });
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }

        let inner = Forest::fit(&dense(x), &y.to_vec(), params.to_smartcore(x.ncols()))
            .map_err(|e| ModelError::Training(e.to_string()))?;

        debug!(trees = params.n_estimators, rows = x.nrows(), columns = x.ncols(), "Fitted random forest");
        Ok(Self {
            inner,
            n_trees: params.n_estimators,
            n_features: x.ncols(),
        })
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Mean of the tree predictions, one per row of `x`
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(ModelError::PredictionError(format!(
                "expected {} columns, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        if x.nrows() == 0 {
            return Ok(Array1::zeros(0));
        }
        self.inner
            .predict(&dense(x))
            .map(Array1::from)
            .map_err(|e| ModelError::PredictionError(e.to_string()))
    }
}

impl std::fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomForest")
            .field("n_trees", &self.n_trees)
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

/// Row-major copy into smartcore's matrix type
fn dense(x: &Array2<f64>) -> DenseMatrix<f64> {
    DenseMatrix::new(x.nrows(), x.ncols(), x.iter().copied().collect(), false)
}
