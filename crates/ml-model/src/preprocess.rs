//! Feature preprocessing.
//!
//! Numeric features are standardized with linfa's linear scaler, categorical
//! features are one-hot encoded. All statistics come from the training rows
//! only; at inference time an unseen category encodes to an all-zero block
//! rather than failing.

use crate::{FeatureRow, ModelError, Result};
use linfa::DatasetBase;
use linfa::traits::{Fit, Transformer};
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2, Axis, concatenate};
use std::collections::BTreeSet;

/// Numeric block of the design matrix: `[release_year, duration_minutes]`
pub fn numeric_matrix(rows: &[FeatureRow]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), 2), |(i, j)| match j {
        0 => rows[i].release_year,
        _ => rows[i].duration_minutes,
    })
}

/// One-hot encoding for one categorical column
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    /// Sorted category vocabulary
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let categories: BTreeSet<&str> = values.into_iter().collect();
        Self {
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// One row per value. Unknown values encode to zeros.
    pub fn encode<'a>(&self, values: impl ExactSizeIterator<Item = &'a str>) -> Array2<f64> {
        let mut block = Array2::zeros((values.len(), self.width()));
        for (i, value) in values.enumerate() {
            if let Ok(pos) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
                block[(i, pos)] = 1.0;
            }
        }
        block
    }
}

/// The full column transformer: `[year, duration, genre one-hot.., region one-hot..]`
pub struct FeatureEncoder {
    scaler: LinearScaler<f64>,
    genre: OneHotEncoder,
    region: OneHotEncoder,
}

impl FeatureEncoder {
    /// Fit the scaler and both vocabularies on the training rows
    pub fn fit(rows: &[FeatureRow], targets: &Array1<f64>) -> Result<Self> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let numeric = DatasetBase::new(numeric_matrix(rows), targets.clone());
        let scaler = LinearScaler::standard()
            .fit(&numeric)
            .map_err(|e| ModelError::Preprocessing(e.to_string()))?;

        Ok(Self {
            scaler,
            genre: OneHotEncoder::fit(rows.iter().map(|r| r.genre.as_str())),
            region: OneHotEncoder::fit(rows.iter().map(|r| r.region.as_str())),
        })
    }

    /// Width of an encoded row
    pub fn width(&self) -> usize {
        2 + self.genre.width() + self.region.width()
    }

    pub fn transform(&self, rows: &[FeatureRow]) -> Result<Array2<f64>> {
        let numeric = self.scaler.transform(numeric_matrix(rows));
        let genre = self.genre.encode(rows.iter().map(|r| r.genre.as_str()));
        let region = self.region.encode(rows.iter().map(|r| r.region.as_str()));

        concatenate(Axis(1), &[numeric.view(), genre.view(), region.view()])
            .map_err(|e| ModelError::Preprocessing(e.to_string()))
    }
}

impl std::fmt::Debug for FeatureEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureEncoder")
            .field("genre", &self.genre)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn targets(n: usize) -> Array1<f64> {
        Array1::from_elem(n, 3.0)
    }

    #[test]
    fn test_one_hot_unknown_is_all_zero() {
        let encoder = OneHotEncoder::fit(["SP", "RJ", "SP"]);
        assert_eq!(encoder.categories(), ["RJ", "SP"]);

        let block = encoder.encode(["SP", "MG"].into_iter());
        assert_eq!(block, array![[0.0, 1.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_feature_encoder_layout() {
        let rows = vec![
            FeatureRow::new(2000.0, 100.0, "Drama", "SP"),
            FeatureRow::new(2010.0, 120.0, "Action", "RJ"),
        ];
        let encoder = FeatureEncoder::fit(&rows, &targets(2)).unwrap();
        assert_eq!(encoder.width(), 6);

        // midpoint of both numeric columns scales to zero
        let encoded = encoder
            .transform(&[FeatureRow::new(2005.0, 110.0, "Horror", "RJ")])
            .unwrap();
        assert_eq!(encoded.dim(), (1, 6));
        assert!(encoded[(0, 0)].abs() < 1e-9);
        assert!(encoded[(0, 1)].abs() < 1e-9);
        assert_eq!(encoded.row(0).slice(ndarray::s![2..]).to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_scaling_orders_numeric_values() {
        let rows: Vec<_> = (0..5).map(|i| FeatureRow::new(1990.0 + i as f64, 100.0, "Drama", "SP")).collect();
        let encoder = FeatureEncoder::fit(&rows, &targets(5)).unwrap();

        let encoded = encoder.transform(&rows).unwrap();
        let years = encoded.column(0);
        assert!(years.windows(2).into_iter().all(|w| w[0] < w[1]));
        assert!(years.sum().abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_stays_finite() {
        let rows = vec![FeatureRow::new(2000.0, 90.0, "Drama", "SP"); 3];
        let encoder = FeatureEncoder::fit(&rows, &targets(3)).unwrap();

        let encoded = encoder.transform(&[FeatureRow::new(2001.0, 95.0, "Drama", "SP")]).unwrap();
        assert!(encoded.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fit_on_empty_rows_fails() {
        assert!(matches!(
            FeatureEncoder::fit(&[], &Array1::zeros(0)),
            Err(ModelError::EmptyTrainingSet)
        ));
    }
}
