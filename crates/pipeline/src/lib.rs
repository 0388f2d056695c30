//! Training and ranking pipeline for regional movie recommendations.
//!
//! This crate provides:
//! - Dataset assembly: ratings + movies + per-user region
//! - Candidate preparation: Filter trait, FilterPipeline and quality filters
//! - Model training behind the ModelTrainer trait
//! - Scoring and top-K ranking per region
//!
//! ## Architecture
//! The pipeline runs in stages:
//! 1. The assembler joins the warehouse tables into training rows
//! 2. A trainer fits a Regressor on those rows
//! 3. Filters reduce the catalog to a bounded, quality-ordered candidate list
//! 4. The predictor scores every (candidate, region) pair and keeps the best
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::*;
//!
//! let dataset = build_training_dataset(TrainingSources::load(&source, "dw_alv").await?)?;
//! let model = ForestTrainer::default().train(&dataset.rows)?;
//! let candidates = prepare_candidates(catalog, CANDIDATE_LIMIT)?;
//! let predictions = generate_predictions(
//!     model.as_ref(),
//!     &candidates,
//!     &dataset.regions,
//!     TOP_K_PER_REGION,
//!     today,
//! )?;
//! ```

pub mod assembler;
pub mod candidates;
pub mod error;
pub mod features;
pub mod filter_pipeline;
pub mod filters;
pub mod predictor;
pub mod traits;
pub mod training;

/// Recommendations kept per region
pub const TOP_K_PER_REGION: usize = 25;

/// Catalog titles scored per run
pub const CANDIDATE_LIMIT: usize = 400;

// Re-export main types
pub use assembler::{
    TrainingDataset, TrainingRow, TrainingSources, build_training_dataset, most_frequent_region,
    resolve_user_regions,
};
pub use candidates::{prepare_candidates, quality_filters, select_candidates};
pub use error::{PipelineError, Result};
pub use features::{candidate_features, training_matrix};
pub use filter_pipeline::FilterPipeline;
pub use predictor::{
    MAX_SCORE, MIN_SCORE, OUTPUT_COLUMNS, Prediction, clip_score, generate_predictions,
};
pub use traits::{Filter, ModelTrainer};
pub use training::ForestTrainer;
