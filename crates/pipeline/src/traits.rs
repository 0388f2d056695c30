//! Core traits for the pipeline.
//!
//! - [`Filter`]: composable candidate filters applied by the FilterPipeline
//! - [`ModelTrainer`]: fits a scoring model on the assembled training set

use crate::assembler::TrainingRow;
use crate::error::Result;
use ml_model::Regressor;
use sources::CandidateMovie;

/// Core trait for filtering candidates.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be used in concurrent contexts
/// - Filters take ownership of the Vec<CandidateMovie> and return a filtered Vec
/// - Filters must preserve the relative order of the candidates they keep
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    fn apply(&self, candidates: Vec<CandidateMovie>) -> Result<Vec<CandidateMovie>>;
}

/// Fits a model that maps (movie attributes, region) to a rating.
///
/// The orchestrator only sees this trait, so the learning algorithm can be
/// swapped (or stubbed in tests) without touching control flow.
pub trait ModelTrainer: Send + Sync {
    fn name(&self) -> &str;

    fn train(&self, rows: &[TrainingRow]) -> Result<Box<dyn Regressor>>;
}
