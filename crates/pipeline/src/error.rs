//! Error types for the pipeline crate.

use data_loader::DataLoadError;
use ml_model::ModelError;
use thiserror::Error;

/// Errors raised while assembling data, training or ranking
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The run is misconfigured (e.g. no region to recommend for)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Joined and filtered data is unusable (e.g. zero training rows)
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error(transparent)]
    DataLoad(#[from] DataLoadError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
