//! # Recommendation Pipeline
//!
//! This module runs one batch of the regional recommendation feed:
//! 1. Assemble the training dataset from the warehouse tables
//! 2. Abort if no training row survived the joins
//! 3. Train the rating model (CPU-bound, on the blocking pool)
//! 4. Prepare candidates from the external catalog
//! 5. Score every candidate for every region and keep the top-K
//! 6. Replace the output in every sink
//!
//! Any failure aborts the run; there is no partial output mode.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use data_loader::TableSource;
use ml_model::Regressor;
use pipeline::{
    CANDIDATE_LIMIT, ModelTrainer, PipelineError, Prediction, TOP_K_PER_REGION, TrainingDataset,
    TrainingSources, build_training_dataset, generate_predictions, prepare_candidates,
};
use sources::{CATALOG_TABLE, CandidateMovie};

use crate::config::WAREHOUSE_SCHEMA;
use crate::sink::PredictionSink;

/// Knobs for one run
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Schema qualifying the four training tables
    pub warehouse_schema: String,
    /// Logical name of the catalog table in the catalog source
    pub catalog_table: String,
    pub top_k: usize,
    pub candidate_limit: usize,
    /// Date stamped on every prediction
    pub reference_date: NaiveDate,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            warehouse_schema: WAREHOUSE_SCHEMA.to_string(),
            catalog_table: CATALOG_TABLE.to_string(),
            top_k: TOP_K_PER_REGION,
            candidate_limit: CANDIDATE_LIMIT,
            reference_date: chrono::Local::now().date_naive(),
        }
    }
}

/// Counts gathered during a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub training_rows: usize,
    pub regions: usize,
    pub candidates: usize,
    pub predictions: usize,
}

/// Wires sources, trainer and sinks together.
///
/// Every collaborator is passed in explicitly, so tests can substitute
/// in-memory sources, stub trainers and recording sinks.
#[derive(Clone)]
pub struct RecommendationPipeline {
    training_source: Arc<dyn TableSource>,
    catalog_source: Arc<dyn TableSource>,
    trainer: Arc<dyn ModelTrainer>,
    sinks: Vec<Arc<dyn PredictionSink>>,
    settings: RunSettings,
}

impl RecommendationPipeline {
    pub fn new(
        training_source: Arc<dyn TableSource>,
        catalog_source: Arc<dyn TableSource>,
        trainer: Arc<dyn ModelTrainer>,
    ) -> Self {
        Self {
            training_source,
            catalog_source,
            trainer,
            sinks: Vec::new(),
            settings: RunSettings::default(),
        }
    }

    /// Add a destination (builder pattern)
    pub fn with_sink(mut self, sink: Arc<dyn PredictionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_settings(mut self, settings: RunSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run every stage and persist the result
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let (summary, predictions) = self.rank().await?;

        self.persist(&predictions).await?;

        info!(
            training_rows = summary.training_rows,
            regions = summary.regions,
            candidates = summary.candidates,
            predictions = summary.predictions,
            "Pipeline finished in {:.2?}",
            start_time.elapsed()
        );
        Ok(summary)
    }

    /// Every stage except persistence
    pub async fn rank(&self) -> Result<(RunSummary, Vec<Prediction>)> {
        let dataset = self.training_dataset().await?;
        if dataset.is_empty() {
            return Err(PipelineError::DataIntegrity(
                "training dataset is empty after joins and filtering".to_string(),
            ))
            .context("Cannot train without data");
        }
        info!(
            rows = dataset.rows.len(),
            regions = dataset.regions.len(),
            "Built training dataset"
        );

        let model = {
            let trainer = Arc::clone(&self.trainer);
            let rows = dataset.rows.clone();
            tokio::task::spawn_blocking(move || trainer.train(&rows))
                .await
                .context("Training task panicked")?
                .with_context(|| format!("Failed to train model with {}", self.trainer.name()))?
        };
        info!(model = model.name(), "Trained model");

        let candidates = self.candidates().await?;
        if candidates.is_empty() {
            warn!("No catalog title passed the quality filters; output will be empty");
        }

        let predictions = generate_predictions(
            model.as_ref(),
            &candidates,
            &dataset.regions,
            self.settings.top_k,
            self.settings.reference_date,
        )
        .with_context(|| {
            format!(
                "Failed to rank {} candidates across {} regions",
                candidates.len(),
                dataset.regions.len()
            )
        })?;

        let summary = RunSummary {
            training_rows: dataset.rows.len(),
            regions: dataset.regions.len(),
            candidates: candidates.len(),
            predictions: predictions.len(),
        };
        Ok((summary, predictions))
    }

    /// Load and assemble the training tables
    pub async fn training_dataset(&self) -> Result<TrainingDataset> {
        let sources =
            TrainingSources::load(self.training_source.as_ref(), &self.settings.warehouse_schema)
                .await
                .context("Failed to read training tables")?;

        build_training_dataset(sources).context("Failed to assemble training dataset")
    }

    /// Load the catalog and select the candidates to score
    pub async fn candidates(&self) -> Result<Vec<CandidateMovie>> {
        let catalog = self
            .catalog_source
            .read_table(&self.settings.catalog_table)
            .await
            .with_context(|| format!("Failed to read catalog from {}", self.catalog_source.describe()))?;

        prepare_candidates(catalog, self.settings.candidate_limit)
            .context("Failed to prepare candidates")
    }

    /// Write the same rows to every sink, stopping at the first failure
    async fn persist(&self, predictions: &[Prediction]) -> Result<()> {
        if self.sinks.is_empty() {
            warn!("No sink configured; predictions are not persisted");
        }
        for sink in &self.sinks {
            sink.write(predictions)
                .await
                .with_context(|| format!("Failed to write predictions to {}", sink.describe()))?;
            info!(sink = %sink.describe(), rows = predictions.len(), "Persisted predictions");
        }
        Ok(())
    }
}
