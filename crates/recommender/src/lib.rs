//! Recommender crate for the regional recommendation feed.
//!
//! This crate contains the run-level pieces around the pipeline: database
//! configuration, the Postgres warehouse source, the prediction sinks and
//! the orchestrator that sequences every stage.

pub mod config;
pub mod identifier;
pub mod orchestrator;
pub mod sink;
pub mod warehouse;

pub use config::{
    CATALOG_PATH, CSV_MIRROR_DIR, ConfigError, DatabaseConfig, OUTPUT_SCHEMA, OUTPUT_TABLE,
    SNAPSHOT_PATH, WAREHOUSE_SCHEMA,
};
pub use orchestrator::{RecommendationPipeline, RunSettings, RunSummary};
pub use sink::{
    MemorySink, ParquetSnapshotSink, PostgresSink, PredictionSink, SinkError, validate_identifier,
};
pub use warehouse::PostgresSource;
