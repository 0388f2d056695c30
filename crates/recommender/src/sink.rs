//! Prediction sinks.
//!
//! Every run fully replaces the previous output. Two sinks are written per
//! run with the same rows:
//! - [`PostgresSink`]: `schema.table` in the warehouse, replaced inside one
//!   transaction
//! - [`ParquetSnapshotSink`]: a Parquet file for downstream consumers,
//!   written to a temporary sibling and renamed into place

use crate::identifier::is_valid_identifier;
use arrow_array::{ArrayRef, Date32Array, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{ArrowError, DataType, Field, Schema};
use async_trait::async_trait;
use chrono::Datelike;
use parquet::arrow::ArrowWriter;
use parquet::errors::ParquetError;
use pipeline::{OUTPUT_COLUMNS, Prediction};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

/// Rows per INSERT statement (11 bind parameters each)
const INSERT_BATCH_ROWS: usize = 1000;

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// SQL types of [`OUTPUT_COLUMNS`], same order
const OUTPUT_SQL_TYPES: [&str; 11] = [
    "BIGINT",
    "TEXT",
    "TEXT",
    "DOUBLE PRECISION",
    "DOUBLE PRECISION",
    "TEXT",
    "DOUBLE PRECISION",
    "DOUBLE PRECISION",
    "TEXT",
    "DOUBLE PRECISION",
    "DATE",
];

#[derive(Error, Debug)]
pub enum SinkError {
    /// Schema or table name outside the allow-list
    #[error("Invalid {kind} name '{value}': only letters, digits and underscore are allowed")]
    Validation { kind: &'static str, value: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink task failed: {0}")]
    Task(String),
}

/// Somewhere ranked predictions are persisted
#[async_trait]
pub trait PredictionSink: Send + Sync {
    /// Human-readable destination (for logs and error context)
    fn describe(&self) -> String;

    /// Replace the destination's contents with `predictions`
    async fn write(&self, predictions: &[Prediction]) -> Result<(), SinkError>;
}

/// Reject anything that is not a bare identifier
pub fn validate_identifier(kind: &'static str, value: &str) -> Result<(), SinkError> {
    if is_valid_identifier(value) {
        Ok(())
    } else {
        Err(SinkError::Validation {
            kind,
            value: value.to_string(),
        })
    }
}

/// `CREATE TABLE` statement for the output table
pub fn create_table_sql(qualified_table: &str) -> String {
    let columns: Vec<String> = OUTPUT_COLUMNS
        .iter()
        .zip(OUTPUT_SQL_TYPES)
        .map(|(name, sql_type)| format!("{name} {sql_type}"))
        .collect();
    format!("CREATE TABLE {qualified_table} ({})", columns.join(", "))
}

/// Replaces `schema.table` in Postgres
pub struct PostgresSink {
    pool: PgPool,
    schema: String,
    table: String,
}

impl PostgresSink {
    /// Fails with `Validation` before any connection is used
    pub fn new(pool: PgPool, schema: impl Into<String>, table: impl Into<String>) -> Result<Self, SinkError> {
        let schema = schema.into();
        let table = table.into();
        validate_identifier("schema", &schema)?;
        validate_identifier("table", &table)?;
        Ok(Self { pool, schema, table })
    }

    fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

#[async_trait]
impl PredictionSink for PostgresSink {
    fn describe(&self) -> String {
        format!("postgres table {}", self.qualified())
    }

    async fn write(&self, predictions: &[Prediction]) -> Result<(), SinkError> {
        let qualified = self.qualified();
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {qualified}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&create_table_sql(&qualified))
            .execute(&mut *tx)
            .await?;

        let insert_prefix = format!("INSERT INTO {qualified} ({}) ", OUTPUT_COLUMNS.join(", "));
        for chunk in predictions.chunks(INSERT_BATCH_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(insert_prefix.as_str());
            builder.push_values(chunk, |mut row, p| {
                row.push_bind(p.surrogate_key)
                    .push_bind(p.external_id.clone())
                    .push_bind(p.name.clone())
                    .push_bind(p.release_year)
                    .push_bind(p.duration_minutes)
                    .push_bind(p.primary_genre.clone())
                    .push_bind(p.external_rating)
                    .push_bind(p.external_rating_count)
                    .push_bind(p.region.clone())
                    .push_bind(p.predicted_score)
                    .push_bind(p.reference_date);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        info!(table = %qualified, rows = predictions.len(), "Replaced prediction table");
        Ok(())
    }
}

/// Arrow schema of the snapshot file
pub fn snapshot_schema() -> Schema {
    Schema::new(vec![
        Field::new("surrogate_key", DataType::Int64, false),
        Field::new("external_id", DataType::Utf8, true),
        Field::new("name", DataType::Utf8, true),
        Field::new("release_year", DataType::Float64, false),
        Field::new("duration_minutes", DataType::Float64, false),
        Field::new("primary_genre", DataType::Utf8, false),
        Field::new("external_rating", DataType::Float64, false),
        Field::new("external_rating_count", DataType::Float64, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("predicted_score", DataType::Float64, false),
        Field::new("reference_date", DataType::Date32, false),
    ])
}

/// Columnar form of the predictions
pub fn to_record_batch(predictions: &[Prediction]) -> Result<RecordBatch, SinkError> {
    let floats = |f: fn(&Prediction) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(predictions.iter().map(f)))
    };
    let strings = |f: fn(&Prediction) -> Option<&str>| -> ArrayRef {
        Arc::new(StringArray::from(predictions.iter().map(f).collect::<Vec<_>>()))
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(predictions.iter().map(|p| p.surrogate_key))),
        strings(|p| p.external_id.as_deref()),
        strings(|p| p.name.as_deref()),
        floats(|p| p.release_year),
        floats(|p| p.duration_minutes),
        strings(|p| Some(p.primary_genre.as_str())),
        floats(|p| p.external_rating),
        floats(|p| p.external_rating_count),
        strings(|p| Some(p.region.as_str())),
        floats(|p| p.predicted_score),
        Arc::new(Date32Array::from_iter_values(
            predictions
                .iter()
                .map(|p| p.reference_date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
        )),
    ];

    Ok(RecordBatch::try_new(Arc::new(snapshot_schema()), columns)?)
}

/// Write `batch` to `path`, replacing any existing file only once the new
/// one is complete
pub fn write_snapshot(path: &Path, batch: &RecordBatch) -> Result<(), SinkError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("parquet.tmp");

    let file = File::create(&tmp_path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Mirrors the predictions to a Parquet file
pub struct ParquetSnapshotSink {
    path: PathBuf,
}

impl ParquetSnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PredictionSink for ParquetSnapshotSink {
    fn describe(&self) -> String {
        format!("parquet snapshot {}", self.path.display())
    }

    async fn write(&self, predictions: &[Prediction]) -> Result<(), SinkError> {
        let batch = to_record_batch(predictions)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_snapshot(&path, &batch))
            .await
            .map_err(|e| SinkError::Task(e.to_string()))??;

        info!(path = %self.path.display(), rows = predictions.len(), "Wrote prediction snapshot");
        Ok(())
    }
}

/// Keeps the last written predictions in memory
#[derive(Default)]
pub struct MemorySink {
    written: Mutex<Option<Vec<Prediction>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows from the last write, `None` if nothing was written
    pub fn written(&self) -> Option<Vec<Prediction>> {
        self.written
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl PredictionSink for MemorySink {
    fn describe(&self) -> String {
        "in-memory sink".to_string()
    }

    async fn write(&self, predictions: &[Prediction]) -> Result<(), SinkError> {
        let mut guard = self
            .written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(predictions.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::Array;
    use chrono::NaiveDate;
    use data_loader::read_table_file;

    fn prediction(key: i64, region: &str, score: f64) -> Prediction {
        Prediction {
            surrogate_key: key,
            external_id: Some(format!("tt{key}")),
            name: None,
            release_year: 1999.0,
            duration_minutes: 136.0,
            primary_genre: "Action".to_string(),
            external_rating: 8.7,
            external_rating_count: 2_000_000.0,
            region: region.to_string(),
            predicted_score: score,
            reference_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("schema", "imdb_alv").is_ok());

        let err = validate_identifier("schema", "imdb;alv").unwrap_err();
        assert!(matches!(err, SinkError::Validation { kind: "schema", .. }));
    }

    #[test]
    fn test_create_table_sql_lists_output_columns_in_order() {
        let sql = create_table_sql("imdb_alv.model_infer");

        assert!(sql.starts_with("CREATE TABLE imdb_alv.model_infer (surrogate_key BIGINT, external_id TEXT"));
        assert!(sql.ends_with("predicted_score DOUBLE PRECISION, reference_date DATE)"));
    }

    #[test]
    fn test_snapshot_schema_matches_output_columns() {
        let schema = snapshot_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, OUTPUT_COLUMNS);
    }

    #[test]
    fn test_record_batch_dates_are_days_since_epoch() {
        let batch = to_record_batch(&[prediction(1, "SP", 4.2)]).unwrap();
        let dates = batch
            .column(10)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();

        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(dates.value(0) as i64, expected.num_days());
    }

    #[tokio::test]
    async fn test_parquet_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("imdb_model_infer.parquet");
        let sink = ParquetSnapshotSink::new(&path);

        let predictions = vec![prediction(1, "RJ", 4.5), prediction(2, "SP", 3.9)];
        sink.write(&predictions).await.unwrap();

        let table = read_table_file(&path, "model_infer").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), OUTPUT_COLUMNS);
        assert_eq!(table.value(1, 8), Some("SP"));
        assert!(!path.with_extension("parquet.tmp").exists());
    }

    #[tokio::test]
    async fn test_parquet_snapshot_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.parquet");
        let sink = ParquetSnapshotSink::new(&path);

        sink.write(&[prediction(1, "RJ", 4.5), prediction(2, "SP", 3.9)]).await.unwrap();
        sink.write(&[prediction(1, "AM", 2.0)]).await.unwrap();

        let table = read_table_file(&path, "model_infer").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, 8), Some("AM"));
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_last_write() {
        let sink = MemorySink::new();
        assert!(sink.written().is_none());

        sink.write(&[prediction(1, "RJ", 4.5)]).await.unwrap();
        sink.write(&[]).await.unwrap();

        assert_eq!(sink.written(), Some(vec![]));
    }
}
