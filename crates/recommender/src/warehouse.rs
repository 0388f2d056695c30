//! Postgres-backed table source for the warehouse.
//!
//! Each table is read as one JSON object per row (`row_to_json`), with the
//! column order taken from `information_schema`. Values are rendered to
//! text cells the same way the file readers do, so downstream code does not
//! care where a table came from.

use crate::config::DatabaseConfig;
use crate::identifier::split_qualified;
use async_trait::async_trait;
use data_loader::{DataLoadError, Result, Table, TableSource, clean_cell, normalize_columns};
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::debug;

const SOURCE_NAME: &str = "postgres";
const DEFAULT_SCHEMA: &str = "public";

/// Reads whole tables from the warehouse over an explicitly owned pool
#[derive(Clone)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a small pool against the configured database
    pub async fn connect(config: &DatabaseConfig) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(config.connect_options())
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn column_names(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT column_name::text FROM information_schema.columns \
             WHERE table_schema = $1 AND table_name = $2 \
             ORDER BY ordinal_position",
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(source_error)
    }
}

#[async_trait]
impl TableSource for PostgresSource {
    fn describe(&self) -> String {
        "postgres warehouse".to_string()
    }

    async fn read_table(&self, name: &str) -> Result<Table> {
        let (schema, table) = split_qualified(name).ok_or_else(|| DataLoadError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            reason: format!("invalid table name '{name}'"),
        })?;
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);

        let columns = self.column_names(schema, table).await?;
        if columns.is_empty() {
            return Err(DataLoadError::TableNotFound {
                table: name.to_string(),
                location: self.describe(),
            });
        }

        let query = format!("SELECT row_to_json(t)::text FROM {schema}.{table} t");
        let rows: Vec<String> = sqlx::query_scalar(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(source_error)?;
        debug!(table = name, rows = rows.len(), "read warehouse table");

        table_from_json_rows(table, columns, &rows).map(normalize_columns)
    }
}

fn source_error(err: sqlx::Error) -> DataLoadError {
    DataLoadError::SourceError {
        source_name: SOURCE_NAME.to_string(),
        reason: err.to_string(),
    }
}

/// Build a table from `row_to_json` output, placing values by column name
pub fn table_from_json_rows(name: &str, columns: Vec<String>, rows: &[String]) -> Result<Table> {
    let mut table = Table::new(name, columns.clone());
    for (index, raw) in rows.iter().enumerate() {
        let object: Map<String, Value> =
            serde_json::from_str(raw).map_err(|e| DataLoadError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                reason: format!("row {index} of '{name}' is not a JSON object: {e}"),
            })?;
        let cells = columns
            .iter()
            .map(|column| object.get(column).and_then(json_to_cell))
            .collect();
        table.push_row(cells)?;
    }
    Ok(table)
}

fn json_to_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => clean_cell(s),
        other => Some(other.to_string()),
    }
}
