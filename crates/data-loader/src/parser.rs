//! Readers that turn files into [`Table`]s, plus the cell-level coercion
//! rules every other crate relies on.
//!
//! Two formats are supported:
//! - CSV with a header row (the warehouse mirror under `data/CSVs/`)
//! - Parquet (catalog snapshots)
//!
//! Empty or whitespace-only cells become nulls at read time.

use crate::error::{DataLoadError, Result};
use crate::types::{Cell, Table};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use std::fs::File;
use std::path::Path;

/// Trims a raw cell; empty strings become null
pub fn clean_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a cell as a number. Anything that is not a finite `f64` is null.
///
/// Example: "1995" -> Some(1995.0)
///          "1995.0" -> Some(1995.0)
///          "\\N" -> None
///          "inf" -> None
pub fn coerce_numeric(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads a file, choosing the parser from its extension
pub fn read_table_file(path: &Path, table_name: &str) -> Result<Table> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") | Some("pq") => read_parquet(path, table_name),
        Some("csv") => read_csv(path, table_name),
        _ => Err(DataLoadError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

/// Parse a CSV file with a header row
pub fn read_csv(path: &Path, table_name: &str) -> Result<Table> {
    let file_label = path.display().to_string();
    let csv_err = |source: csv::Error| DataLoadError::CsvError {
        file: file_label.clone(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_err)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new(table_name, columns);
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        table.push_row(record.iter().map(clean_cell).collect())?;
    }

    tracing::debug!(table = table_name, rows = table.len(), "read csv {}", file_label);
    Ok(table)
}

/// Parse a flat Parquet file
///
/// Nested columns are rendered with their display form; the catalog
/// snapshots we read are flat.
pub fn read_parquet(path: &Path, table_name: &str) -> Result<Table> {
    let file_label = path.display().to_string();
    let parquet_err = |source: parquet::errors::ParquetError| DataLoadError::ParquetError {
        file: file_label.clone(),
        source,
    };

    let file = File::open(path)?;
    let reader = SerializedFileReader::new(file).map_err(parquet_err)?;

    let columns: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();

    let mut table = Table::new(table_name, columns);
    for row in reader.get_row_iter(None).map_err(parquet_err)? {
        let row = row.map_err(parquet_err)?;
        let cells = row
            .get_column_iter()
            .map(|(_, field)| field_to_cell(field))
            .collect();
        table.push_row(cells)?;
    }

    tracing::debug!(table = table_name, rows = table.len(), "read parquet {}", file_label);
    Ok(table)
}

/// Render a Parquet field as a cell
fn field_to_cell(field: &Field) -> Cell {
    match field {
        Field::Null => None,
        Field::Str(s) => clean_cell(s),
        Field::Bool(v) => Some(v.to_string()),
        Field::Byte(v) => Some(v.to_string()),
        Field::Short(v) => Some(v.to_string()),
        Field::Int(v) => Some(v.to_string()),
        Field::Long(v) => Some(v.to_string()),
        Field::UByte(v) => Some(v.to_string()),
        Field::UShort(v) => Some(v.to_string()),
        Field::UInt(v) => Some(v.to_string()),
        Field::ULong(v) => Some(v.to_string()),
        Field::Float(v) => Some(v.to_string()),
        Field::Double(v) => Some(v.to_string()),
        other => clean_cell(&other.to_string()),
    }
}
