//! Error types for the data-loader crate.
//!
//! Every failure that can happen while turning a file or a warehouse table
//! into a [`Table`](crate::Table) is represented here, so callers can decide
//! whether a problem is fatal (missing column) or just a bad row.

use thiserror::Error;

/// Errors that can occur while loading and reading tabular sources
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// No file exists for the requested logical table
    #[error("No source file found for table '{table}' (looked in {location})")]
    TableNotFound { table: String, location: String },

    /// I/O error occurred while reading a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected the input
    #[error("CSV error in {file}: {source}")]
    CsvError {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// The Parquet reader rejected the input
    #[error("Parquet error in {file}: {source}")]
    ParquetError {
        file: String,
        #[source]
        source: parquet::errors::ParquetError,
    },

    /// File extension is neither CSV nor Parquet
    #[error("Unsupported file format: {path}")]
    UnsupportedFormat { path: String },

    /// A column the caller needs is absent after normalization
    ///
    /// `accepted` lists every name the lookup would have matched.
    #[error("Table '{table}' has no column named any of {accepted:?}")]
    MissingColumn { table: String, accepted: Vec<String> },

    /// A row has a different width than the header
    #[error("Expected {expected} fields but found {found} in row {row} of '{table}'")]
    FieldCountMismatch {
        table: String,
        expected: usize,
        found: usize,
        row: usize,
    },

    /// Backend-specific failure from a source implemented outside this crate
    #[error("Source '{source_name}' failed: {reason}")]
    SourceError { source_name: String, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
