//! # Data Loader Crate
//!
//! This crate turns raw tabular inputs into normalized [`Table`]s and typed
//! source records for the recommendation pipeline.
//!
//! ## Main Components
//!
//! - **types**: `Table` plus the four warehouse record types
//! - **schema**: column normalizer, column aliases, record extraction
//! - **parser**: CSV/Parquet readers and numeric coercion
//! - **source**: the `TableSource` trait and file/in-memory sources
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{FileSource, RatingRecord, SourceRecord, TableSource};
//!
//! let source = FileSource::new("data/CSVs");
//! let table = source.read_table("dw_alv.avaliacao").await?;
//! let ratings = RatingRecord::from_table(&table)?;
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod schema;
pub mod parser;
pub mod source;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use parser::{clean_cell, coerce_numeric, read_table_file};
pub use schema::{normalize_columns, SourceRecord};
pub use source::{FileSource, InMemorySource, TableSource};
pub use types::{
    // Type aliases
    AddressId,
    Cell,
    MovieId,
    UserId,
    // Core types
    AddressRecord,
    MovieMetadata,
    RatingRecord,
    RevenueRecord,
    Table,
};
