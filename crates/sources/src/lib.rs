//! # Sources Crate
//!
//! This crate reads the external movie catalog that feeds inference.
//!
//! ## Components
//!
//! ### Catalog Source
//! The catalog is refreshed out-of-band (a scraper drops a new snapshot).
//! Each run re-reads it and produces [`CandidateMovie`]s:
//! - Column names resolved through a fixed rename table
//! - Year, runtime, rating and vote count coerced to numbers
//! - A single primary genre per title
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{FileSource, TableSource};
//! use sources::{parse_catalog, CATALOG_TABLE};
//!
//! let catalog = FileSource::new("aws").read_table(CATALOG_TABLE).await?;
//! let candidates = parse_catalog(catalog)?;
//! ```

// Public modules
pub mod types;
pub mod catalog;

// Re-export commonly used types
pub use catalog::{parse_catalog, primary_genre, CATALOG_TABLE};
pub use types::{CandidateMovie, UNKNOWN_GENRE};
