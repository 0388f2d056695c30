//! Core tabular types shared by every crate in the workspace.
//!
//! Source data arrives as loosely-typed tables (CSV mirrors, Parquet
//! snapshots, warehouse queries). We keep it that way until the caller
//! extracts typed records, so that coercion failures turn into nulls
//! instead of aborting a whole load.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================

/// A single cell. `None` is a null (missing, empty or dropped value).
pub type Cell = Option<String>;

/// Warehouse surrogate key for a user
pub type UserId = String;

/// Warehouse surrogate key for a movie
pub type MovieId = String;

/// Warehouse surrogate key for a billing address
pub type AddressId = String;

// =============================================================================
// Table
// =============================================================================

/// An ordered sequence of records with named fields.
///
/// Rows always have exactly `columns.len()` cells; [`Table::push_row`]
/// enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given header
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from string literals. Mostly useful in tests and
    /// in-memory sources.
    pub fn from_rows(name: &str, columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Result<Self> {
        let mut table = Self::new(name, columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.into_iter().map(|c| c.map(str::to_string)).collect())?;
        }
        Ok(table)
    }

    /// Appends a row, rejecting rows whose width does not match the header
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DataLoadError::FieldCountMismatch {
                table: self.name.clone(),
                expected: self.columns.len(),
                found: row.len(),
                row: self.rows.len() + 1,
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of the first column matching any accepted name.
    ///
    /// Names are tried in order, so put the canonical name first.
    pub fn find_column(&self, accepted: &[&str]) -> Result<usize> {
        accepted
            .iter()
            .find_map(|name| self.column_index(name))
            .ok_or_else(|| DataLoadError::MissingColumn {
                table: self.name.clone(),
                accepted: accepted.iter().map(|s| s.to_string()).collect(),
            })
    }

    /// Cell value at (row, column) as a string slice
    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    /// Same rows, different header. Used by the schema normalizer.
    pub(crate) fn with_columns(self, columns: Vec<String>) -> Self {
        Self { columns, ..self }
    }
}

// =============================================================================
// Source Records
// =============================================================================
// Typed views over the four warehouse tables. Keys are trimmed and
// non-empty; numeric fields stay raw until the assembler coerces them.

/// One row of `avaliacao`: a user's rating of a movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub rating_id: Cell,
    pub user_id: Option<UserId>,
    pub movie_id: Option<MovieId>,
    /// Raw rating value, coerced later
    pub rating_value: Cell,
}

/// One row of `filme`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub movie_id: Option<MovieId>,
    pub name: Cell,
    pub release_year: Cell,
    pub duration_minutes: Cell,
    pub genre: Cell,
}

/// One row of `receita`: a payment linking a user to a billing address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub user_id: Option<UserId>,
    pub address_id: Option<AddressId>,
}

/// One row of `endereco`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address_id: Option<AddressId>,
    pub region: Cell,
}
