//! Where tables come from.
//!
//! The pipeline never reaches for a global connection; it is handed a
//! [`TableSource`] and asks it for logical table names such as
//! `dw_alv.avaliacao` or `imdb_movies`. Implementations here cover local
//! files and in-memory fixtures; the warehouse implementation lives in the
//! `recommender` crate next to the database sink.

use crate::error::{DataLoadError, Result};
use crate::parser::read_table_file;
use crate::schema::normalize_columns;
use crate::types::Table;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

/// Anything that can produce a normalized table by logical name.
///
/// Implementations must return tables whose column names are already
/// lower-cased (see [`normalize_columns`]).
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Short description for logs
    fn describe(&self) -> String;

    /// Read a whole table
    async fn read_table(&self, name: &str) -> Result<Table>;
}

/// Drops a schema qualifier: `dw_alv.avaliacao` -> `avaliacao`
pub fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Reads `<root>/<table>.parquet` or `<root>/<table>.csv`, in that order.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the file backing a logical table
    fn locate(&self, name: &str) -> Result<PathBuf> {
        let base = unqualified(name);
        ["parquet", "csv"]
            .iter()
            .map(|ext| self.root.join(format!("{base}.{ext}")))
            .find(|path| path.is_file())
            .ok_or_else(|| DataLoadError::TableNotFound {
                table: name.to_string(),
                location: self.root.display().to_string(),
            })
    }
}

#[async_trait]
impl TableSource for FileSource {
    fn describe(&self) -> String {
        format!("files under {}", self.root.display())
    }

    async fn read_table(&self, name: &str) -> Result<Table> {
        let path = self.locate(name)?;
        let table_name = unqualified(name).to_string();

        // Parsing is CPU-bound; keep it off the async workers
        let table = tokio::task::spawn_blocking(move || read_table_file(&path, &table_name))
            .await
            .map_err(|e| DataLoadError::SourceError {
                source_name: self.describe(),
                reason: e.to_string(),
            })??;

        Ok(normalize_columns(table))
    }
}

/// Tables held in memory, keyed by unqualified name
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tables: HashMap<String, Table>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under its own name (builder pattern)
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.insert(table.name().to_string(), table);
        self
    }
}

#[async_trait]
impl TableSource for InMemorySource {
    fn describe(&self) -> String {
        format!("in-memory ({} tables)", self.tables.len())
    }

    async fn read_table(&self, name: &str) -> Result<Table> {
        self.tables
            .get(unqualified(name))
            .cloned()
            .map(normalize_columns)
            .ok_or_else(|| DataLoadError::TableNotFound {
                table: name.to_string(),
                location: self.describe(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_unqualified() {
        assert_eq!(unqualified("dw_alv.avaliacao"), "avaliacao");
        assert_eq!(unqualified("avaliacao"), "avaliacao");
    }

    #[tokio::test]
    async fn test_file_source_reads_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("endereco.csv"), "EnderecoSK,Estado\n1,SP\n2,RJ\n").unwrap();

        let source = FileSource::new(dir.path());
        let table = source.read_table("dw_alv.endereco").await.unwrap();

        assert_eq!(table.columns(), ["enderecosk", "estado"]);
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_file_source_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path());
        let err = source.read_table("receita").await.unwrap_err();
        assert!(matches!(err, DataLoadError::TableNotFound { .. }));
    }

    #[tokio::test]
    async fn test_in_memory_source() {
        let table = Table::from_rows("Receita", &["UsuarioSK"], vec![vec![Some("1")]]).unwrap();
        let source = InMemorySource::new().with_table(table);

        assert!(source.read_table("dw_alv.Receita").await.is_ok());
        assert!(source.read_table("receita").await.is_err());
    }
}
