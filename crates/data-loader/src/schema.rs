//! Schema normalization and column resolution.
//!
//! Input tables come from several places with inconsistent casing
//! (`UsuarioSK` in the warehouse, `usuariosk` in the CSV mirror). Everything
//! downstream keys on lower-case names, and on top of that each logical
//! column may be spelled with its canonical English name or with the
//! warehouse's Portuguese surrogate name.

use crate::error::Result;
use crate::parser::clean_cell;
use crate::types::*;

/// Lower-cases every column name. Field order and values are untouched.
///
/// Idempotent: `normalize_columns(normalize_columns(t)) == normalize_columns(t)`.
pub fn normalize_columns(table: Table) -> Table {
    let columns = table.columns().iter().map(|c| c.to_lowercase()).collect();
    table.with_columns(columns)
}

// =============================================================================
// Column aliases
// =============================================================================
// Canonical name first, warehouse spelling second.

pub const RATING_ID: &[&str] = &["rating_id", "avaliacaosk"];
pub const USER_ID: &[&str] = &["user_id", "usuariosk"];
pub const MOVIE_ID: &[&str] = &["movie_id", "filmesk"];
pub const RATING_VALUE: &[&str] = &["rating_value", "nota"];
pub const MOVIE_NAME: &[&str] = &["name", "filmenome"];
pub const RELEASE_YEAR: &[&str] = &["release_year", "anodelancamento"];
pub const DURATION_MINUTES: &[&str] = &["duration_minutes", "duracaomin"];
pub const GENRE: &[&str] = &["genre", "generonome"];
pub const ADDRESS_ID: &[&str] = &["address_id", "enderecosk"];
pub const REGION: &[&str] = &["region", "estado"];

/// A typed record that can be pulled out of a normalized table.
///
/// Implementors resolve their columns once, then map every row. Extra
/// columns are ignored.
pub trait SourceRecord: Sized {
    /// Logical table name in the warehouse
    const TABLE: &'static str;

    fn from_table(table: &Table) -> Result<Vec<Self>>;
}

/// Reads a cell and re-applies trimming so keys from different sources
/// compare equal.
fn get(table: &Table, row: usize, column: usize) -> Cell {
    table.value(row, column).and_then(clean_cell)
}

impl SourceRecord for RatingRecord {
    const TABLE: &'static str = "avaliacao";

    fn from_table(table: &Table) -> Result<Vec<Self>> {
        let rating_id = table.find_column(RATING_ID)?;
        let user_id = table.find_column(USER_ID)?;
        let movie_id = table.find_column(MOVIE_ID)?;
        let rating_value = table.find_column(RATING_VALUE)?;

        Ok((0..table.len())
            .map(|row| RatingRecord {
                rating_id: get(table, row, rating_id),
                user_id: get(table, row, user_id),
                movie_id: get(table, row, movie_id),
                rating_value: get(table, row, rating_value),
            })
            .collect())
    }
}

impl SourceRecord for MovieMetadata {
    const TABLE: &'static str = "filme";

    fn from_table(table: &Table) -> Result<Vec<Self>> {
        let movie_id = table.find_column(MOVIE_ID)?;
        let name = table.find_column(MOVIE_NAME)?;
        let release_year = table.find_column(RELEASE_YEAR)?;
        let duration_minutes = table.find_column(DURATION_MINUTES)?;
        let genre = table.find_column(GENRE)?;

        Ok((0..table.len())
            .map(|row| MovieMetadata {
                movie_id: get(table, row, movie_id),
                name: get(table, row, name),
                release_year: get(table, row, release_year),
                duration_minutes: get(table, row, duration_minutes),
                genre: get(table, row, genre),
            })
            .collect())
    }
}

impl SourceRecord for RevenueRecord {
    const TABLE: &'static str = "receita";

    fn from_table(table: &Table) -> Result<Vec<Self>> {
        // An empty revenue table may come without a header at all; that
        // simply means nobody has a region yet.
        if table.is_empty() {
            return Ok(Vec::new());
        }
        let user_id = table.find_column(USER_ID)?;
        let address_id = table.find_column(ADDRESS_ID)?;

        Ok((0..table.len())
            .map(|row| RevenueRecord {
                user_id: get(table, row, user_id),
                address_id: get(table, row, address_id),
            })
            .collect())
    }
}

impl SourceRecord for AddressRecord {
    const TABLE: &'static str = "endereco";

    fn from_table(table: &Table) -> Result<Vec<Self>> {
        let address_id = table.find_column(ADDRESS_ID)?;
        let region = table.find_column(REGION)?;

        Ok((0..table.len())
            .map(|row| AddressRecord {
                address_id: get(table, row, address_id),
                region: get(table, row, region),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataLoadError;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_lowercases_and_keeps_order() {
        let table = Table::from_rows(
            "filme",
            &["FilmeSK", "FilmeNome", "anoDeLancamento"],
            vec![vec![Some("1"), Some("Heat"), Some("1995")]],
        )
        .unwrap();

        let normalized = normalize_columns(table.clone());
        assert_eq!(normalized.columns(), ["filmesk", "filmenome", "anodelancamento"]);
        assert_eq!(normalized.rows(), table.rows());
        assert_eq!(normalized.name(), "filme");
    }

    #[test]
    fn test_rating_records_from_warehouse_names() {
        let table = normalize_columns(
            Table::from_rows(
                "avaliacao",
                &["AvaliacaoSK", "UsuarioSK", "FilmeSK", "Nota", "Comentario"],
                vec![
                    vec![Some("10"), Some(" 7 "), Some("3"), Some("4.5"), Some("great")],
                    vec![Some("11"), Some(""), Some("3"), None, None],
                ],
            )
            .unwrap(),
        );

        let records = RatingRecord::from_table(&table).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user_id.as_deref(), Some("7"));
        assert_eq!(records[0].rating_value.as_deref(), Some("4.5"));
        assert_eq!(records[1].user_id, None);
        assert_eq!(records[1].rating_value, None);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let table = Table::from_rows("endereco", &["address_id"], vec![vec![Some("1")]]).unwrap();
        let err = AddressRecord::from_table(&table).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref table, .. } if table == "endereco"));
    }

    #[test]
    fn test_empty_revenue_without_header() {
        let table = Table::new("receita", vec![]);
        assert!(RevenueRecord::from_table(&table).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(columns in proptest::collection::vec("[A-Za-z_]{1,12}", 0..8)) {
            let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
            let table = Table::from_rows("t", &refs, vec![]).unwrap();

            let once = normalize_columns(table);
            let twice = normalize_columns(once.clone());

            prop_assert_eq!(&once, &twice);
            for column in once.columns() {
                prop_assert_eq!(column.clone(), column.to_lowercase());
            }
        }
    }
}
