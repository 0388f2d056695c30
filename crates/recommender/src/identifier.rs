//! SQL identifier allow-list.
//!
//! Schema and table names are interpolated into DDL, so anything outside
//! `[A-Za-z0-9_]` is rejected before a statement is built.

use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid identifier regex"));

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Split `schema.table` (schema optional) and check both parts
pub fn split_qualified(name: &str) -> Option<(Option<&str>, &str)> {
    let (schema, table) = match name.split_once('.') {
        Some((schema, table)) => (Some(schema), table),
        None => (None, name),
    };
    let valid = schema.is_none_or(is_valid_identifier) && is_valid_identifier(table);
    valid.then_some((schema, table))
}
