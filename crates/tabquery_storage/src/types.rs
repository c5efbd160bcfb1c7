//! Data model shared between the loader and the storage layer.
//!
//! These types are the contract: the loader's type-inference step produces
//! [`ColumnSpec`]s, the storage layer consumes them verbatim. No sanitization
//! or inference happens on this side of the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle identifying one loaded buffer (one open document).
///
/// Only ever used as a lookup key; never dereferenced. The loader owns the
/// value and is responsible for keeping it unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferId(pub u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for BufferId {
    fn from(v: u64) -> Self {
        BufferId(v)
    }
}

/// Inferred SQL type tag for one input column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    /// Raw text, the fallback when nothing stronger could be inferred.
    #[default]
    Text,
    Integer,
    Real,
}

impl SqlType {
    /// Keyword used in CREATE TABLE column definitions.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }
}

/// Describes one input column as the type-inference step classified it.
///
/// `name` is the sanitized identifier consumers query by; `creation_string`
/// is what goes verbatim into CREATE TABLE, which for an unsafe source header
/// is the quoted original (e.g. `"My Col!"`). When the header needed no
/// cleanup the two coincide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Sanitized column name, always a valid identifier in the target dialect.
    pub name: String,
    /// Exact string used in the CREATE TABLE column definition.
    pub creation_string: String,
    /// Inferred type tag.
    pub sql_type: SqlType,
}

impl ColumnSpec {
    pub fn new(
        name: impl Into<String>,
        creation_string: impl Into<String>,
        sql_type: SqlType,
    ) -> Self {
        Self {
            name: name.into(),
            creation_string: creation_string.into(),
            sql_type,
        }
    }

    /// Column whose source header was already a safe identifier.
    pub fn safe(name: impl Into<String>, sql_type: SqlType) -> Self {
        let name = name.into();
        Self {
            creation_string: name.clone(),
            name,
            sql_type,
        }
    }

    /// True when the source header had to be renamed.
    pub fn was_renamed(&self) -> bool {
        self.name != self.creation_string
    }
}
