//! Driver capability contract.
//!
//! The storage layer is written against [`StorageDriver`], never against a
//! concrete engine. A driver executes raw SQL and supplies the handful of
//! dialect-specific statement templates; everything else lives above it.

use thiserror::Error;

/// Name of the fixed view that always points at the active buffer's table.
///
/// Generic queries say `SELECT * FROM this` and never learn real table names.
pub const VIEW_NAME: &str = "this";

/// Errors from a concrete engine.
#[derive(Debug, Error)]
pub enum DriverError {
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "duckdb")]
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("driver error: {0}")]
    Other(String),
}

/// Capability the storage layer requires from a backing SQL engine.
///
/// The template methods have defaults covering the common dialect; an engine
/// overrides one only when its syntax differs (e.g. `SELECT TOP n` dialects).
pub trait StorageDriver {
    /// Execute a statement with no expected result set (DDL/DML).
    fn execute_statement(&self, sql: &str) -> Result<(), DriverError>;

    /// Execute a statement expected to return rows, every cell rendered as a
    /// string (NULL renders as the empty string). With `include_header` the
    /// first produced row holds the column names.
    fn execute_query(&self, sql: &str, include_header: bool)
        -> Result<Vec<Vec<String>>, DriverError>;

    /// Engine name for logging.
    fn engine_name(&self) -> &'static str;

    /// Statement dropping `table` without erroring when it is absent.
    fn drop_table_if_exists(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", quote_ident(table))
    }

    /// Statement dropping the fixed view without erroring when it is absent.
    fn drop_view_if_exists(&self) -> String {
        format!("DROP VIEW IF EXISTS {}", VIEW_NAME)
    }

    /// Statement redefining the fixed view to expose `table`.
    fn create_view_for_table(&self, table: &str) -> String {
        format!(
            "CREATE VIEW {} AS SELECT * FROM {}",
            VIEW_NAME,
            quote_ident(table)
        )
    }

    /// Query text selecting at most `rows` rows from the fixed view.
    fn limited_select(&self, rows: usize) -> String {
        format!("SELECT * FROM {} LIMIT {}", VIEW_NAME, rows)
    }
}

/// Quote an identifier for safe use in statement text.
pub fn quote_ident(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push('"');
    for ch in name.chars() {
        if ch == '"' {
            escaped.push('"');
        }
        escaped.push(ch);
    }
    escaped.push('"');
    escaped
}

/// Quote a string literal for safe embedding in statement text.
pub fn quote_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push('\'');
        }
        escaped.push(ch);
    }
    escaped.push('\'');
    escaped
}

/// Leading keyword of a statement, for span fields.
pub(crate) fn sql_op_name(sql: &str) -> &str {
    sql.split_whitespace().next().unwrap_or("unknown")
}

/// FNV-1a 64-bit hash for low-cardinality, stable statement identification.
pub(crate) fn hash_sql(sql: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in sql.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{:016x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullDriver;

    impl StorageDriver for NullDriver {
        fn execute_statement(&self, _sql: &str) -> Result<(), DriverError> {
            Ok(())
        }

        fn execute_query(
            &self,
            _sql: &str,
            _include_header: bool,
        ) -> Result<Vec<Vec<String>>, DriverError> {
            Ok(Vec::new())
        }

        fn engine_name(&self) -> &'static str {
            "null"
        }
    }

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn quote_literal_escapes_single_quotes() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn default_templates_target_the_fixed_view() {
        let driver = NullDriver;
        assert_eq!(driver.drop_view_if_exists(), "DROP VIEW IF EXISTS this");
        assert_eq!(
            driver.create_view_for_table("T1"),
            "CREATE VIEW this AS SELECT * FROM \"T1\""
        );
        assert_eq!(driver.limited_select(5), "SELECT * FROM this LIMIT 5");
        assert_eq!(
            driver.drop_table_if_exists("T1"),
            "DROP TABLE IF EXISTS \"T1\""
        );
    }

    #[test]
    fn sql_hash_is_stable() {
        assert_eq!(hash_sql("SELECT 1"), hash_sql("SELECT 1"));
        assert_ne!(hash_sql("SELECT 1"), hash_sql("SELECT 2"));
        assert_eq!(sql_op_name("SELECT * FROM this"), "SELECT");
    }
}
