//! SQLite engine driver.
//!
//! Synchronous `rusqlite` connection behind the [`StorageDriver`] capability.
//! SQLite's default dialect matches every statement template, so none are
//! overridden here.

use crate::driver::{hash_sql, sql_op_name, DriverError, StorageDriver};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug_span, info};

/// SQLite-backed driver.
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    /// Open or create a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened SQLite database");
        Ok(Self { conn })
    }

    /// Open an in-memory database (the usual mode for an interactive session).
    pub fn open_in_memory() -> Result<Self, DriverError> {
        let conn = Connection::open_in_memory()?;
        info!("opened in-memory SQLite database");
        Ok(Self { conn })
    }

    fn cell_to_string(value: ValueRef<'_>) -> String {
        match value {
            ValueRef::Null => String::new(),
            ValueRef::Integer(v) => v.to_string(),
            ValueRef::Real(v) => v.to_string(),
            ValueRef::Text(v) => String::from_utf8_lossy(v).into_owned(),
            ValueRef::Blob(v) => String::from_utf8_lossy(v).into_owned(),
        }
    }
}

impl StorageDriver for SqliteDriver {
    fn execute_statement(&self, sql: &str) -> Result<(), DriverError> {
        let span = debug_span!("db.exec", op = sql_op_name(sql), sql_hash = %hash_sql(sql));
        let _guard = span.enter();
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn execute_query(
        &self,
        sql: &str,
        include_header: bool,
    ) -> Result<Vec<Vec<String>>, DriverError> {
        let span = debug_span!("db.query", op = sql_op_name(sql), sql_hash = %hash_sql(sql));
        let _guard = span.enter();

        let mut stmt = self.conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let header: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut result = Vec::new();
        if include_header {
            result.push(header);
        }

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(Self::cell_to_string(row.get_ref(i)?));
            }
            result.push(values);
        }

        Ok(result)
    }

    fn engine_name(&self) -> &'static str {
        "SQLite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_and_queries_round_trip() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute_statement("CREATE TABLE t (id INTEGER, name TEXT)")
            .unwrap();
        driver
            .execute_statement("INSERT INTO t VALUES (1, 'alpha'), (2, 'beta')")
            .unwrap();

        let rows = driver
            .execute_query("SELECT * FROM t ORDER BY id", false)
            .unwrap();
        assert_eq!(rows, vec![vec!["1", "alpha"], vec!["2", "beta"]]);
    }

    #[test]
    fn header_row_carries_column_names() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute_statement("CREATE TABLE t (id INTEGER, name TEXT)")
            .unwrap();

        let rows = driver.execute_query("SELECT * FROM t", true).unwrap();
        assert_eq!(rows, vec![vec!["id", "name"]]);
    }

    #[test]
    fn null_cells_render_empty() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute_statement("CREATE TABLE t (v TEXT)")
            .unwrap();
        driver
            .execute_statement("INSERT INTO t VALUES (NULL)")
            .unwrap();

        let rows = driver.execute_query("SELECT v FROM t", false).unwrap();
        assert_eq!(rows, vec![vec![""]]);
    }

    #[test]
    fn malformed_sql_surfaces_a_driver_error() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        let err = driver.execute_statement("NOT ACTUAL SQL").unwrap_err();
        assert!(matches!(err, DriverError::Sqlite(_)));
    }
}
