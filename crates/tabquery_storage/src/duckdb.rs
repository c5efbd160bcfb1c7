//! DuckDB engine driver (optional `duckdb` feature).
//!
//! Columnar OLAP engine behind the same [`StorageDriver`] capability as
//! SQLite. DuckDB shares the generic LIMIT/VIEW syntax, so the default
//! templates apply unchanged.

use crate::driver::{hash_sql, sql_op_name, DriverError, StorageDriver};
use duckdb::types::ValueRef;
use duckdb::Connection;
use std::path::Path;
use tracing::{debug_span, info};

/// DuckDB-backed driver.
pub struct DuckDbDriver {
    conn: Connection,
}

impl DuckDbDriver {
    /// Open or create a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened DuckDB database");
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, DriverError> {
        let conn = Connection::open_in_memory()?;
        info!("opened in-memory DuckDB database");
        Ok(Self { conn })
    }

    fn cell_to_string(value: ValueRef<'_>) -> String {
        match value {
            ValueRef::Null => String::new(),
            ValueRef::Boolean(v) => v.to_string(),
            ValueRef::TinyInt(v) => v.to_string(),
            ValueRef::SmallInt(v) => v.to_string(),
            ValueRef::Int(v) => v.to_string(),
            ValueRef::BigInt(v) => v.to_string(),
            ValueRef::HugeInt(v) => v.to_string(),
            ValueRef::UTinyInt(v) => v.to_string(),
            ValueRef::USmallInt(v) => v.to_string(),
            ValueRef::UInt(v) => v.to_string(),
            ValueRef::UBigInt(v) => v.to_string(),
            ValueRef::Float(v) => v.to_string(),
            ValueRef::Double(v) => v.to_string(),
            ValueRef::Text(v) => String::from_utf8_lossy(v).into_owned(),
            ValueRef::Blob(v) => String::from_utf8_lossy(v).into_owned(),
            other => format!("{:?}", other),
        }
    }
}

impl StorageDriver for DuckDbDriver {
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
        let mut rows_iter = stmt.query([])?;

        let (column_count, header) = match rows_iter.as_ref() {
            Some(stmt_ref) => {
                let count = stmt_ref.column_count();
                let names: Vec<String> = (0..count)
                    .map(|i| {
                        stmt_ref
                            .column_name(i)
                            .map(|s| s.to_string())
                            .unwrap_or_else(|_| format!("col{}", i))
                    })
                    .collect();
                (count, names)
            }
            None => return Ok(Vec::new()),
        };

        let mut result = Vec::new();
        if include_header {
            result.push(header);
        }

        while let Some(row) = rows_iter.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(Self::cell_to_string(row.get_ref(i)?));
            }
            result.push(values);
        }

        Ok(result)
    }

    fn engine_name(&self) -> &'static str {
        "DuckDB"
    }
}
