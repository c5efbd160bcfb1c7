//! Storage abstraction layer for TabQuery
//!
//! TabQuery loads tabular text data into named buffers and queries each
//! buffer with SQL as if it were a table. This crate maps each in-memory
//! buffer onto a durable table in a SQL-capable backing store, keeps that
//! mapping stable across repeated loads and appends, and maintains the fixed
//! view `this` so downstream query code never sees a real table name.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tabquery_storage::{ColumnSpec, SqlType, SqliteDriver, Storage};
//!
//! let mut storage = Storage::new(SqliteDriver::open_in_memory()?);
//! storage.connectivity_check()?;
//!
//! let buffer = 1.into();
//! let columns = vec![ColumnSpec::safe("city", SqlType::Text)];
//! storage.save(buffer, &rows, &columns)?;
//! storage.activate(buffer)?;
//!
//! // Generic queries now target whatever buffer is active.
//! let preview = storage.run_query(&storage.limited_select(100), true)?;
//! ```

mod error;
mod registry;
mod types;

pub mod driver;

#[cfg(feature = "duckdb")]
mod duckdb;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use driver::{quote_ident, quote_literal, DriverError, StorageDriver, VIEW_NAME};
pub use error::{Result, StorageError};
pub use registry::{TableRegistry, UnsafeNameRegistry};
pub use types::{BufferId, ColumnSpec, SqlType};

#[cfg(feature = "duckdb")]
pub use crate::duckdb::DuckDbDriver;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteDriver;

use std::collections::HashMap;
use tracing::{debug, info};

/// Upper bound on embedded values per INSERT statement. Keeps statement text
/// bounded when a load has many rows or wide rows.
const MAX_VALUES_PER_INSERT: usize = 999;

/// One storage session over one backing-store connection.
///
/// Owns the buffer→table registry, the unsafe-name registry, and the
/// active-buffer indicator. Intended to be driven by a single caller at a
/// time; wrap it in a mutex if multiple threads must share it.
pub struct Storage<D: StorageDriver> {
    driver: D,
    tables: TableRegistry,
    unsafe_names: UnsafeNameRegistry,
    active: Option<BufferId>,
}

impl<D: StorageDriver> Storage<D> {
    /// Start a session over the given engine driver.
    pub fn new(driver: D) -> Self {
        info!(engine = driver.engine_name(), "storage session opened");
        Self {
            driver,
            tables: TableRegistry::new(),
            unsafe_names: UnsafeNameRegistry::new(),
            active: None,
        }
    }

    /// The underlying driver (escape hatch for engine-specific work).
    ///
    /// Prefer the session operations instead.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Save a buffer's rows as a table, replacing any previous contents.
    ///
    /// The first save allocates the buffer's table name; every later save
    /// reuses it and rebuilds the table from scratch, so the table always
    /// reflects the latest load exactly. Returns the table name.
    pub fn save(
        &mut self,
        buffer: BufferId,
        rows: &[Vec<String>],
        columns: &[ColumnSpec],
    ) -> Result<String> {
        let replacing = self.tables.lookup(buffer).is_some();
        let table = self.tables.allocate_or_get(buffer, &self.driver)?;

        if replacing {
            self.exec(&self.driver.drop_table_if_exists(&table))?;
        }

        let column_defs: Vec<String> = columns
            .iter()
            .map(|c| format!("{} {}", c.creation_string, c.sql_type.as_sql()))
            .collect();
        let create = format!(
            "CREATE TABLE {} ({})",
            quote_ident(&table),
            column_defs.join(", ")
        );
        self.exec(&create)?;

        self.insert_rows(&table, rows)?;
        self.unsafe_names.record(buffer, columns);

        info!(buffer = %buffer, table = %table, rows = rows.len(), "buffer saved");
        Ok(table)
    }

    /// Insert additional rows into a buffer's existing table.
    ///
    /// Fails with [`StorageError::NotFound`] if the buffer was never saved.
    pub fn append(&mut self, buffer: BufferId, rows: &[Vec<String>]) -> Result<()> {
        let table = self
            .tables
            .lookup(buffer)
            .ok_or(StorageError::NotFound(buffer))?
            .to_string();
        self.insert_rows(&table, rows)?;
        debug!(buffer = %buffer, table = %table, rows = rows.len(), "rows appended");
        Ok(())
    }

    /// Point the fixed view `this` at the buffer's table.
    ///
    /// Most dialects cannot redefine a view in place, so the old view is
    /// dropped first. Activating a buffer that has no table is a deliberate
    /// no-op that leaves the current indicator untouched: "activate nothing"
    /// is a valid idle state, not an error.
    pub fn activate(&mut self, buffer: BufferId) -> Result<()> {
        let Some(table) = self.tables.lookup(buffer) else {
            debug!(buffer = %buffer, "activate skipped: buffer has no table");
            return Ok(());
        };
        let table = table.to_string();

        self.exec(&self.driver.drop_view_if_exists())?;
        self.exec(&self.driver.create_view_for_table(&table))?;
        self.active = Some(buffer);

        info!(buffer = %buffer, table = %table, "buffer activated");
        Ok(())
    }

    /// Drop a buffer's table and forget everything known about it.
    ///
    /// If the buffer was active, the fixed view is removed and the indicator
    /// cleared. Discarding an unknown buffer is a no-op.
    pub fn discard(&mut self, buffer: BufferId) -> Result<()> {
        let Some(table) = self.tables.remove(buffer) else {
            return Ok(());
        };
        self.unsafe_names.remove(buffer);

        if self.active == Some(buffer) {
            self.exec(&self.driver.drop_view_if_exists())?;
            self.active = None;
        }
        self.exec(&self.driver.drop_table_if_exists(&table))?;

        info!(buffer = %buffer, table = %table, "buffer discarded");
        Ok(())
    }

    /// Execute a statement with no expected result set (DDL/DML).
    pub fn run_statement(&self, sql: &str) -> Result<()> {
        self.exec(sql)
    }

    /// Execute a query; with `include_header` the first row returned holds
    /// the column names, mirroring the header row of the loaded text.
    pub fn run_query(&self, sql: &str, include_header: bool) -> Result<Vec<Vec<String>>> {
        self.driver
            .execute_query(sql, include_header)
            .map_err(|source| StorageError::driver(sql, source))
    }

    /// Query text selecting at most `rows` rows from the active view.
    pub fn limited_select(&self, rows: usize) -> String {
        self.driver.limited_select(rows)
    }

    /// Verify the backing store is reachable by evaluating trivial
    /// arithmetic through it. Failure here is fatal to the session; callers
    /// should not issue further operations against an unreachable store.
    pub fn connectivity_check(&self) -> Result<()> {
        const PROBE: &str = "SELECT 2*3";
        let rows = self.run_query(PROBE, false)?;
        match rows.first().and_then(|r| r.first()) {
            Some(v) if v == "6" => Ok(()),
            other => Err(StorageError::driver(
                PROBE,
                DriverError::Other(format!("connectivity probe returned {:?}", other)),
            )),
        }
    }

    /// Table name for a buffer, if it has been saved.
    pub fn table_name(&self, buffer: BufferId) -> Option<&str> {
        self.tables.lookup(buffer)
    }

    /// Sanitized-name → creation-string mapping for a buffer's renamed
    /// columns. `None` means no renaming occurred.
    pub fn unsafe_column_names(&self, buffer: BufferId) -> Option<&HashMap<String, String>> {
        self.unsafe_names.lookup(buffer)
    }

    /// Buffer currently exposed through the fixed view, if any.
    pub fn active_buffer(&self) -> Option<BufferId> {
        self.active
    }

    /// Current table-name counter, for session persistence.
    pub fn table_counter(&self) -> u64 {
        self.tables.counter()
    }

    /// Restore the table-name counter from a persisted session so fresh
    /// names do not collide with tables already in the restored store.
    pub fn set_table_counter(&mut self, last_table_number: u64) {
        self.tables.set_counter(last_table_number);
    }

    fn exec(&self, sql: &str) -> Result<()> {
        self.driver
            .execute_statement(sql)
            .map_err(|source| StorageError::driver(sql, source))
    }

    fn insert_rows(&self, table: &str, rows: &[Vec<String>]) -> Result<()> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let width = first.len();
        if width == 0 {
            return Ok(());
        }

        let rows_per_chunk = (MAX_VALUES_PER_INSERT / width).max(1);
        for chunk in rows.chunks(rows_per_chunk) {
            let values = chunk
                .iter()
                .map(|row| {
                    let literals: Vec<String> =
                        row.iter().map(|v| quote_literal(v)).collect();
                    format!("({})", literals.join(", "))
                })
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("INSERT INTO {} VALUES {}", quote_ident(table), values);
            self.exec(&sql)?;
        }
        Ok(())
    }
}
