//! Buffer-to-table bookkeeping.
//!
//! Two registries back the storage layer: [`TableRegistry`] owns the
//! buffer→table mapping and the name counter, [`UnsafeNameRegistry`] remembers
//! which sanitized column names hide a renamed source header.

use crate::driver::StorageDriver;
use crate::error::{Result, StorageError};
use crate::types::{BufferId, ColumnSpec};
use std::collections::HashMap;
use tracing::debug;

/// Durable mapping from buffer handle to its allocated table name.
///
/// A buffer gets exactly one table name for its lifetime. Names come from a
/// private counter ("T1", "T2", ...) and are never reused within a process
/// unless the counter is explicitly reset for session restore.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<BufferId, String>,
    last_table_number: u64,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the buffer's table name, allocating a fresh one if needed.
    ///
    /// The fresh path drops any same-named leftover table through the driver
    /// before the name is handed out, so the caller always starts clean even
    /// after a restored session or external tampering. A drop that fails maps
    /// to [`StorageError::NameCollision`].
    pub fn allocate_or_get(
        &mut self,
        buffer: BufferId,
        driver: &dyn StorageDriver,
    ) -> Result<String> {
        if let Some(name) = self.tables.get(&buffer) {
            return Ok(name.clone());
        }

        self.last_table_number += 1;
        let name = format!("T{}", self.last_table_number);

        let drop_sql = driver.drop_table_if_exists(&name);
        driver
            .execute_statement(&drop_sql)
            .map_err(|source| StorageError::NameCollision {
                table: name.clone(),
                source,
            })?;

        debug!(buffer = %buffer, table = %name, "allocated table name");
        self.tables.insert(buffer, name.clone());
        Ok(name)
    }

    /// Pure read of a buffer's table name.
    pub fn lookup(&self, buffer: BufferId) -> Option<&str> {
        self.tables.get(&buffer).map(String::as_str)
    }

    /// Override the counter when restoring a persisted session, so fresh
    /// names do not collide with tables already in the restored store.
    /// Existing buffer→name entries are left untouched.
    pub fn set_counter(&mut self, last_table_number: u64) {
        self.last_table_number = last_table_number;
    }

    /// Current counter value, for session persistence.
    pub fn counter(&self) -> u64 {
        self.last_table_number
    }

    /// Forget a buffer's mapping. Returns the table name it held, if any.
    pub fn remove(&mut self, buffer: BufferId) -> Option<String> {
        self.tables.remove(&buffer)
    }
}

/// Per-buffer record of sanitized column name → original creation string,
/// kept only for columns that were actually renamed. Absence of an entry
/// means no renaming occurred for that buffer.
#[derive(Debug, Default)]
pub struct UnsafeNameRegistry {
    renames: HashMap<BufferId, HashMap<String, String>>,
}

impl UnsafeNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer's record from a fresh set of column specs.
    ///
    /// Called once per full save, never per append.
    pub fn record(&mut self, buffer: BufferId, columns: &[ColumnSpec]) {
        let renamed: HashMap<String, String> = columns
            .iter()
            .filter(|c| c.was_renamed())
            .map(|c| (c.name.clone(), c.creation_string.clone()))
            .collect();
        self.renames.insert(buffer, renamed);
    }

    /// Read-only view of the buffer's renames; `None` or an empty map both
    /// mean "no unsafe names".
    pub fn lookup(&self, buffer: BufferId) -> Option<&HashMap<String, String>> {
        self.renames.get(&buffer)
    }

    /// Forget a buffer's record.
    pub fn remove(&mut self, buffer: BufferId) {
        self.renames.remove(&buffer);
    }
}
