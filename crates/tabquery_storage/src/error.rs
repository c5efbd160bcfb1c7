//! Error types for the storage layer.

use crate::driver::DriverError;
use crate::types::BufferId;
use thiserror::Error;

/// Storage operation result type.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage layer errors.
///
/// Every driver failure surfaces with the offending statement attached so
/// callers importing many buffers can decide per-buffer whether to continue.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Operation requires an existing table for a buffer that has none
    /// (e.g. append before save).
    #[error("no table exists for buffer {0}")]
    NotFound(BufferId),

    /// The backing store rejected a statement.
    #[error("statement failed: {statement}")]
    Driver {
        statement: String,
        #[source]
        source: DriverError,
    },

    /// A counter-allocated table name already exists and could not be
    /// cleanly dropped.
    #[error("table name {table} could not be claimed")]
    NameCollision {
        table: String,
        #[source]
        source: DriverError,
    },
}

impl StorageError {
    /// Wrap a driver failure with the statement that triggered it.
    pub(crate) fn driver(statement: impl Into<String>, source: DriverError) -> Self {
        Self::Driver {
            statement: statement.into(),
            source,
        }
    }
}
