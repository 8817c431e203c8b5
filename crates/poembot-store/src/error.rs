//! Error types for poembot storage.

use std::fmt;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Row or cell not found.
    #[error("not found: {row_key}")]
    NotFound {
        /// The row key that was read.
        row_key: String,
    },

    /// The table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The table already exists.
    #[error("table already exists: {0}")]
    AlreadyExists(String),

    /// A mutation referenced a column family the table does not define.
    #[error("unknown column family {family} in table {table}")]
    UnknownFamily {
        /// Table name.
        table: String,
        /// Column family name.
        family: String,
    },

    /// One or more rows of a `mutate_rows` call were not applied.
    ///
    /// Rows are applied independently, so rows not listed here were written.
    #[error("mutate_rows failed for {} of {total} rows", failed.len())]
    MutateRowsFailed {
        /// Number of rows in the call.
        total: usize,
        /// The rows that failed.
        failed: Vec<RowFailure>,
    },

    /// A cell value is not valid UTF-8.
    #[error("cell in row {row_key} is not valid UTF-8")]
    InvalidUtf8 {
        /// The row key that was read.
        row_key: String,
        /// Decoding error.
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// A batch is larger than the row-key index space.
    #[error("batch of {0} rows exceeds the poem index range")]
    BatchTooLarge(usize),

    /// A random read was requested over an empty index range.
    #[error("cannot pick a poem from an empty index range")]
    EmptyRange,
}

/// A row that failed inside a `mutate_rows` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// Row key, lossily decoded for display.
    pub row_key: String,
    /// Failure message.
    pub message: String,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.row_key, self.message)
    }
}
