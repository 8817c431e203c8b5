//! Wide-column storage layer for poembot.
//!
//! This crate provides a small wide-column store on top of `RocksDB` and the
//! `PoemsTable` client that the generator and the HTTP service share.
//!
//! # Architecture
//!
//! The store models tables of rows keyed by a row key. Each table declares
//! column families, and each family carries a garbage-collection rule. A cell
//! (`family:qualifier` in a row) keeps multiple timestamped versions, trimmed
//! by the rule on every write.
//!
//! Physically there are two `RocksDB` column families:
//!
//! - `tables`: table schemas, keyed by table name
//! - `cells`: versioned cells, keyed by `table | row | family | qualifier | !timestamp`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use poembot_core::PoemIndex;
//! use poembot_store::{PoemsTable, RocksStore};
//!
//! let store = Arc::new(RocksStore::open("/tmp/poembot-db").unwrap());
//! let poems = PoemsTable::new(store);
//!
//! poems.provision().unwrap();
//! poems.write_batch(&[b"Roses are red".to_vec()]).unwrap();
//! let poem = poems.read_poem(PoemIndex::new(0)).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod poems;
pub mod rocks;
pub mod row;
pub mod schema;

pub use error::{Result, RowFailure, StoreError};
pub use poems::{PoemsTable, ReadRange};
pub use rocks::RocksStore;
pub use row::{Cell, Mutation, Row, RowFilter, RowMutation};
pub use schema::{ColumnFamily, GcRule, TableSchema};

/// The storage trait defining the wide-column admin and data operations.
///
/// This trait abstracts the storage layer so the poem client is written
/// against an interface rather than a concrete engine.
pub trait Store: Send + Sync {
    // =========================================================================
    // Table Administration
    // =========================================================================

    /// Create a table with the given column families.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the table exists.
    fn create_table(&self, table: &str, families: &[ColumnFamily]) -> Result<()>;

    /// Check whether a table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Delete a table and every cell it holds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TableNotFound` if the table doesn't exist.
    fn delete_table(&self, table: &str) -> Result<()>;

    // =========================================================================
    // Data Operations
    // =========================================================================

    /// Apply row mutations.
    ///
    /// Each row is applied atomically and independently of the others, and
    /// the table's GC rules are enforced as part of the row's write. A failed
    /// row does not stop the remaining rows.
    ///
    /// # Errors
    ///
    /// - `StoreError::TableNotFound` if the table doesn't exist (nothing is written).
    /// - `StoreError::MutateRowsFailed` listing the rows that were not applied.
    fn mutate_rows(&self, table: &str, rows: &[RowMutation]) -> Result<()>;

    /// Read one row, keeping only the cells the filter admits.
    ///
    /// Returns `None` if no cell of the row passes the filter.
    ///
    /// # Errors
    ///
    /// - `StoreError::TableNotFound` if the table doesn't exist.
    /// - `StoreError::Database` if the database operation fails.
    fn read_row(&self, table: &str, row_key: &[u8], filter: &RowFilter) -> Result<Option<Row>>;
}
