//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use crate::error::{Result, RowFailure, StoreError};
use crate::keys;
use crate::row::{Cell, Mutation, Row, RowFilter, RowMutation};
use crate::schema::{all_column_families, cf, ColumnFamily, GcRule, TableSchema};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Opened as a read-only follower of another process's database.
    secondary: bool,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            secondary: false,
        })
    }

    /// Open a read-only secondary instance following the database at `primary`.
    ///
    /// The secondary keeps its own info logs under `secondary` and catches up
    /// with the primary before every read, so a serving process can read what
    /// another process writes. Writes through a secondary fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the primary database does not exist or cannot be opened.
    pub fn open_secondary<P: AsRef<Path>>(primary: P, secondary: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.set_max_open_files(-1);

        let db = DBWithThreadMode::open_cf_as_secondary(
            &opts,
            primary.as_ref(),
            secondary.as_ref(),
            all_column_families(),
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            secondary: true,
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Refresh a secondary instance before reading.
    fn catch_up(&self) -> Result<()> {
        if self.secondary {
            self.db
                .try_catch_up_with_primary()
                .map_err(|e| StoreError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Load a table schema.
    fn schema(&self, table: &str) -> Result<Option<TableSchema>> {
        let cf = self.cf(cf::TABLES)?;

        self.db
            .get_cf(&cf, keys::table_key(table))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Collect every key starting with `prefix` in the cells column family.
    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Box<[u8]>>> {
        let cf_cells = self.cf(cf::CELLS)?;
        let iter = self
            .db
            .iterator_cf(&cf_cells, IteratorMode::From(prefix, Direction::Forward));

        let mut found = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(prefix) {
                break;
            }

            found.push(key);
        }

        Ok(found)
    }

    /// Timestamps of every stored version of one column.
    fn version_timestamps(
        &self,
        table: &str,
        row: &[u8],
        family: &str,
        qualifier: &[u8],
    ) -> Result<BTreeSet<u64>> {
        let prefix = keys::column_prefix(table, row, family, qualifier);

        self.keys_with_prefix(&prefix)?
            .iter()
            .map(|key| keys::decode_cell_key(key).map(|cell| cell.timestamp_micros))
            .collect()
    }

    /// Apply one row's mutations and GC in a single atomic write.
    fn apply_row(&self, table: &str, schema: &TableSchema, row: &RowMutation) -> Result<()> {
        let cf_cells = self.cf(cf::CELLS)?;
        let mut batch = WriteBatch::default();
        let mut touched: BTreeMap<(&str, &[u8]), BTreeSet<u64>> = BTreeMap::new();

        for mutation in &row.mutations {
            match mutation {
                Mutation::SetCell {
                    family,
                    qualifier,
                    value,
                    timestamp_micros,
                } => {
                    if schema.gc_rule(family).is_none() {
                        return Err(StoreError::UnknownFamily {
                            table: table.to_string(),
                            family: family.clone(),
                        });
                    }

                    let key =
                        keys::cell_key(table, &row.row_key, family, qualifier, *timestamp_micros);
                    batch.put_cf(&cf_cells, key, value);

                    touched
                        .entry((family.as_str(), qualifier.as_slice()))
                        .or_default()
                        .insert(*timestamp_micros);
                }
            }
        }

        // Drop everything past the newest N versions, counting the ones being written
        for ((family, qualifier), written) in touched {
            let Some(limit) = schema.gc_rule(family).and_then(GcRule::retained_versions) else {
                continue;
            };

            let mut versions = self.version_timestamps(table, &row.row_key, family, qualifier)?;
            versions.extend(written);

            for timestamp in versions.iter().rev().skip(limit) {
                batch.delete_cf(
                    &cf_cells,
                    keys::cell_key(table, &row.row_key, family, qualifier, *timestamp),
                );
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Table Administration
    // =========================================================================

    fn create_table(&self, table: &str, families: &[ColumnFamily]) -> Result<()> {
        if self.schema(table)?.is_some() {
            return Err(StoreError::AlreadyExists(table.to_string()));
        }

        let cf = self.cf(cf::TABLES)?;
        let value = Self::serialize(&TableSchema::from_families(families))?;

        self.db
            .put_cf(&cf, keys::table_key(table), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(table = %table, families = families.len(), "Table created");
        Ok(())
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        self.catch_up()?;
        Ok(self.schema(table)?.is_some())
    }

    fn delete_table(&self, table: &str) -> Result<()> {
        if self.schema(table)?.is_none() {
            return Err(StoreError::TableNotFound(table.to_string()));
        }

        let cf_tables = self.cf(cf::TABLES)?;
        let cf_cells = self.cf(cf::CELLS)?;

        let cell_keys = self.keys_with_prefix(&keys::table_prefix(table))?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_tables, keys::table_key(table));
        for key in &cell_keys {
            batch.delete_cf(&cf_cells, key);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(table = %table, cells = cell_keys.len(), "Table deleted");
        Ok(())
    }

    // =========================================================================
    // Data Operations
    // =========================================================================

    fn mutate_rows(&self, table: &str, rows: &[RowMutation]) -> Result<()> {
        let schema = self
            .schema(table)?
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let mut failed = Vec::new();
        for row in rows {
            if let Err(e) = self.apply_row(table, &schema, row) {
                let row_key = String::from_utf8_lossy(&row.row_key).into_owned();
                tracing::warn!(table = %table, row_key = %row_key, error = %e, "Row mutation failed");
                failed.push(RowFailure {
                    row_key,
                    message: e.to_string(),
                });
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(StoreError::MutateRowsFailed {
                total: rows.len(),
                failed,
            })
        }
    }

    fn read_row(&self, table: &str, row_key: &[u8], filter: &RowFilter) -> Result<Option<Row>> {
        self.catch_up()?;

        if self.schema(table)?.is_none() {
            return Err(StoreError::TableNotFound(table.to_string()));
        }

        let cf_cells = self.cf(cf::CELLS)?;
        let prefix = keys::row_prefix(table, row_key);
        let iter = self
            .db
            .iterator_cf(&cf_cells, IteratorMode::From(&prefix, Direction::Forward));

        let mut row = Row::new(row_key);
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let cell_key = keys::decode_cell_key(&key)?;
            if !filter.admits(cell_key.timestamp_micros) {
                continue;
            }

            // Versions arrive newest first, so the limit keeps the most recent
            let versions = row
                .families
                .entry(cell_key.family)
                .or_default()
                .entry(cell_key.qualifier)
                .or_default();
            if filter
                .cells_per_column
                .is_some_and(|limit| versions.len() >= limit)
            {
                continue;
            }

            versions.push(Cell {
                value: value.into_vec(),
                timestamp_micros: cell_key.timestamp_micros,
            });
        }

        row.families.retain(|_, columns| {
            columns.retain(|_, versions| !versions.is_empty());
            !columns.is_empty()
        });

        Ok((!row.is_empty()).then_some(row))
    }
}
