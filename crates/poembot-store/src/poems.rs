//! The poems table.
//!
//! `PoemsTable` is the only interface the generator and the HTTP service use to
//! reach the datastore. It hides row-key construction and cell encoding.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, instrument};

use poembot_core::PoemIndex;

use crate::error::{Result, StoreError};
use crate::row::{now_micros, Cell, RowFilter, RowMutation};
use crate::schema::{ColumnFamily, GcRule};
use crate::Store;

/// Table holding the poems.
pub const TABLE_ID: &str = "poems";

/// Column family holding poem data.
pub const COLUMN_FAMILY: &str = "cf1";

/// Column qualifier of the poem text.
pub const POEM_COLUMN: &[u8] = b"poem";

/// Versions of each cell kept by the column family's GC rule.
pub const MAX_VERSIONS: u32 = 2;

/// Number of indices `read_random` draws from: `[0, 499]`.
pub const DEFAULT_READ_RANGE: u32 = 500;

/// Row recording the size of the last written batch.
pub const META_ROW: &[u8] = b"__meta__";

/// Column qualifier of the batch size in the metadata row.
pub const COUNT_COLUMN: &[u8] = b"count";

/// How the service picks the index range for random reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRange {
    /// Draw from `[0, n)` regardless of how many poems were written.
    Fixed(u32),
    /// Draw from `[0, count)` where `count` is the last written batch size.
    Written,
}

impl Default for ReadRange {
    fn default() -> Self {
        Self::Fixed(DEFAULT_READ_RANGE)
    }
}

/// Client for the poems table.
#[derive(Clone)]
pub struct PoemsTable {
    store: Arc<dyn Store>,
    table_id: String,
}

impl fmt::Debug for PoemsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoemsTable")
            .field("table_id", &self.table_id)
            .finish_non_exhaustive()
    }
}

impl PoemsTable {
    /// Create a client for the default `poems` table.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_table_id(store, TABLE_ID)
    }

    /// Create a client for a table with a custom name.
    #[must_use]
    pub fn with_table_id(store: Arc<dyn Store>, table_id: impl Into<String>) -> Self {
        Self {
            store,
            table_id: table_id.into(),
        }
    }

    /// The table this client reads and writes.
    #[must_use]
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Ensure the table exists with its column family and max-versions rule.
    ///
    /// Does nothing if the table already exists. No locking is provided.
    ///
    /// # Errors
    ///
    /// Returns an error if the datastore call fails.
    #[instrument(skip(self), fields(table = %self.table_id))]
    pub fn provision(&self) -> Result<()> {
        if self.store.table_exists(&self.table_id)? {
            info!("Table {} already exists.", self.table_id);
            return Ok(());
        }

        info!(
            family = COLUMN_FAMILY,
            max_versions = MAX_VERSIONS,
            "Creating column family with max versions GC rule"
        );
        self.store.create_table(
            &self.table_id,
            &[ColumnFamily::new(
                COLUMN_FAMILY,
                GcRule::max_versions(MAX_VERSIONS),
            )],
        )
    }

    /// Delete the table and everything in it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TableNotFound` if the table doesn't exist.
    #[instrument(skip(self), fields(table = %self.table_id))]
    pub fn deprovision(&self) -> Result<()> {
        self.store.delete_table(&self.table_id)?;
        info!("Table deleted");
        Ok(())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write poems under `poem0 .. poem{N-1}` in batch order.
    ///
    /// All rows go out in one `mutate_rows` call. Each row is atomic on its
    /// own, so a failure can leave some rows written; nothing is rolled back
    /// or retried. After a successful write the batch size is recorded in the
    /// metadata row. Returns the number of poems written.
    ///
    /// # Errors
    ///
    /// - `StoreError::BatchTooLarge` if the batch exceeds the index space.
    /// - `StoreError::MutateRowsFailed` if some rows were not applied.
    /// - Any other datastore error.
    #[instrument(skip(self, poems), fields(table = %self.table_id, count = poems.len()))]
    pub fn write_batch(&self, poems: &[Vec<u8>]) -> Result<usize> {
        let count = u32::try_from(poems.len()).map_err(|_| StoreError::BatchTooLarge(poems.len()))?;
        let timestamp = now_micros();

        let rows: Vec<RowMutation> = (0..count)
            .zip(poems)
            .map(|(index, poem)| {
                RowMutation::new(PoemIndex::new(index).row_key()).set_cell(
                    COLUMN_FAMILY,
                    POEM_COLUMN,
                    poem.as_slice(),
                    timestamp,
                )
            })
            .collect();

        self.store.mutate_rows(&self.table_id, &rows)?;

        let meta = RowMutation::new(META_ROW).set_cell(
            COLUMN_FAMILY,
            COUNT_COLUMN,
            count.to_string(),
            timestamp,
        );
        self.store.mutate_rows(&self.table_id, &[meta])?;

        info!("Poems written");
        Ok(poems.len())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read a poem at a uniformly random index in `[0, 499]`.
    ///
    /// The range does not depend on how many poems were written, so this fails
    /// with `StoreError::NotFound` whenever it lands on an unpopulated index.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the row or cell doesn't exist.
    /// - `StoreError::InvalidUtf8` if the stored bytes are not UTF-8.
    /// - Any other datastore error.
    pub fn read_random(&self) -> Result<String> {
        self.read_random_with(&mut rand::thread_rng(), DEFAULT_READ_RANGE)
    }

    /// Read a poem at a uniformly random index in `[0, upper)` drawn from `rng`.
    ///
    /// # Errors
    ///
    /// - `StoreError::EmptyRange` if `upper` is zero.
    /// - The errors of [`PoemsTable::read_poem`].
    pub fn read_random_with<R: Rng + ?Sized>(&self, rng: &mut R, upper: u32) -> Result<String> {
        if upper == 0 {
            return Err(StoreError::EmptyRange);
        }

        let index = PoemIndex::new(rng.gen_range(0..upper));
        self.read_poem(index)
    }

    /// Read a random poem, choosing the index range as configured.
    ///
    /// # Errors
    ///
    /// - `StoreError::EmptyRange` if the range resolves to zero poems.
    /// - The errors of [`PoemsTable::read_poem`].
    pub fn read_random_in(&self, range: ReadRange) -> Result<String> {
        let upper = match range {
            ReadRange::Fixed(upper) => upper,
            ReadRange::Written => self.written_count()?.unwrap_or(0),
        };

        self.read_random_with(&mut rand::thread_rng(), upper)
    }

    /// Read the latest version of the poem at `index`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the row or cell doesn't exist.
    /// - `StoreError::InvalidUtf8` if the stored bytes are not UTF-8.
    /// - Any other datastore error.
    #[instrument(skip(self), fields(table = %self.table_id))]
    pub fn read_poem(&self, index: PoemIndex) -> Result<String> {
        let row_key = index.row_key();
        let cell = self
            .read_cells(&row_key, POEM_COLUMN, &RowFilter::latest())?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                row_key: row_key.clone(),
            })?;

        debug!(row_key = %row_key, bytes = cell.value.len(), "Poem read");
        String::from_utf8(cell.value).map_err(|source| StoreError::InvalidUtf8 { row_key, source })
    }

    /// Read the version of the poem at `index` written at `timestamp_micros`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if that version is not retained.
    /// - `StoreError::InvalidUtf8` if the stored bytes are not UTF-8.
    /// - Any other datastore error.
    pub fn read_version(&self, index: PoemIndex, timestamp_micros: u64) -> Result<String> {
        let row_key = index.row_key();
        let cell = self
            .read_cells(&row_key, POEM_COLUMN, &RowFilter::at(timestamp_micros))?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                row_key: row_key.clone(),
            })?;

        String::from_utf8(cell.value).map_err(|source| StoreError::InvalidUtf8 { row_key, source })
    }

    /// Every retained version of the poem at `index`, newest first.
    ///
    /// Returns an empty list if the row doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the datastore call fails.
    pub fn read_versions(&self, index: PoemIndex) -> Result<Vec<Cell>> {
        self.read_cells(&index.row_key(), POEM_COLUMN, &RowFilter::all())
    }

    /// Size of the last successfully written batch, if any.
    ///
    /// # Errors
    ///
    /// - `StoreError::Serialization` if the stored count is malformed.
    /// - Any other datastore error.
    pub fn written_count(&self) -> Result<Option<u32>> {
        let Some(cell) = self
            .read_cells(META_ROW, COUNT_COLUMN, &RowFilter::latest())?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        std::str::from_utf8(&cell.value)
            .ok()
            .and_then(|count| count.parse().ok())
            .map(Some)
            .ok_or_else(|| StoreError::Serialization("malformed poem count".into()))
    }

    fn read_cells(
        &self,
        row_key: impl AsRef<[u8]>,
        qualifier: &[u8],
        filter: &RowFilter,
    ) -> Result<Vec<Cell>> {
        let row = self
            .store
            .read_row(&self.table_id, row_key.as_ref(), filter)?;

        Ok(row
            .map(|row| row.cells(COLUMN_FAMILY, qualifier).to_vec())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RocksStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn create_test_table() -> (PoemsTable, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        let poems = PoemsTable::new(Arc::new(store));
        poems.provision().unwrap();
        (poems, dir)
    }

    #[test]
    fn provision_is_idempotent() {
        let (poems, _dir) = create_test_table();
        poems.provision().unwrap();
        poems.write_batch(&[b"kept".to_vec()]).unwrap();
        poems.provision().unwrap();
        assert_eq!(poems.read_poem(PoemIndex::new(0)).unwrap(), "kept");
    }

    #[test]
    fn deprovision_removes_poems() {
        let (poems, _dir) = create_test_table();
        poems.write_batch(&[b"gone".to_vec()]).unwrap();

        poems.deprovision().unwrap();
        assert!(matches!(poems.deprovision(), Err(StoreError::TableNotFound(_))));

        poems.provision().unwrap();
        assert!(matches!(
            poems.read_poem(PoemIndex::new(0)),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn write_batch_uses_dense_keys() {
        let (poems, _dir) = create_test_table();
        let batch: Vec<Vec<u8>> = ["a", "b", "c"].iter().map(|s| s.as_bytes().to_vec()).collect();

        assert_eq!(poems.write_batch(&batch).unwrap(), 3);

        assert_eq!(poems.read_poem(PoemIndex::new(0)).unwrap(), "a");
        assert_eq!(poems.read_poem(PoemIndex::new(1)).unwrap(), "b");
        assert_eq!(poems.read_poem(PoemIndex::new(2)).unwrap(), "c");
        assert!(matches!(
            poems.read_poem(PoemIndex::new(3)),
            Err(StoreError::NotFound { row_key }) if row_key == "poem3"
        ));
        assert_eq!(poems.written_count().unwrap(), Some(3));
    }

    #[test]
    fn written_count_is_none_before_first_write() {
        let (poems, _dir) = create_test_table();
        assert_eq!(poems.written_count().unwrap(), None);
    }

    #[test]
    fn read_random_with_stays_in_range() {
        let (poems, _dir) = create_test_table();
        let batch: Vec<Vec<u8>> = (0..5).map(|i| format!("poem number {i}").into_bytes()).collect();
        poems.write_batch(&batch).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let poem = poems.read_random_with(&mut rng, 5).unwrap();
            assert!(poem.starts_with("poem number "));
        }
    }

    #[test]
    fn read_random_with_empty_range_fails() {
        let (poems, _dir) = create_test_table();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            poems.read_random_with(&mut rng, 0),
            Err(StoreError::EmptyRange)
        ));
    }

    #[test]
    fn read_random_in_written_range() {
        let (poems, _dir) = create_test_table();
        assert!(matches!(
            poems.read_random_in(ReadRange::Written),
            Err(StoreError::EmptyRange)
        ));

        poems.write_batch(&[b"only".to_vec()]).unwrap();
        for _ in 0..20 {
            assert_eq!(poems.read_random_in(ReadRange::Written).unwrap(), "only");
        }
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let (poems, _dir) = create_test_table();
        poems.write_batch(&[vec![0xff, 0xfe]]).unwrap();

        assert!(matches!(
            poems.read_poem(PoemIndex::new(0)),
            Err(StoreError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn write_to_missing_table_fails() {
        let dir = TempDir::new().unwrap();
        let poems = PoemsTable::new(Arc::new(RocksStore::open(dir.path()).unwrap()));

        assert!(matches!(
            poems.write_batch(&[b"x".to_vec()]),
            Err(StoreError::TableNotFound(_))
        ));
    }
}
