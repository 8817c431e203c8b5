//! Row mutations, read filters and read results.

use std::collections::BTreeMap;

/// Current wall-clock time in microseconds since the Unix epoch.
#[must_use]
pub fn now_micros() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_micros()).unwrap_or(0)
}

/// A single change to a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Write one cell version.
    SetCell {
        /// Column family.
        family: String,
        /// Column qualifier.
        qualifier: Vec<u8>,
        /// Cell value.
        value: Vec<u8>,
        /// Version timestamp in microseconds.
        timestamp_micros: u64,
    },
}

/// All mutations for one row. Applied atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMutation {
    /// Row key.
    pub row_key: Vec<u8>,
    /// Mutations, applied in order.
    pub mutations: Vec<Mutation>,
}

impl RowMutation {
    /// Start an empty mutation for `row_key`.
    #[must_use]
    pub fn new(row_key: impl Into<Vec<u8>>) -> Self {
        Self {
            row_key: row_key.into(),
            mutations: Vec::new(),
        }
    }

    /// Add a `SetCell` mutation.
    #[must_use]
    pub fn set_cell(
        mut self,
        family: impl Into<String>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        timestamp_micros: u64,
    ) -> Self {
        self.mutations.push(Mutation::SetCell {
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
            timestamp_micros,
        });
        self
    }
}

/// Restricts which cells a row read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFilter {
    /// Keep at most this many versions per column, newest first.
    pub cells_per_column: Option<usize>,
    /// Keep only the version written at exactly this timestamp.
    pub timestamp_micros: Option<u64>,
}

impl RowFilter {
    /// Every retained version.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            cells_per_column: None,
            timestamp_micros: None,
        }
    }

    /// Only the newest version of each column.
    #[must_use]
    pub const fn latest() -> Self {
        Self {
            cells_per_column: Some(1),
            timestamp_micros: None,
        }
    }

    /// Only the version written at `timestamp_micros`.
    #[must_use]
    pub const fn at(timestamp_micros: u64) -> Self {
        Self {
            cells_per_column: None,
            timestamp_micros: Some(timestamp_micros),
        }
    }

    /// Whether a cell version passes the timestamp restriction.
    #[must_use]
    pub fn admits(&self, timestamp_micros: u64) -> bool {
        self.timestamp_micros.map_or(true, |pinned| pinned == timestamp_micros)
    }
}

/// One version of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Cell value.
    pub value: Vec<u8>,
    /// Version timestamp in microseconds.
    pub timestamp_micros: u64,
}

/// Cells of one row, grouped by family and qualifier. Versions are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    /// Row key.
    pub key: Vec<u8>,
    /// Cells by family, then qualifier.
    pub families: BTreeMap<String, BTreeMap<Vec<u8>, Vec<Cell>>>,
}

impl Row {
    /// Create an empty row.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            families: BTreeMap::new(),
        }
    }

    /// All versions of one column, newest first.
    #[must_use]
    pub fn cells(&self, family: &str, qualifier: &[u8]) -> &[Cell] {
        self.families
            .get(family)
            .and_then(|columns| columns.get(qualifier))
            .map_or(&[], Vec::as_slice)
    }

    /// Newest version of one column.
    #[must_use]
    pub fn latest(&self, family: &str, qualifier: &[u8]) -> Option<&Cell> {
        self.cells(family, qualifier).first()
    }

    /// Whether the row holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.values().all(BTreeMap::is_empty)
    }
}
