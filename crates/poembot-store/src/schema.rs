//! Table schema and physical column families.
//!
//! Two layers share the words "column family" here. The *physical* column
//! families in [`cf`] are `RocksDB` partitions. The *table* column families in
//! [`TableSchema`] are the wide-column groupings a table declares, each with
//! its own garbage-collection rule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `RocksDB` column family names for the database.
pub mod cf {
    /// Table schemas, keyed by table name. Values are CBOR `TableSchema`.
    pub const TABLES: &str = "tables";

    /// Versioned cells, keyed by `table | row | family | qualifier | !timestamp`.
    pub const CELLS: &str = "cells";
}

/// Returns all `RocksDB` column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::TABLES, cf::CELLS]
}

/// Cell-level garbage-collection rule for a table column family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GcRule {
    /// Keep every version.
    KeepAll,
    /// Keep only the N most recent versions of each cell.
    MaxVersions {
        /// Number of versions to retain.
        versions: u32,
    },
}

impl GcRule {
    /// Keep the `versions` most recent versions of each cell.
    #[must_use]
    pub const fn max_versions(versions: u32) -> Self {
        Self::MaxVersions { versions }
    }

    /// Number of versions to retain, or `None` if unbounded.
    #[must_use]
    pub fn retained_versions(self) -> Option<usize> {
        match self {
            Self::KeepAll => None,
            Self::MaxVersions { versions } => Some(versions as usize),
        }
    }
}

/// A named column family with its retention rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFamily {
    /// Family name.
    pub name: String,
    /// Retention rule.
    pub gc_rule: GcRule,
}

impl ColumnFamily {
    /// Create a column family definition.
    #[must_use]
    pub fn new(name: impl Into<String>, gc_rule: GcRule) -> Self {
        Self {
            name: name.into(),
            gc_rule,
        }
    }
}

/// Persisted schema of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Column families by name.
    pub families: BTreeMap<String, GcRule>,
}

impl TableSchema {
    /// Build a schema from family definitions.
    #[must_use]
    pub fn from_families(families: &[ColumnFamily]) -> Self {
        Self {
            families: families
                .iter()
                .map(|family| (family.name.clone(), family.gc_rule))
                .collect(),
        }
    }

    /// Look up the GC rule of a family.
    #[must_use]
    pub fn gc_rule(&self, family: &str) -> Option<GcRule> {
        self.families.get(family).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_from_families() {
        let schema = TableSchema::from_families(&[
            ColumnFamily::new("cf1", GcRule::max_versions(2)),
            ColumnFamily::new("audit", GcRule::KeepAll),
        ]);

        assert_eq!(schema.gc_rule("cf1"), Some(GcRule::max_versions(2)));
        assert_eq!(schema.gc_rule("audit"), Some(GcRule::KeepAll));
        assert_eq!(schema.gc_rule("missing"), None);
    }

    #[test]
    fn retained_versions() {
        assert_eq!(GcRule::max_versions(2).retained_versions(), Some(2));
        assert_eq!(GcRule::KeepAll.retained_versions(), None);
    }
}
