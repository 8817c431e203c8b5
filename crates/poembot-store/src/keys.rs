//! Key encoding utilities for `RocksDB`.
//!
//! Cell keys are a sequence of length-prefixed components followed by the
//! bit-inverted timestamp:
//!
//! `len(table) table | len(row) row | len(family) family | len(qualifier) qualifier | !ts`
//!
//! Lengths are big-endian `u32`. Because every component carries its length, a
//! key prefix built from the leading components only matches keys with exactly
//! those components. Inverting the timestamp makes the newest version of a
//! column sort first.

use crate::error::{Result, StoreError};

/// Components decoded from a cell key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellKey {
    /// Table name.
    pub table: String,
    /// Row key.
    pub row: Vec<u8>,
    /// Column family.
    pub family: String,
    /// Column qualifier.
    pub qualifier: Vec<u8>,
    /// Version timestamp in microseconds.
    pub timestamp_micros: u64,
}

fn push_component(key: &mut Vec<u8>, part: &[u8]) {
    // Component lengths are bounded by RocksDB key sizes, far below u32::MAX.
    #[allow(clippy::cast_possible_truncation)]
    let len = part.len() as u32;
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(part);
}

/// Prefix covering every cell of a table.
#[must_use]
pub fn table_prefix(table: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(4 + table.len());
    push_component(&mut key, table.as_bytes());
    key
}

/// Prefix covering every cell of a row.
#[must_use]
pub fn row_prefix(table: &str, row: &[u8]) -> Vec<u8> {
    let mut key = table_prefix(table);
    push_component(&mut key, row);
    key
}

/// Prefix covering every version of one column.
#[must_use]
pub fn column_prefix(table: &str, row: &[u8], family: &str, qualifier: &[u8]) -> Vec<u8> {
    let mut key = row_prefix(table, row);
    push_component(&mut key, family.as_bytes());
    push_component(&mut key, qualifier);
    key
}

/// Full key of one cell version.
#[must_use]
pub fn cell_key(
    table: &str,
    row: &[u8],
    family: &str,
    qualifier: &[u8],
    timestamp_micros: u64,
) -> Vec<u8> {
    let mut key = column_prefix(table, row, family, qualifier);
    key.extend_from_slice(&(!timestamp_micros).to_be_bytes());
    key
}

/// Create a table schema key from a table name.
#[must_use]
pub fn table_key(table: &str) -> Vec<u8> {
    table.as_bytes().to_vec()
}

/// Decode a full cell key.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the key is truncated or a name
/// component is not UTF-8.
pub fn decode_cell_key(key: &[u8]) -> Result<CellKey> {
    let mut rest = key;
    let table = take_component(&mut rest)?;
    let row = take_component(&mut rest)?;
    let family = take_component(&mut rest)?;
    let qualifier = take_component(&mut rest)?;

    let inverted: [u8; 8] = rest
        .try_into()
        .map_err(|_| malformed("timestamp suffix must be 8 bytes"))?;

    Ok(CellKey {
        table: String::from_utf8(table.to_vec()).map_err(|_| malformed("table is not UTF-8"))?,
        row: row.to_vec(),
        family: String::from_utf8(family.to_vec())
            .map_err(|_| malformed("family is not UTF-8"))?,
        qualifier: qualifier.to_vec(),
        timestamp_micros: !u64::from_be_bytes(inverted),
    })
}

fn take_component<'a>(rest: &mut &'a [u8]) -> Result<&'a [u8]> {
    if rest.len() < 4 {
        return Err(malformed("component length truncated"));
    }
    let (len_bytes, tail) = rest.split_at(4);
    let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if tail.len() < len {
        return Err(malformed("component body truncated"));
    }
    let (part, tail) = tail.split_at(len);
    *rest = tail;
    Ok(part)
}

fn malformed(reason: &str) -> StoreError {
    StoreError::Serialization(format!("malformed cell key: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_key_decodes() {
        let key = cell_key("poems", b"poem7", "cf1", b"poem", 1_700_000_000_000_000);
        let decoded = decode_cell_key(&key).unwrap();

        assert_eq!(decoded.table, "poems");
        assert_eq!(decoded.row, b"poem7");
        assert_eq!(decoded.family, "cf1");
        assert_eq!(decoded.qualifier, b"poem");
        assert_eq!(decoded.timestamp_micros, 1_700_000_000_000_000);
    }

    #[test]
    fn newer_versions_sort_first() {
        let older = cell_key("poems", b"poem1", "cf1", b"poem", 100);
        let newer = cell_key("poems", b"poem1", "cf1", b"poem", 200);
        assert!(newer < older);
    }

    #[test]
    fn row_prefix_does_not_match_longer_row() {
        let key = cell_key("poems", b"poem10", "cf1", b"poem", 1);
        assert!(key.starts_with(&row_prefix("poems", b"poem10")));
        assert!(!key.starts_with(&row_prefix("poems", b"poem1")));
    }

    #[test]
    fn table_prefix_does_not_match_other_table() {
        let key = cell_key("poems2", b"poem0", "cf1", b"poem", 1);
        assert!(!key.starts_with(&table_prefix("poems")));
    }

    #[test]
    fn truncated_key_is_rejected() {
        let key = cell_key("poems", b"poem0", "cf1", b"poem", 1);
        assert!(matches!(
            decode_cell_key(&key[..key.len() - 3]),
            Err(StoreError::Serialization(_))
        ));
    }
}
