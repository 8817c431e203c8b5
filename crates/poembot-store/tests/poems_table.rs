//! Poems table integration tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use poembot_core::PoemIndex;
use poembot_store::poems::DEFAULT_READ_RANGE;
use poembot_store::{PoemsTable, RocksStore, StoreError};

fn provisioned_table() -> (PoemsTable, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let store = RocksStore::open(dir.path()).expect("Failed to open store");
    let poems = PoemsTable::new(Arc::new(store));
    poems.provision().expect("Failed to provision table");
    (poems, dir)
}

fn numbered_batch(count: usize, tag: &str) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("{tag} poem {i}\nline two").into_bytes())
        .collect()
}

// ============================================================================
// Batch writes
// ============================================================================

#[test]
fn batch_write_round_trips_every_row() {
    let (poems, _dir) = provisioned_table();
    let batch = numbered_batch(25, "first");

    poems.write_batch(&batch).unwrap();

    for (i, expected) in batch.iter().enumerate() {
        let index = PoemIndex::new(u32::try_from(i).unwrap());
        let text = poems.read_poem(index).unwrap();
        assert_eq!(text.as_bytes(), expected.as_slice());
    }
}

#[test]
fn round_trip_preserves_unicode() {
    let (poems, _dir) = provisioned_table();
    let poem = "Rosen sind rot 🌹\nVeilchen sind blau — ünd so weiter";

    poems.write_batch(&[poem.as_bytes().to_vec()]).unwrap();

    assert_eq!(poems.read_poem(PoemIndex::new(0)).unwrap(), poem);
}

#[test]
fn rewrite_overwrites_same_keys() {
    let (poems, _dir) = provisioned_table();

    poems.write_batch(&numbered_batch(3, "old")).unwrap();
    std::thread::sleep(Duration::from_millis(2));
    poems.write_batch(&numbered_batch(3, "new")).unwrap();

    for i in 0..3 {
        let text = poems.read_poem(PoemIndex::new(i)).unwrap();
        assert!(text.starts_with("new poem"), "row {i} still holds {text:?}");
    }
}

// ============================================================================
// Random reads
// ============================================================================

#[test]
fn random_reads_only_return_written_poems() {
    let (poems, _dir) = provisioned_table();
    let batch = numbered_batch(DEFAULT_READ_RANGE as usize, "full");
    poems.write_batch(&batch).unwrap();

    let written: HashSet<String> = batch
        .into_iter()
        .map(|bytes| String::from_utf8(bytes).unwrap())
        .collect();

    for _ in 0..1000 {
        let poem = poems.read_random().unwrap();
        assert!(written.contains(&poem), "unexpected poem {poem:?}");
    }
}

#[test]
fn random_read_fails_on_unpopulated_index() {
    let (poems, _dir) = provisioned_table();
    poems.write_batch(&numbered_batch(10, "short")).unwrap();

    // With only 10 of 500 rows written, a seeded run must hit a gap
    let mut rng = StdRng::seed_from_u64(42);
    let mut found = 0;
    let mut missing = 0;
    for _ in 0..200 {
        match poems.read_random_with(&mut rng, DEFAULT_READ_RANGE) {
            Ok(poem) => {
                assert!(poem.starts_with("short poem"));
                found += 1;
            }
            Err(StoreError::NotFound { row_key }) => {
                let index: PoemIndex = row_key.parse().unwrap();
                assert!(index.value() >= 10);
                missing += 1;
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    assert!(missing > 0);
    assert_eq!(found + missing, 200);
}

// ============================================================================
// Version retention
// ============================================================================

#[test]
fn third_write_evicts_oldest_version() {
    let (poems, _dir) = provisioned_table();
    let index = PoemIndex::new(0);

    let mut timestamps = Vec::new();
    for generation in ["one", "two", "three"] {
        poems.write_batch(&[generation.as_bytes().to_vec()]).unwrap();
        timestamps.push(poems.read_versions(index).unwrap()[0].timestamp_micros);
        std::thread::sleep(Duration::from_millis(2));
    }

    let versions = poems.read_versions(index).unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].value, b"three");
    assert_eq!(versions[1].value, b"two");

    assert!(matches!(
        poems.read_version(index, timestamps[0]),
        Err(StoreError::NotFound { .. })
    ));
    assert_eq!(poems.read_version(index, timestamps[1]).unwrap(), "two");
    assert_eq!(poems.read_version(index, timestamps[2]).unwrap(), "three");

    // Unpinned reads get the latest
    assert_eq!(poems.read_poem(index).unwrap(), "three");
}
