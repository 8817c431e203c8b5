//! Common test utilities for poembot service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use poembot_service::{create_router, AppState, ServiceConfig};
use poembot_store::{PoemsTable, ReadRange, RocksStore};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The poems table behind the server, for seeding.
    pub poems: PoemsTable,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a harness with a provisioned, empty poems table.
    pub fn new() -> Self {
        Self::with_read_range(ReadRange::default())
    }

    /// Create a harness whose service draws indices from `read_range`.
    pub fn with_read_range(read_range: ReadRange) -> Self {
        let harness = Self::unprovisioned(read_range);
        harness.poems.provision().expect("Failed to provision table");
        harness
    }

    /// Create a harness over a database without the poems table.
    pub fn unprovisioned(read_range: ReadRange) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");
        let poems = PoemsTable::new(Arc::new(store));

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            secondary_dir: None,
            read_range,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(poems.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            poems,
            _temp_dir: temp_dir,
        }
    }

    /// Write `texts` as one batch, `texts[i]` landing at index `i`.
    pub fn seed(&self, texts: &[String]) {
        let batch: Vec<Vec<u8>> = texts.iter().map(|t| t.clone().into_bytes()).collect();
        self.poems.write_batch(&batch).expect("Failed to seed poems");
    }

    /// Seed `count` distinct poems `"Poem {i}"`.
    pub fn seed_numbered(&self, count: u32) -> Vec<String> {
        let texts: Vec<String> = (0..count).map(|i| format!("Poem {i}")).collect();
        self.seed(&texts);
        texts
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
