//! Service configuration.

use poembot_store::poems::DEFAULT_READ_RANGE;
use poembot_store::ReadRange;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/poembot").
    pub data_dir: String,

    /// Directory for a read-only secondary instance. When set, the service
    /// follows the database at `data_dir` instead of opening it directly, so
    /// the generator can write while the service runs.
    pub secondary_dir: Option<String>,

    /// Index range for random reads (default: fixed 500).
    pub read_range: ReadRange,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/poembot".into()),
            secondary_dir: std::env::var("SECONDARY_DIR").ok(),
            read_range: std::env::var("POEM_READ_RANGE")
                .ok()
                .and_then(|s| parse_read_range(&s))
                .unwrap_or_default(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// Parse `fixed`, `written`, or a number of indices to draw from.
fn parse_read_range(value: &str) -> Option<ReadRange> {
    match value.trim() {
        "fixed" => Some(ReadRange::Fixed(DEFAULT_READ_RANGE)),
        "written" => Some(ReadRange::Written),
        other => match other.parse() {
            Ok(upper) => Some(ReadRange::Fixed(upper)),
            Err(_) => {
                tracing::warn!(value = %other, "Unrecognized POEM_READ_RANGE, using default");
                None
            }
        },
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/poembot".into(),
            secondary_dir: None,
            read_range: ReadRange::default(),
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_range_values() {
        assert_eq!(parse_read_range("fixed"), Some(ReadRange::Fixed(500)));
        assert_eq!(parse_read_range(" written "), Some(ReadRange::Written));
        assert_eq!(parse_read_range("250"), Some(ReadRange::Fixed(250)));
        assert_eq!(parse_read_range("most"), None);
    }

    #[test]
    fn default_reads_fixed_range() {
        assert_eq!(ServiceConfig::default().read_range, ReadRange::Fixed(500));
    }
}
