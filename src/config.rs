//! Runtime configuration for the ledger store binary

use crate::io::persistence::DEFAULT_KEY;
use std::path::PathBuf;

/// Directory used when none is given
pub const DEFAULT_DATA_DIR: &str = "ledger-data";

/// Log filter used when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Where and how the ledger is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the ledger document
    pub data_dir: PathBuf,

    /// Storage key; the document is `<data_dir>/<key>.json`
    pub storage_key: String,

    /// Hand durable writes to a background task
    pub write_behind: bool,

    /// Default tracing filter directive
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_KEY.to_string(),
            write_behind: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl StoreConfig {
    /// Path of the ledger document this configuration points at
    pub fn document_path(&self) -> PathBuf {
        crate::io::storage::FileStorage::document_path(&self.data_dir, &self.storage_key)
    }
}
