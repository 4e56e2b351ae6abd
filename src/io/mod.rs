//! I/O module
//!
//! Handles durable storage, snapshot persistence and CSV.
//!
//! # Components
//!
//! - `storage` - In-memory and file-backed key-value media
//! - `write_behind` - File medium whose writes run on a background task
//! - `persistence` - Snapshot load/save/reset with seed fallback
//! - `csv_format` - CSV format handling (script rows, report output)
//! - `sync_reader` - Streaming reader over operation scripts

pub mod csv_format;
pub mod persistence;
pub mod storage;
pub mod sync_reader;
pub mod write_behind;

pub use csv_format::{
    convert_operation_record, write_accounts_csv, write_category_summary_csv,
    write_transactions_csv, OperationRecord,
};
pub use persistence::{PersistenceAdapter, DEFAULT_KEY};
pub use storage::{FileStorage, MemoryStorage};
pub use sync_reader::SyncReader;
pub use write_behind::WriteBehindStorage;

use crate::config::StoreConfig;
use crate::core::traits::KeyValueStorage;
use crate::types::StorageError;

/// Open the durable medium selected by `config`
///
/// # Returns
///
/// A boxed [`WriteBehindStorage`] when `write_behind` is set, otherwise a
/// boxed [`FileStorage`], both rooted at `config.data_dir`.
pub fn open_storage(config: &StoreConfig) -> Result<Box<dyn KeyValueStorage>, StorageError> {
    if config.write_behind {
        Ok(Box::new(WriteBehindStorage::new(&config.data_dir)?))
    } else {
        Ok(Box::new(FileStorage::new(&config.data_dir)?))
    }
}
