//! Snapshot persistence with seed fallback
//!
//! `PersistenceAdapter` moves whole `LedgerSnapshot` documents between the
//! store and a [`KeyValueStorage`] medium as JSON. Loading never fails: an
//! absent, unreadable, version-mismatched or inconsistent document is
//! replaced by a fresh copy of the seed, which is written back so the next
//! start finds a valid ledger.

use crate::core::seed::SeedDataset;
use crate::core::traits::KeyValueStorage;
use crate::types::{LedgerSnapshot, SnapshotError, StorageError};
use tracing::{debug, error, info, warn};

/// Storage key used when none is configured
pub const DEFAULT_KEY: &str = "ledger";

/// Loads and saves ledger snapshots under one storage key
pub struct PersistenceAdapter<S: KeyValueStorage> {
    storage: S,
    seed: SeedDataset,
    key: String,
}

impl<S: KeyValueStorage> PersistenceAdapter<S> {
    /// Adapter using [`DEFAULT_KEY`]
    pub fn new(storage: S, seed: SeedDataset) -> Self {
        Self::with_key(storage, seed, DEFAULT_KEY)
    }

    /// Adapter storing the ledger under `key`
    pub fn with_key(storage: S, seed: SeedDataset, key: impl Into<String>) -> Self {
        PersistenceAdapter {
            storage,
            seed,
            key: key.into(),
        }
    }

    /// Load the persisted snapshot, falling back to the seed
    ///
    /// The returned snapshot always passes `LedgerSnapshot::validate` and
    /// carries the seed's version.
    pub fn load(&self) -> LedgerSnapshot {
        match self.read_stored() {
            Ok(Some(snapshot)) => {
                debug!(key = %self.key, accounts = snapshot.accounts.len(), "ledger loaded");
                return snapshot;
            }
            Ok(None) => info!(key = %self.key, "no stored ledger; starting from seed"),
            Err(error) => warn!(key = %self.key, %error, "stored ledger discarded; starting from seed"),
        }

        let snapshot = self.seed.snapshot();
        if let Err(error) = self.save(&snapshot) {
            error!(key = %self.key, %error, "failed to write seed ledger");
        }
        snapshot
    }

    /// Persist `snapshot`, replacing the stored document
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the snapshot cannot be encoded,
    /// or the medium's error if the write fails.
    pub fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), StorageError> {
        let payload =
            serde_json::to_string_pretty(snapshot).map_err(|e| StorageError::Serialization {
                message: e.to_string(),
            })?;
        self.storage.write(&self.key, &payload)
    }

    /// Overwrite the stored document with the seed and return the seed copy
    ///
    /// A failed write is logged; the seed copy is returned either way.
    pub fn reset(&self) -> LedgerSnapshot {
        let snapshot = self.seed.snapshot();
        match self.save(&snapshot) {
            Ok(()) => info!(key = %self.key, version = snapshot.version, "ledger reset to seed"),
            Err(error) => error!(key = %self.key, %error, "failed to write reset ledger"),
        }
        snapshot
    }

    /// Dataset used for fallback and reset
    pub fn seed(&self) -> &SeedDataset {
        &self.seed
    }

    /// Underlying medium
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Key the ledger is stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    fn read_stored(&self) -> Result<Option<LedgerSnapshot>, StorageError> {
        let Some(payload) = self.storage.read(&self.key)? else {
            return Ok(None);
        };
        let snapshot: LedgerSnapshot =
            serde_json::from_str(&payload).map_err(|e| StorageError::Corrupt {
                reason: e.to_string(),
            })?;
        if snapshot.version != self.seed.version() {
            return Err(SnapshotError::VersionMismatch {
                expected: self.seed.version(),
                found: snapshot.version,
            }
            .into());
        }
        snapshot.validate()?;
        Ok(Some(snapshot))
    }
}
