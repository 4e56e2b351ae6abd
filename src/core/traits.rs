//! Core traits for the seams of the ledger store
//!
//! This module defines the trait abstractions that let the store run against
//! different storage media and clocks. Production code uses the filesystem
//! and the system clock; tests swap in memory storage and a fixed clock.

use crate::types::StorageError;
use chrono::{DateTime, Utc};

/// Trait for durable key-value storage media
///
/// Values are whole documents; writes replace the previous value
/// (last write wins). Methods take `&self` so a handle can be shared
/// between the store and an observer such as a test.
pub trait KeyValueStorage {
    /// Read the value stored under `key`, or `None` if absent
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`; removing a missing key succeeds
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Source of transaction timestamps
pub trait Clock {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
