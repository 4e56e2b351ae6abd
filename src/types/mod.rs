//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account-related types
//! - `currency`: Validated ISO currency codes
//! - `transaction`: Transaction-related types and identifiers
//! - `operation`: Operation requests and their applied effects
//! - `snapshot`: Serializable copies of the ledger
//! - `error`: Error types for the ledger store

pub mod account;
pub mod currency;
pub mod error;
pub mod operation;
pub mod snapshot;
pub mod transaction;

pub use account::{Account, AccountId, AccountKind, AccountStatus};
pub use currency::Currency;
pub use error::{CurrencyError, OperationError, SnapshotError, StorageError};
pub use operation::{AppliedEffect, Operation};
pub use snapshot::{LedgerSnapshot, MAX_STORED_TRANSACTION_ID};
pub use transaction::{Category, Transaction, TransactionId, TransactionKind, TransactionStatus};
