//! Error types for the ledger store
//!
//! This module defines every error the store can produce, one enum per layer.
//!
//! # Error Categories
//!
//! - **Operation Errors**: validation failures of a submitted operation
//!   (unknown account, currency mismatch, invalid amount, insufficient funds, ...)
//! - **Snapshot Errors**: structural problems in a ledger snapshot
//! - **Storage Errors**: I/O and serialization failures of the durable medium
//! - **Currency Errors**: malformed currency codes

use super::account::AccountId;
use super::currency::Currency;
use super::transaction::{TransactionId, TransactionStatus};
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when an operation is rejected
///
/// Every variant is returned before any mutation happens, so a rejected
/// operation never leaves the ledger partially changed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationError {
    /// Referenced account does not exist
    #[error("Account {account} not found")]
    NotFound {
        /// The unknown account id
        account: AccountId,
    },

    /// Source and destination of a two-account operation are the same
    #[error("Source and destination are the same account {account}")]
    SameAccount {
        /// The account named twice
        account: AccountId,
    },

    /// Referenced account is blocked
    #[error("Account {account} is blocked")]
    AccountBlocked {
        /// The blocked account id
        account: AccountId,
    },

    /// Operation currency differs from an account's currency
    #[error("Currency mismatch on account {account}: account holds {expected}, operation uses {actual}")]
    CurrencyMismatch {
        /// Account whose currency differs
        account: AccountId,
        /// Currency of the account
        expected: Currency,
        /// Currency named by the operation
        actual: Currency,
    },

    /// Exchange rate is missing its meaning (non-positive, or not 1 within one currency)
    #[error("Invalid exchange rate {rate}")]
    InvalidRate {
        /// The rejected rate
        rate: Decimal,
    },

    /// Amount is non-positive, too precise, or too large
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
        /// Why it was rejected
        reason: String,
    },

    /// Deposit term outside the accepted range
    #[error("Invalid deposit term of {term_days} days")]
    InvalidTerm {
        /// The rejected term
        term_days: u32,
    },

    /// Debit exceeds the source balance
    #[error("Insufficient funds on account {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Account being debited
        account: AccountId,
        /// Current balance
        available: Decimal,
        /// Requested debit
        requested: Decimal,
    },

    /// Referenced transaction does not exist
    #[error("Transaction {tx} not found")]
    TransactionNotFound {
        /// The unknown transaction id
        tx: TransactionId,
    },

    /// Only pending transactions may settle
    #[error("Transaction {tx} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Transaction id
        tx: TransactionId,
        /// Current status
        from: TransactionStatus,
        /// Requested status
        to: TransactionStatus,
    },

    /// A transaction id was assigned twice
    #[error("Duplicate transaction ID {tx}")]
    DuplicateTransaction {
        /// The duplicated id
        tx: TransactionId,
    },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account whose balance would overflow
        account: AccountId,
    },
}

// Helper functions for creating common errors

impl OperationError {
    /// Create a NotFound error
    pub fn not_found(account: AccountId) -> Self {
        OperationError::NotFound { account }
    }

    /// Create an AccountBlocked error
    pub fn account_blocked(account: AccountId) -> Self {
        OperationError::AccountBlocked { account }
    }

    /// Create a CurrencyMismatch error
    pub fn currency_mismatch(account: AccountId, expected: Currency, actual: Currency) -> Self {
        OperationError::CurrencyMismatch {
            account,
            expected,
            actual,
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal, reason: &str) -> Self {
        OperationError::InvalidAmount {
            amount,
            reason: reason.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, available: Decimal, requested: Decimal) -> Self {
        OperationError::InsufficientFunds {
            account,
            available,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        OperationError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }
}

/// Structural problem found while validating a ledger snapshot
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    /// Stored version differs from the dataset version
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version the store understands
        expected: u32,
        /// Version found in storage
        found: u32,
    },

    /// Two accounts share an id
    #[error("duplicate account {account}")]
    DuplicateAccount {
        /// The duplicated id
        account: AccountId,
    },

    /// Two transactions share an id
    #[error("duplicate transaction {tx}")]
    DuplicateTransaction {
        /// The duplicated id
        tx: TransactionId,
    },

    /// Transaction posted to an account that does not exist
    #[error("transaction {tx} references unknown account {account}")]
    UnknownAccount {
        /// Transaction id
        tx: TransactionId,
        /// Missing account id
        account: AccountId,
    },

    /// Income/expense kind disagrees with the amount sign
    #[error("transaction {tx} kind disagrees with its amount sign")]
    KindSignMismatch {
        /// Transaction id
        tx: TransactionId,
    },

    /// More fraction digits than the currency allows
    #[error("excess precision in {context}")]
    ExcessPrecision {
        /// What carried the amount
        context: String,
    },

    /// Balance differs from opening balance plus completed history
    #[error("account {account} balance {actual} does not match history ({expected})")]
    BalanceMismatch {
        /// Account id
        account: AccountId,
        /// Balance implied by history
        expected: Decimal,
        /// Stored balance
        actual: Decimal,
    },

    /// Transaction id leaves no room for the ids of a further operation
    #[error("transaction id {tx} exhausts the id space")]
    IdExhausted {
        /// Transaction id
        tx: TransactionId,
    },

    /// Summing the history overflowed
    #[error("balance history of account {account} overflows")]
    Overflow {
        /// Account id
        account: AccountId,
    },
}

/// Failure of the durable storage medium
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// I/O error while reading or writing
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// Snapshot could not be serialized
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serializer failure
        message: String,
    },

    /// Stored payload is unreadable or fails validation
    ///
    /// Recovered inside `PersistenceAdapter::load` by falling back to the seed.
    #[error("Stored ledger is corrupt: {reason}")]
    Corrupt {
        /// What was wrong with the payload
        reason: String,
    },

    /// The background writer is no longer running
    #[error("Storage writer has stopped")]
    WriterClosed,
}

// Conversion from io::Error to StorageError
impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::Io {
            message: error.to_string(),
        }
    }
}

// Conversion from SnapshotError to StorageError
impl From<SnapshotError> for StorageError {
    fn from(error: SnapshotError) -> Self {
        StorageError::Corrupt {
            reason: error.to_string(),
        }
    }
}

/// Malformed currency code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// Not three ASCII letters
    #[error("Invalid currency code '{code}'")]
    InvalidCode {
        /// The rejected code
        code: String,
    },
}
