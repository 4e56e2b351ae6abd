//! Bank Ledger Store Library
//! # Overview
//!
//! This library holds a personal banking ledger (accounts and their
//! transaction history) in memory, applies money-moving operations to it
//! atomically, persists it as a versioned JSON snapshot and notifies
//! observers after every change.
//!
//! # Architecture
//!
//! - [`types`] - Domain types (Account, Transaction, Operation, errors)
//! - [`core`] - Business logic:
//!   - [`core::ledger_state`] - The live ledger; mutated only through deltas
//!   - [`core::engine`] - Operation validation and planning
//!   - [`core::seed`] - Canonical initial dataset
//!   - [`core::subscription`] - Change notification
//!   - [`core::store`] - The service object tying it all together
//! - [`io`] - Storage media, snapshot persistence and CSV
//! - [`cli`] - Command-line arguments and command execution
//!
//! # Operations
//!
//! - **Transfer**: Move money between two accounts of one currency
//! - **Payment**: Pay out of an account, optionally naming a merchant
//! - **Exchange**: Convert between accounts at a rate, rounding half-to-even
//! - **DepositOpen**: Place money on a term deposit
//!
//! Every account satisfies `balance == opening_balance + sum(completed amounts)`
//! after every operation, load and reset.

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod types;

pub use config::StoreConfig;
pub use core::{LedgerStore, OperationEngine, SeedDataset, SubscriptionBus};
pub use io::{FileStorage, MemoryStorage, PersistenceAdapter, WriteBehindStorage};
pub use types::{
    Account, AccountId, AccountStatus, AppliedEffect, Category, Currency, LedgerSnapshot,
    Operation, OperationError, StorageError, Transaction, TransactionId, TransactionStatus,
};
