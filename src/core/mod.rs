//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - Seams for storage media and clocks
//! - `ledger_state` - In-memory accounts and transactions, mutated only by deltas
//! - `engine` - Operation validation and delta planning
//! - `seed` - The canonical initial dataset
//! - `subscription` - Observer registry notified after every change
//! - `store` - Service object tying state, engine, persistence and observers together

pub mod engine;
pub mod ledger_state;
pub mod seed;
pub mod store;
pub mod subscription;
pub mod traits;

pub use engine::OperationEngine;
pub use ledger_state::{LedgerDelta, LedgerState};
pub use seed::{SeedDataset, DATASET_VERSION};
pub use store::{BatchReport, LedgerStore};
pub use subscription::{ListenerId, Subscription, SubscriptionBus};
pub use traits::{Clock, FixedClock, KeyValueStorage, SystemClock};
