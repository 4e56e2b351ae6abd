//! Benchmark suite for ledger operations
//!
//! Measures the cost of the mutation path with the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! - `apply_transfers` - engine and state only, no persistence
//! - `store_transfers` - full store path: engine, in-memory save and notification
//! - `snapshot_round_trip` - serialize and validate the canonical ledger

use bank_ledger_store::core::{LedgerState, LedgerStore, OperationEngine, SeedDataset};
use bank_ledger_store::io::{MemoryStorage, PersistenceAdapter};
use bank_ledger_store::{Currency, LedgerSnapshot, Operation};
use rust_decimal::Decimal;

fn main() {
    divan::main();
}

fn transfer(i: usize) -> Operation {
    let (from, to) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
    Operation::Transfer {
        from,
        to,
        amount: Decimal::new(1_00, 2),
        currency: Currency::RUB,
    }
}

/// Apply alternating transfers directly against a LedgerState
#[divan::bench(args = [100, 1_000])]
fn apply_transfers(bencher: divan::Bencher, count: usize) {
    let engine = OperationEngine::new();
    bencher
        .with_inputs(|| {
            LedgerState::from_snapshot(SeedDataset::canonical().snapshot())
                .expect("canonical seed is valid")
        })
        .bench_local_values(|mut state| {
            for i in 0..count {
                engine.apply(&mut state, transfer(i)).expect("transfer applies");
            }
            state
        });
}

/// Apply transfers through the store, persisting each to memory
#[divan::bench(args = [100, 1_000])]
fn store_transfers(bencher: divan::Bencher, count: usize) {
    bencher
        .with_inputs(|| {
            LedgerStore::open(PersistenceAdapter::new(
                MemoryStorage::new(),
                SeedDataset::canonical(),
            ))
            .expect("store opens")
        })
        .bench_local_values(|mut store| {
            for i in 0..count {
                store.apply(transfer(i)).expect("transfer applies");
            }
            store
        });
}

/// Serialize, parse and validate the canonical snapshot
#[divan::bench]
fn snapshot_round_trip() -> LedgerSnapshot {
    let json = serde_json::to_string(&SeedDataset::canonical().snapshot()).expect("serializes");
    let snapshot: LedgerSnapshot = serde_json::from_str(&json).expect("parses");
    snapshot.validate().expect("valid");
    snapshot
}
