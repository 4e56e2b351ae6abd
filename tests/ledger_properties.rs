//! Ledger-level properties
//!
//! Exercises the store through its public API against small hand-built seeds
//! and the JSON documents in tests/fixtures/snapshots/:
//! - the balance invariant after every kind of mutation
//! - persistence round trips and seed fallback for unusable documents
//! - reset idempotence
//! - rejected operations leaving no trace

use bank_ledger_store::core::{FixedClock, LedgerStore, OperationEngine, SeedDataset};
use bank_ledger_store::io::{FileStorage, MemoryStorage, PersistenceAdapter};
use bank_ledger_store::types::{AccountKind, TransactionKind};
use bank_ledger_store::{
    Account, AccountStatus, Currency, LedgerSnapshot, Operation, OperationError,
    TransactionStatus,
};
use chrono::{DateTime, Utc};
use rstest::rstest;
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use tempfile::TempDir;

/// A = 1000 RUB, B = 0 RUB, C = 0 USD
fn seed() -> SeedDataset {
    SeedDataset::new(
        1,
        vec![
            Account::new(1, "A", AccountKind::Checking, Currency::RUB, Decimal::new(1000, 0)),
            Account::new(2, "B", AccountKind::Savings, Currency::RUB, Decimal::ZERO),
            Account::new(3, "C", AccountKind::Checking, Currency::USD, Decimal::ZERO),
        ],
        vec![],
    )
    .unwrap()
}

fn store_with(seed: SeedDataset) -> (LedgerStore<MemoryStorage>, MemoryStorage) {
    let storage = MemoryStorage::new();
    let engine = OperationEngine::with_clock(FixedClock(
        DateTime::<Utc>::from_timestamp(1_717_243_200, 0).unwrap(),
    ));
    let store = LedgerStore::with_engine(PersistenceAdapter::new(storage.clone(), seed), engine)
        .unwrap();
    (store, storage)
}

fn rub(units: i64) -> Decimal {
    Decimal::new(units, 0)
}

#[test]
fn test_transfer_between_rub_accounts() {
    let (mut store, _) = store_with(seed());
    let total_before = store.total_balance(Currency::RUB);

    let effect = store
        .apply(Operation::Transfer {
            from: 1,
            to: 2,
            amount: rub(300),
            currency: Currency::RUB,
        })
        .unwrap();

    assert_eq!(store.get_account(1).unwrap().balance, rub(700));
    assert_eq!(store.get_account(2).unwrap().balance, rub(300));
    assert_eq!(effect.transactions.len(), 2);
    assert!(effect
        .transactions
        .iter()
        .all(|tx| tx.status == TransactionStatus::Completed));
    assert_eq!(store.total_balance(Currency::RUB), total_before);
    assert_eq!(store.state().verify_invariant(), Ok(()));
}

#[test]
fn test_payment_beyond_balance_is_rejected() {
    let (mut store, _) = store_with(seed());
    store
        .apply(Operation::Transfer {
            from: 1,
            to: 2,
            amount: rub(300),
            currency: Currency::RUB,
        })
        .unwrap();
    let before = store.snapshot();

    let result = store.apply(Operation::Payment {
        account: 1,
        amount: rub(5000),
        purpose: "Laptop".into(),
        merchant: None,
    });

    assert_eq!(
        result,
        Err(OperationError::InsufficientFunds {
            account: 1,
            available: rub(700),
            requested: rub(5000),
        })
    );
    assert_eq!(store.snapshot(), before);
}

#[test]
fn test_exchange_rub_to_usd() {
    let (mut store, _) = store_with(seed());

    let effect = store
        .apply(Operation::Exchange {
            from: 1,
            to: 3,
            source_amount: rub(1000),
            rate: Decimal::new(11, 3),
        })
        .unwrap();

    assert_eq!(store.get_account(3).unwrap().balance, Decimal::new(1100, 2));
    assert_eq!(store.get_account(1).unwrap().balance, Decimal::ZERO);
    assert_eq!(effect.balance_of(3), Some(Decimal::new(1100, 2)));
    assert_eq!(effect.transactions[1].kind, TransactionKind::Income);
    assert_eq!(store.state().verify_invariant(), Ok(()));
}

#[rstest]
#[case::unknown_account(Operation::Payment { account: 9, amount: rub(1), purpose: String::new(), merchant: None })]
#[case::currency_mismatch(Operation::Transfer { from: 1, to: 3, amount: rub(1), currency: Currency::RUB })]
#[case::zero_amount(Operation::Transfer { from: 1, to: 2, amount: Decimal::ZERO, currency: Currency::RUB })]
#[case::negative_rate(Operation::Exchange { from: 1, to: 3, source_amount: rub(1), rate: Decimal::new(-1, 2) })]
#[case::long_term(Operation::DepositOpen { source_account: 1, amount: rub(1), term_days: 20_000 })]
#[case::overdraft(Operation::DepositOpen { source_account: 2, amount: rub(1), term_days: 30 })]
#[case::exchange_overdraft(Operation::Exchange { from: 2, to: 3, source_amount: rub(100), rate: Decimal::new(11, 3) })]
fn test_rejections_leave_no_trace(#[case] operation: Operation) {
    let (mut store, storage) = store_with(seed());
    let before = store.snapshot();
    let notifications = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&notifications);
    store.subscribe(move |_| *counter.borrow_mut() += 1);
    let stored_before = storage.read_stored();

    assert!(store.apply(operation).is_err());

    assert_eq!(store.snapshot(), before);
    assert_eq!(storage.read_stored(), stored_before);
    assert_eq!(*notifications.borrow(), 0);
}

#[test]
fn test_invariant_holds_after_every_mutation() {
    let (mut store, _) = store_with(SeedDataset::canonical());
    assert_eq!(store.state().verify_invariant(), Ok(()));

    store
        .apply(Operation::Payment {
            account: 1,
            amount: Decimal::new(12_345, 2),
            purpose: "Books".into(),
            merchant: Some("Bookshop".into()),
        })
        .unwrap();
    assert_eq!(store.state().verify_invariant(), Ok(()));

    store
        .apply(Operation::Exchange {
            from: 3,
            to: 4,
            source_amount: Decimal::new(1_001, 2),
            rate: Decimal::new(925, 3),
        })
        .unwrap();
    assert_eq!(store.state().verify_invariant(), Ok(()));

    store
        .apply(Operation::DepositOpen {
            source_account: 2,
            amount: rub(50_000),
            term_days: 180,
        })
        .unwrap();
    assert_eq!(store.state().verify_invariant(), Ok(()));

    store.settle(11, TransactionStatus::Failed).unwrap();
    assert_eq!(store.state().verify_invariant(), Ok(()));

    store.set_account_status(6, AccountStatus::Active).unwrap();
    store
        .apply(Operation::Transfer {
            from: 1,
            to: 6,
            amount: rub(100),
            currency: Currency::RUB,
        })
        .unwrap();
    assert_eq!(store.state().verify_invariant(), Ok(()));

    store.reset().unwrap();
    assert_eq!(store.state().verify_invariant(), Ok(()));
}

#[test]
fn test_settled_transaction_cannot_settle_again() {
    let (mut store, _) = store_with(SeedDataset::canonical());
    store.settle(11, TransactionStatus::Completed).unwrap();

    assert_eq!(
        store.settle(11, TransactionStatus::Failed),
        Err(OperationError::InvalidStatusTransition {
            tx: 11,
            from: TransactionStatus::Completed,
            to: TransactionStatus::Failed,
        })
    );
}

#[test]
fn test_save_then_load_is_deep_equal() {
    let (mut store, storage) = store_with(SeedDataset::canonical());
    store
        .apply(Operation::Transfer {
            from: 1,
            to: 2,
            amount: Decimal::new(75_050, 2),
            currency: Currency::RUB,
        })
        .unwrap();
    let snapshot = store.snapshot();

    let adapter = PersistenceAdapter::new(storage, SeedDataset::canonical());
    adapter.save(&snapshot).unwrap();
    assert_eq!(adapter.load(), snapshot);
}

#[test]
fn test_reset_twice_is_identical() {
    let (mut store, _) = store_with(SeedDataset::canonical());
    store
        .apply(Operation::Payment {
            account: 4,
            amount: Decimal::new(500, 2),
            purpose: "Coffee".into(),
            merchant: None,
        })
        .unwrap();

    store.reset().unwrap();
    let first = store.snapshot();
    store.reset().unwrap();

    assert_eq!(store.snapshot(), first);
    assert_eq!(first, SeedDataset::canonical().snapshot());
}

#[test]
fn test_listeners_see_every_change_in_order() {
    let (mut store, _) = store_with(seed());
    let balances = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&balances);
    let subscription = store.subscribe(move |snapshot: &LedgerSnapshot| {
        sink.borrow_mut().push(snapshot.accounts[0].balance);
    });

    for amount in [100, 200] {
        store
            .apply(Operation::Transfer {
                from: 1,
                to: 2,
                amount: rub(amount),
                currency: Currency::RUB,
            })
            .unwrap();
    }
    subscription.unsubscribe();
    store.reset().unwrap();

    assert_eq!(*balances.borrow(), vec![rub(900), rub(700)]);
}

#[test]
fn test_valid_stored_ledger_is_loaded() {
    let dir = TempDir::new().unwrap();
    fs::copy(
        "tests/fixtures/snapshots/valid_custom.json",
        dir.path().join("ledger.json"),
    )
    .unwrap();

    let store = LedgerStore::open(PersistenceAdapter::new(
        FileStorage::new(dir.path()).unwrap(),
        SeedDataset::canonical(),
    ))
    .unwrap();

    assert_eq!(store.list_accounts().len(), 2);
    assert_eq!(store.get_account(1).unwrap().balance, Decimal::new(90_000, 2));
    assert_eq!(
        store.get_account(2).unwrap().status,
        AccountStatus::Blocked
    );
    assert_eq!(store.list_transactions(None)[0].id, 2);
}

#[rstest]
#[case("malformed.json")]
#[case("missing_fields.json")]
#[case("version_mismatch.json")]
#[case("unbalanced.json")]
#[case("dangling_reference.json")]
#[case("kind_sign_mismatch.json")]
#[case("excess_precision.json")]
#[case("duplicate_ids.json")]
#[case("id_exhausted.json")]
#[case("id_without_headroom.json")]
fn test_unusable_stored_ledger_falls_back_to_seed(#[case] fixture: &str) {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("ledger.json");
    fs::copy(format!("tests/fixtures/snapshots/{}", fixture), &document).unwrap();

    let adapter = PersistenceAdapter::new(
        FileStorage::new(dir.path()).unwrap(),
        SeedDataset::canonical(),
    );
    let loaded = adapter.load();

    assert_eq!(loaded, SeedDataset::canonical().snapshot());
    // The seed was written back over the unusable document
    let rewritten: LedgerSnapshot =
        serde_json::from_str(&fs::read_to_string(&document).unwrap()).unwrap();
    assert_eq!(rewritten, loaded);
}

/// Convenience for comparing what a test medium holds
trait ReadStored {
    fn read_stored(&self) -> Option<String>;
}

impl ReadStored for MemoryStorage {
    fn read_stored(&self) -> Option<String> {
        use bank_ledger_store::core::KeyValueStorage;
        self.read("ledger").unwrap()
    }
}
