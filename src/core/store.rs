//! Ledger store service
//!
//! `LedgerStore` is the single object callers talk to. It owns the live
//! `LedgerState`, the `OperationEngine`, the `PersistenceAdapter` and the
//! `SubscriptionBus`, and runs every mutation to completion before returning:
//!
//! 1. the engine validates and applies one delta to the state
//! 2. the new snapshot is handed to persistence
//! 3. subscribers are notified with the same snapshot
//!
//! A failed save is logged and does not fail the mutation; the in-memory state
//! is authoritative and already visible to readers.

use crate::core::engine::OperationEngine;
use crate::core::ledger_state::LedgerState;
use crate::core::subscription::{Subscription, SubscriptionBus};
use crate::core::traits::KeyValueStorage;
use crate::io::persistence::PersistenceAdapter;
use crate::types::{
    Account, AccountId, AccountStatus, AppliedEffect, Category, Currency, LedgerSnapshot,
    Operation, OperationError, StorageError, Transaction, TransactionId, TransactionStatus,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

/// Outcome counts of a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Operations accepted by the engine
    pub applied: usize,
    /// Operations the engine rejected
    pub rejected: usize,
    /// Rows that could not be turned into an operation
    pub malformed: usize,
}

/// Service object holding the live ledger
pub struct LedgerStore<S: KeyValueStorage> {
    state: LedgerState,
    engine: OperationEngine,
    persistence: PersistenceAdapter<S>,
    bus: SubscriptionBus,
}

impl<S: KeyValueStorage> LedgerStore<S> {
    /// Open a store, loading the persisted ledger (or the seed)
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` only if the loaded snapshot cannot become
    /// live state, which a validated seed rules out.
    pub fn open(persistence: PersistenceAdapter<S>) -> Result<Self, StorageError> {
        Self::with_engine(persistence, OperationEngine::new())
    }

    /// Open a store with a custom engine (for example one with a fixed clock)
    pub fn with_engine(
        persistence: PersistenceAdapter<S>,
        engine: OperationEngine,
    ) -> Result<Self, StorageError> {
        let state = LedgerState::from_snapshot(persistence.load())?;
        info!(
            key = persistence.key(),
            accounts = state.list_accounts().len(),
            transactions = state.list_transactions(None).len(),
            "ledger store opened"
        );
        Ok(LedgerStore {
            state,
            engine,
            persistence,
            bus: SubscriptionBus::new(),
        })
    }

    pub fn get_account(&self, id: AccountId) -> Option<&Account> {
        self.state.get_account(id)
    }

    pub fn list_accounts(&self) -> Vec<&Account> {
        self.state.list_accounts()
    }

    /// Transactions, most recent first, optionally for one account
    pub fn list_transactions(&self, account: Option<AccountId>) -> Vec<&Transaction> {
        self.state.list_transactions(account)
    }

    pub fn get_transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.state.get_transaction(id)
    }

    pub fn total_balance(&self, currency: Currency) -> Decimal {
        self.state.total_balance(currency)
    }

    pub fn spending_by_category(&self, currency: Currency) -> Vec<(Category, Decimal)> {
        self.state.spending_by_category(currency)
    }

    /// Deep copy of the current ledger
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.snapshot()
    }

    /// Read-only view of the live state
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    /// Handle to the bus, for subscribing from inside listeners
    pub fn bus(&self) -> &SubscriptionBus {
        &self.bus
    }

    /// Register a listener called with a snapshot after every change
    pub fn subscribe(&self, listener: impl Fn(&LedgerSnapshot) + 'static) -> Subscription {
        self.bus.subscribe(listener)
    }

    /// Validate and apply an operation, then persist and notify
    ///
    /// # Errors
    ///
    /// Returns the engine's `OperationError`; nothing changes, nothing is
    /// saved and nobody is notified.
    pub fn apply(&mut self, operation: Operation) -> Result<AppliedEffect, OperationError> {
        let name = operation.name();
        match self.engine.apply(&mut self.state, operation) {
            Ok(effect) => {
                debug!(
                    operation = name,
                    transactions = effect.transactions.len(),
                    "operation applied"
                );
                self.commit();
                Ok(effect)
            }
            Err(error) => {
                debug!(operation = name, %error, "operation rejected");
                Err(error)
            }
        }
    }

    /// Complete or fail a pending transaction
    pub fn settle(
        &mut self,
        tx: TransactionId,
        outcome: TransactionStatus,
    ) -> Result<AppliedEffect, OperationError> {
        let effect = self.engine.settle(&mut self.state, tx, outcome)?;
        debug!(tx, %outcome, "transaction settled");
        self.commit();
        Ok(effect)
    }

    /// Block or unblock an account
    pub fn set_account_status(
        &mut self,
        account: AccountId,
        status: AccountStatus,
    ) -> Result<Account, OperationError> {
        let updated = self.engine.set_account_status(&mut self.state, account, status)?;
        info!(account, %status, "account status changed");
        self.commit();
        Ok(updated)
    }

    /// Replace the ledger with a fresh copy of the seed
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` only if the seed cannot become live state.
    pub fn reset(&mut self) -> Result<(), StorageError> {
        let snapshot = self.persistence.reset();
        self.state = LedgerState::from_snapshot(snapshot.clone())?;
        self.bus.notify(&snapshot);
        Ok(())
    }

    /// Apply a sequence of parsed rows in order
    ///
    /// Malformed rows and rejected operations are logged and skipped; each
    /// accepted operation is persisted and notified on its own.
    pub fn run_batch<I>(&mut self, rows: I) -> BatchReport
    where
        I: IntoIterator<Item = Result<Operation, String>>,
    {
        let mut report = BatchReport::default();
        for row in rows {
            let operation = match row {
                Ok(operation) => operation,
                Err(reason) => {
                    warn!(%reason, "skipping malformed row");
                    report.malformed += 1;
                    continue;
                }
            };
            let name = operation.name();
            match self.apply(operation) {
                Ok(_) => report.applied += 1,
                Err(error) => {
                    warn!(operation = name, %error, "operation rejected");
                    report.rejected += 1;
                }
            }
        }
        info!(
            applied = report.applied,
            rejected = report.rejected,
            malformed = report.malformed,
            "batch finished"
        );
        report
    }

    fn commit(&self) {
        let snapshot = self.state.snapshot();
        if let Err(error) = self.persistence.save(&snapshot) {
            error!(key = self.persistence.key(), %error, "failed to persist ledger");
        }
        self.bus.notify(&snapshot);
    }
}
