//! Ledger state module
//!
//! This module provides the `LedgerState` struct, the single in-memory source
//! of truth for accounts and transactions.
//!
//! The LedgerState is responsible for:
//! - Holding accounts keyed by id and transactions in insertion order
//! - Answering read queries (accounts, transactions, totals, category summaries)
//! - Applying a `LedgerDelta` as one all-or-nothing step
//! - Checking the balance/history invariant
//!
//! # Atomicity
//!
//! `apply_delta` is the only mutation entry point. It validates the complete
//! delta against the current state first and only then mutates, so a failed
//! delta leaves the state exactly as it was.

use crate::types::{
    Account, AccountId, AccountStatus, Category, Currency, LedgerSnapshot, OperationError,
    SnapshotError, Transaction, TransactionId, TransactionKind, TransactionStatus,
    MAX_STORED_TRANSACTION_ID,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Complete set of changes produced by one operation
///
/// Built by the operation engine and handed to [`LedgerState::apply_delta`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerDelta {
    /// Signed amounts added to account balances
    pub balance_deltas: Vec<(AccountId, Decimal)>,

    /// New transactions, appended in order
    pub transactions: Vec<Transaction>,

    /// Status changes of existing pending transactions
    pub settlements: Vec<(TransactionId, TransactionStatus)>,

    /// Administrative account status changes
    pub status_changes: Vec<(AccountId, AccountStatus)>,
}

impl LedgerDelta {
    /// Accounts whose balance or status the delta touches, in first-mention order
    pub fn touched_accounts(&self) -> Vec<AccountId> {
        let mut touched = Vec::new();
        let ids = self
            .balance_deltas
            .iter()
            .map(|(id, _)| *id)
            .chain(self.status_changes.iter().map(|(id, _)| *id));
        for id in ids {
            if !touched.contains(&id) {
                touched.push(id);
            }
        }
        touched
    }
}

/// In-memory ledger: accounts plus transaction history
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerState {
    /// Dataset version, carried into snapshots
    version: u32,

    /// Accounts keyed by id
    accounts: BTreeMap<AccountId, Account>,

    /// Transactions in insertion order (oldest first)
    transactions: Vec<Transaction>,

    /// Position of each transaction in `transactions`
    positions: HashMap<TransactionId, usize>,

    /// Id the next new transaction receives
    next_transaction_id: TransactionId,
}

impl LedgerState {
    /// Build live state from a snapshot
    ///
    /// # Errors
    ///
    /// Returns a `SnapshotError` if the snapshot fails validation; see
    /// [`LedgerSnapshot::validate`].
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, SnapshotError> {
        snapshot.validate()?;

        let next_transaction_id = match snapshot.max_transaction_id() {
            Some(max) => max
                .checked_add(1)
                .ok_or(SnapshotError::IdExhausted { tx: max })?,
            None => 1,
        };
        let positions = snapshot
            .transactions
            .iter()
            .enumerate()
            .map(|(position, tx)| (tx.id, position))
            .collect();
        let accounts = snapshot
            .accounts
            .into_iter()
            .map(|account| (account.id, account))
            .collect();

        Ok(LedgerState {
            version: snapshot.version,
            accounts,
            transactions: snapshot.transactions,
            positions,
            next_transaction_id,
        })
    }

    /// Deep copy of the current state
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: self.version,
            accounts: self.accounts.values().cloned().collect(),
            transactions: self.transactions.clone(),
        }
    }

    /// Dataset version of the state
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Look up one account
    pub fn get_account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// All accounts, ascending by id
    pub fn list_accounts(&self) -> Vec<&Account> {
        self.accounts.values().collect()
    }

    /// Look up one transaction
    pub fn get_transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.positions
            .get(&id)
            .and_then(|&position| self.transactions.get(position))
    }

    /// Transactions, most recent first, optionally restricted to one account
    pub fn list_transactions(&self, account: Option<AccountId>) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .rev()
            .filter(|tx| account.map_or(true, |id| tx.account_id == id))
            .collect()
    }

    /// Sum of the balances of every account held in `currency`
    pub fn total_balance(&self, currency: Currency) -> Decimal {
        self.accounts
            .values()
            .filter(|account| account.currency == currency)
            .map(|account| account.balance)
            .sum()
    }

    /// Completed spending per category across accounts held in `currency`
    ///
    /// Amounts are positive; categories are ordered by amount, largest first,
    /// with ties broken by category order.
    pub fn spending_by_category(&self, currency: Currency) -> Vec<(Category, Decimal)> {
        let mut totals: BTreeMap<Category, Decimal> = BTreeMap::new();
        for tx in &self.transactions {
            let in_currency = self
                .accounts
                .get(&tx.account_id)
                .is_some_and(|account| account.currency == currency);
            if in_currency && tx.is_completed() && tx.kind == TransactionKind::Expense {
                *totals.entry(tx.category).or_insert(Decimal::ZERO) += tx.amount.abs();
            }
        }
        let mut summary: Vec<(Category, Decimal)> = totals.into_iter().collect();
        summary.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        summary
    }

    /// Id the next new transaction should receive
    pub fn next_transaction_id(&self) -> TransactionId {
        self.next_transaction_id
    }

    /// Check that every balance equals its opening balance plus completed history
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::BalanceMismatch` for the first account that
    /// disagrees with its history.
    pub fn verify_invariant(&self) -> Result<(), SnapshotError> {
        let mut history: HashMap<AccountId, Decimal> = HashMap::new();
        for tx in self.transactions.iter().filter(|tx| tx.is_completed()) {
            *history.entry(tx.account_id).or_insert(Decimal::ZERO) += tx.amount;
        }
        for account in self.accounts.values() {
            let expected =
                account.opening_balance + history.get(&account.id).copied().unwrap_or_default();
            if expected != account.balance {
                return Err(SnapshotError::BalanceMismatch {
                    account: account.id,
                    expected,
                    actual: account.balance,
                });
            }
        }
        Ok(())
    }

    /// Apply a delta as a single all-or-nothing step
    ///
    /// Validation covers the whole delta before anything changes:
    /// - every referenced account exists
    /// - no balance overflows
    /// - new transaction ids are unused, within the storable range and
    ///   reference existing accounts
    /// - settled transactions exist and are pending
    ///
    /// # Arguments
    ///
    /// * `delta` - The changes to apply
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the delta was applied
    /// * `Err(OperationError)` - If validation failed; the state is unchanged
    pub fn apply_delta(&mut self, delta: LedgerDelta) -> Result<(), OperationError> {
        // Stage new balances without touching the accounts
        let mut staged: HashMap<AccountId, Decimal> = HashMap::new();
        for (account_id, amount) in &delta.balance_deltas {
            let current = match staged.get(account_id) {
                Some(balance) => *balance,
                None => self.account(*account_id)?.balance,
            };
            let updated = current
                .checked_add(*amount)
                .ok_or_else(|| OperationError::arithmetic_overflow("apply_delta", *account_id))?;
            staged.insert(*account_id, updated);
        }

        let mut new_ids: HashSet<TransactionId> = HashSet::new();
        let mut next_transaction_id = self.next_transaction_id;
        for tx in &delta.transactions {
            self.account(tx.account_id)?;
            if self.positions.contains_key(&tx.id) || !new_ids.insert(tx.id) {
                return Err(OperationError::DuplicateTransaction { tx: tx.id });
            }
            // Ids above the stored limit would make the saved ledger unloadable
            if tx.id > MAX_STORED_TRANSACTION_ID {
                return Err(OperationError::arithmetic_overflow("transaction id", tx.account_id));
            }
            next_transaction_id = next_transaction_id.max(tx.id + 1);
        }

        let mut settled: HashSet<TransactionId> = HashSet::new();
        for (tx_id, target) in &delta.settlements {
            let tx = self
                .get_transaction(*tx_id)
                .ok_or(OperationError::TransactionNotFound { tx: *tx_id })?;
            let from = if settled.insert(*tx_id) {
                tx.status
            } else {
                *target
            };
            if from != TransactionStatus::Pending || *target == TransactionStatus::Pending {
                return Err(OperationError::InvalidStatusTransition {
                    tx: *tx_id,
                    from,
                    to: *target,
                });
            }
        }

        for (account_id, _) in &delta.status_changes {
            self.account(*account_id)?;
        }

        // Everything checked; apply
        for (account_id, balance) in staged {
            if let Some(account) = self.accounts.get_mut(&account_id) {
                account.balance = balance;
            }
        }
        for (tx_id, target) in delta.settlements {
            if let Some(&position) = self.positions.get(&tx_id) {
                self.transactions[position].status = target;
            }
        }
        for (account_id, status) in delta.status_changes {
            if let Some(account) = self.accounts.get_mut(&account_id) {
                account.status = status;
            }
        }
        self.next_transaction_id = next_transaction_id;
        for tx in delta.transactions {
            self.positions.insert(tx.id, self.transactions.len());
            self.transactions.push(tx);
        }

        Ok(())
    }

    fn account(&self, id: AccountId) -> Result<&Account, OperationError> {
        self.accounts.get(&id).ok_or(OperationError::not_found(id))
    }
}
