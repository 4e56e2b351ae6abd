//! Point-in-time copies of the ledger
//!
//! A snapshot is the persisted document and the value handed to observers.
//! `validate` performs every structural check a snapshot read back from
//! storage must pass before it may become live state.

use super::account::{Account, AccountId};
use super::error::SnapshotError;
use super::transaction::{Transaction, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Largest transaction id a stored snapshot may hold
///
/// One operation posts at most two transactions, so the next two ids must
/// still fit in a `TransactionId`.
pub const MAX_STORED_TRANSACTION_ID: TransactionId = TransactionId::MAX - 2;

/// Serializable copy of the whole ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Dataset version the snapshot was derived from
    pub version: u32,

    /// Accounts, ascending by id
    pub accounts: Vec<Account>,

    /// Transactions in insertion order (oldest first)
    pub transactions: Vec<Transaction>,
}

impl LedgerSnapshot {
    /// Check that the snapshot can become live state
    ///
    /// # Errors
    ///
    /// Returns the first problem found:
    /// - duplicate account or transaction ids
    /// - transaction ids above [`MAX_STORED_TRANSACTION_ID`]
    /// - balances or amounts with more fraction digits than the currency allows
    /// - transactions referencing unknown accounts
    /// - income/expense kind disagreeing with the amount sign
    /// - an account balance that differs from its opening balance plus completed history
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut accounts: BTreeMap<AccountId, &Account> = BTreeMap::new();
        for account in &self.accounts {
            if accounts.insert(account.id, account).is_some() {
                return Err(SnapshotError::DuplicateAccount { account: account.id });
            }
            let digits = account.currency.minor_units();
            if exceeds_precision(account.balance, digits)
                || exceeds_precision(account.opening_balance, digits)
            {
                return Err(SnapshotError::ExcessPrecision {
                    context: format!("account {}", account.id),
                });
            }
        }

        let mut seen: HashSet<TransactionId> = HashSet::new();
        let mut completed: BTreeMap<AccountId, Decimal> = BTreeMap::new();
        for tx in &self.transactions {
            if !seen.insert(tx.id) {
                return Err(SnapshotError::DuplicateTransaction { tx: tx.id });
            }
            if tx.id > MAX_STORED_TRANSACTION_ID {
                return Err(SnapshotError::IdExhausted { tx: tx.id });
            }
            let account = accounts
                .get(&tx.account_id)
                .ok_or(SnapshotError::UnknownAccount {
                    tx: tx.id,
                    account: tx.account_id,
                })?;
            if exceeds_precision(tx.amount, account.currency.minor_units()) {
                return Err(SnapshotError::ExcessPrecision {
                    context: format!("transaction {}", tx.id),
                });
            }
            if !tx.kind_matches_sign() {
                return Err(SnapshotError::KindSignMismatch { tx: tx.id });
            }
            if tx.is_completed() {
                let sum = completed.entry(tx.account_id).or_insert(Decimal::ZERO);
                *sum = sum
                    .checked_add(tx.amount)
                    .ok_or(SnapshotError::Overflow { account: tx.account_id })?;
            }
        }

        for account in accounts.values() {
            let history = completed.get(&account.id).copied().unwrap_or(Decimal::ZERO);
            let expected = account
                .opening_balance
                .checked_add(history)
                .ok_or(SnapshotError::Overflow { account: account.id })?;
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

    /// Largest transaction id in the snapshot, if any
    pub fn max_transaction_id(&self) -> Option<TransactionId> {
        self.transactions.iter().map(|tx| tx.id).max()
    }
}

/// Whether `value` carries more significant fraction digits than allowed
pub(crate) fn exceeds_precision(value: Decimal, digits: u32) -> bool {
    value.normalize().scale() > digits
}
