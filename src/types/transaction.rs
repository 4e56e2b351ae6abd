//! Transaction-related types for the ledger store
//!
//! This module defines posted transactions and the tags attached to them.
//! Transactions are produced by the operation engine only; the signed amount
//! carries the direction and the income/expense kind is derived from it.

use super::account::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction identifier
///
/// Assigned monotonically: a new transaction gets the largest known id plus one.
pub type TransactionId = u64;

/// Direction of a transaction, always in agreement with the amount sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Positive amount, money coming in
    Income,
    /// Negative amount, money going out
    Expense,
}

impl TransactionKind {
    /// Kind implied by a signed amount
    ///
    /// Zero is treated as income; the engine never posts zero amounts.
    pub fn for_amount(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            TransactionKind::Expense
        } else {
            TransactionKind::Income
        }
    }
}

/// Settlement status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Not yet reflected in the account balance
    Pending,
    /// Reflected in the account balance; immutable from here on
    Completed,
    /// Never reflected in the account balance; immutable from here on
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Spending/earning category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Salary,
    Transfer,
    Payment,
    Exchange,
    Deposit,
    Groceries,
    Restaurants,
    Transport,
    Utilities,
    Entertainment,
    Shopping,
    Health,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Salary => "salary",
            Category::Transfer => "transfer",
            Category::Payment => "payment",
            Category::Exchange => "exchange",
            Category::Deposit => "deposit",
            Category::Groceries => "groceries",
            Category::Restaurants => "restaurants",
            Category::Transport => "transport",
            Category::Utilities => "utilities",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Other => "other",
        };
        f.write_str(label)
    }
}

/// A transaction posted to one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: TransactionId,

    /// Account the amount is posted to
    pub account_id: AccountId,

    /// When the transaction was recorded
    pub date: DateTime<Utc>,

    /// Free-form description shown in statements
    pub description: String,

    /// Category tag
    pub category: Category,

    /// Signed amount: positive credits the account, negative debits it
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    /// Income or expense; must agree with the sign of `amount`
    pub kind: TransactionKind,

    /// Settlement status
    pub status: TransactionStatus,

    /// Merchant for card and bill payments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,

    /// Other side of a transfer or exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_account: Option<AccountId>,

    /// Shared by both legs of a transfer or exchange (the debit leg's id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<TransactionId>,
}

impl Transaction {
    /// Create a completed transaction with the kind derived from the amount
    pub fn new(
        id: TransactionId,
        account_id: AccountId,
        date: DateTime<Utc>,
        description: impl Into<String>,
        category: Category,
        amount: Decimal,
    ) -> Self {
        Transaction {
            id,
            account_id,
            date,
            description: description.into(),
            category,
            amount,
            kind: TransactionKind::for_amount(amount),
            status: TransactionStatus::Completed,
            merchant: None,
            counter_account: None,
            correlation: None,
        }
    }

    /// Same transaction, left pending
    pub fn pending(mut self) -> Self {
        self.status = TransactionStatus::Pending;
        self
    }

    /// Same transaction, attributed to a merchant
    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    /// Same transaction, linked to the other leg of a two-account operation
    pub fn linked(mut self, counter_account: AccountId, correlation: TransactionId) -> Self {
        self.counter_account = Some(counter_account);
        self.correlation = Some(correlation);
        self
    }

    /// Whether the transaction counts toward its account balance
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// Whether the kind agrees with the amount sign
    pub fn kind_matches_sign(&self) -> bool {
        match self.kind {
            TransactionKind::Income => self.amount.is_sign_positive() || self.amount.is_zero(),
            TransactionKind::Expense => self.amount.is_sign_negative() && !self.amount.is_zero(),
        }
    }
}
