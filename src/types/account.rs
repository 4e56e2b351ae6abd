//! Account-related types for the ledger store
//!
//! This module defines the Account structure together with its kind and
//! status enums.

use super::currency::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account identifier
pub type AccountId = u32;

/// Product kind of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Checking,
    Savings,
    Deposit,
    Card,
}

/// Whether an account accepts operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Operations are accepted
    Active,
    /// Every operation touching the account is rejected
    Blocked,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
            AccountKind::Deposit => "deposit",
            AccountKind::Card => "card",
        };
        f.write_str(label)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => f.write_str("active"),
            AccountStatus::Blocked => f.write_str("blocked"),
        }
    }
}

/// A customer account held by the ledger
///
/// `balance` always equals `opening_balance` plus the signed amounts of every
/// completed transaction posted to the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable, unique identifier
    pub id: AccountId,

    /// Display name
    pub name: String,

    /// Product kind
    pub kind: AccountKind,

    /// Currency every amount on this account is denominated in
    pub currency: Currency,

    /// Current balance
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,

    /// Balance the account was seeded with, before any transaction
    #[serde(with = "rust_decimal::serde::str")]
    pub opening_balance: Decimal,

    /// Active or blocked
    pub status: AccountStatus,
}

impl Account {
    /// Create an active account whose balance equals its opening balance
    ///
    /// The opening balance is rescaled to the currency's minor units so
    /// that listings render with a fixed number of fraction digits.
    ///
    /// # Arguments
    ///
    /// * `id` - The account identifier
    /// * `name` - Display name
    /// * `kind` - Product kind
    /// * `currency` - Account currency
    /// * `opening_balance` - Seed balance
    pub fn new(
        id: AccountId,
        name: impl Into<String>,
        kind: AccountKind,
        currency: Currency,
        opening_balance: Decimal,
    ) -> Self {
        let mut opening = opening_balance;
        opening.rescale(currency.minor_units());
        Account {
            id,
            name: name.into(),
            kind,
            currency,
            balance: opening,
            opening_balance: opening,
            status: AccountStatus::Active,
        }
    }

    /// Same account, created in the blocked state
    pub fn blocked(mut self) -> Self {
        self.status = AccountStatus::Blocked;
        self
    }

    /// Whether the account currently accepts operations
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
