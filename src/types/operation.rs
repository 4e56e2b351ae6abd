//! Operations submitted to the ledger and the effects they produce
//!
//! Operations are requests, never persisted. The engine turns an accepted
//! operation into transactions; only those transactions survive.

use super::account::AccountId;
use super::currency::Currency;
use super::transaction::Transaction;
use rust_decimal::Decimal;

/// A request to change the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Move money between two accounts of the same currency
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        currency: Currency,
    },

    /// Pay out of an account, in the account's currency
    Payment {
        account: AccountId,
        amount: Decimal,
        purpose: String,
        merchant: Option<String>,
    },

    /// Convert money between two accounts at a given rate
    ///
    /// The target is credited `source_amount * rate`, rounded half-to-even
    /// to the target currency's minor units.
    Exchange {
        from: AccountId,
        to: AccountId,
        source_amount: Decimal,
        rate: Decimal,
    },

    /// Place money on a term deposit
    DepositOpen {
        source_account: AccountId,
        amount: Decimal,
        term_days: u32,
    },
}

impl Operation {
    /// Short lowercase name, used in logs and CSV scripts
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Transfer { .. } => "transfer",
            Operation::Payment { .. } => "payment",
            Operation::Exchange { .. } => "exchange",
            Operation::DepositOpen { .. } => "deposit",
        }
    }
}

/// Result of a successfully applied operation
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEffect {
    /// Transactions the operation posted, in posting order
    pub transactions: Vec<Transaction>,

    /// Resulting balance of every account the operation touched
    pub balances: Vec<(AccountId, Decimal)>,
}

impl AppliedEffect {
    /// Resulting balance of one touched account
    pub fn balance_of(&self, account: AccountId) -> Option<Decimal> {
        self.balances
            .iter()
            .find(|(id, _)| *id == account)
            .map(|(_, balance)| *balance)
    }
}
