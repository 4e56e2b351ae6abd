//! Canonical seed dataset
//!
//! The seed is the state a fresh installation starts from and the state a
//! reset returns to. It is immutable once built: consumers only ever get
//! deep copies through [`SeedDataset::snapshot`].

use crate::types::{
    Account, AccountId, AccountKind, Category, Currency, LedgerSnapshot, SnapshotError,
    Transaction,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Version of the canonical dataset and of the persisted snapshot layout
///
/// Stored snapshots carrying a different version are discarded on load.
pub const DATASET_VERSION: u32 = 1;

/// Read-only, version-tagged initial ledger
#[derive(Debug, Clone, PartialEq)]
pub struct SeedDataset {
    snapshot: LedgerSnapshot,
}

impl SeedDataset {
    /// Build a seed from accounts and their transaction history
    ///
    /// Account balances are derived: each account's balance becomes its
    /// opening balance plus the amounts of its completed transactions, so
    /// the seed satisfies the balance invariant by construction.
    ///
    /// # Arguments
    ///
    /// * `version` - Dataset version tag
    /// * `accounts` - Accounts with their opening balances
    /// * `transactions` - Historical transactions, oldest first
    ///
    /// # Errors
    ///
    /// Returns a `SnapshotError` if the resulting snapshot is inconsistent
    /// (duplicate ids, dangling references, kind/sign disagreement, precision).
    pub fn new(
        version: u32,
        mut accounts: Vec<Account>,
        transactions: Vec<Transaction>,
    ) -> Result<Self, SnapshotError> {
        let mut history: HashMap<AccountId, Decimal> = HashMap::new();
        for tx in transactions.iter().filter(|tx| tx.is_completed()) {
            *history.entry(tx.account_id).or_insert(Decimal::ZERO) += tx.amount;
        }
        for account in &mut accounts {
            let mut balance = account.opening_balance
                + history.get(&account.id).copied().unwrap_or_default();
            balance.rescale(account.currency.minor_units());
            account.balance = balance;
        }
        accounts.sort_by_key(|account| account.id);

        let snapshot = LedgerSnapshot {
            version,
            accounts,
            transactions,
        };
        snapshot.validate()?;
        Ok(SeedDataset { snapshot })
    }

    /// The built-in demo dataset
    ///
    /// # Panics
    ///
    /// Panics if the built-in history does not reconcile with its accounts,
    /// which the seed tests rule out.
    pub fn canonical() -> Self {
        let accounts = vec![
            Account::new(
                1,
                "Everyday Checking",
                AccountKind::Checking,
                Currency::RUB,
                Decimal::new(120_000_00, 2),
            ),
            Account::new(
                2,
                "Rainy Day Savings",
                AccountKind::Savings,
                Currency::RUB,
                Decimal::new(350_000_00, 2),
            ),
            Account::new(
                3,
                "Dollar Account",
                AccountKind::Checking,
                Currency::USD,
                Decimal::new(2_500_00, 2),
            ),
            Account::new(
                4,
                "Euro Card",
                AccountKind::Card,
                Currency::EUR,
                Decimal::new(800_00, 2),
            ),
            Account::new(
                5,
                "Term Deposit 12M",
                AccountKind::Deposit,
                Currency::RUB,
                Decimal::new(500_000_00, 2),
            ),
            Account::new(
                6,
                "Travel Card",
                AccountKind::Card,
                Currency::RUB,
                Decimal::ZERO,
            )
            .blocked(),
        ];

        let transactions = vec![
            Transaction::new(1, 1, at(2024, 5, 1, 9), "Monthly salary", Category::Salary, Decimal::new(95_000_00, 2))
                .with_merchant("Acme Corp"),
            Transaction::new(2, 1, at(2024, 5, 2, 18), "Weekly groceries", Category::Groceries, Decimal::new(-4_380_50, 2))
                .with_merchant("Green Market"),
            Transaction::new(3, 1, at(2024, 5, 3, 8), "Metro pass", Category::Transport, Decimal::new(-2_900_00, 2))
                .with_merchant("City Transit"),
            Transaction::new(4, 1, at(2024, 5, 5, 20), "Dinner", Category::Restaurants, Decimal::new(-3_250_00, 2))
                .with_merchant("Trattoria"),
            Transaction::new(5, 1, at(2024, 5, 6, 12), "Transfer to Rainy Day Savings", Category::Transfer, Decimal::new(-20_000_00, 2))
                .linked(2, 5),
            Transaction::new(6, 2, at(2024, 5, 6, 12), "Transfer from Everyday Checking", Category::Transfer, Decimal::new(20_000_00, 2))
                .linked(1, 5),
            Transaction::new(7, 4, at(2024, 5, 8, 15), "Museum tickets", Category::Entertainment, Decimal::new(-45_00, 2))
                .with_merchant("Louvre"),
            Transaction::new(8, 3, at(2024, 5, 9, 10), "Software subscription", Category::Shopping, Decimal::new(-19_99, 2))
                .with_merchant("App Store"),
            Transaction::new(9, 1, at(2024, 5, 10, 9), "Electricity bill", Category::Utilities, Decimal::new(-3_120_40, 2))
                .with_merchant("Power Grid"),
            Transaction::new(10, 5, at(2024, 5, 31, 0), "Interest accrual", Category::Deposit, Decimal::new(6_250_00, 2)),
            Transaction::new(11, 1, at(2024, 6, 1, 11), "Pharmacy", Category::Health, Decimal::new(-1_480_00, 2))
                .with_merchant("Health Plus")
                .pending(),
        ];

        SeedDataset::new(DATASET_VERSION, accounts, transactions)
            .unwrap_or_else(|error| panic!("canonical seed dataset is inconsistent: {}", error))
    }

    /// Version tag of the dataset
    pub fn version(&self) -> u32 {
        self.snapshot.version
    }

    /// Fresh deep copy of the dataset
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.snapshot.clone()
    }

    /// Opening balance of a seeded account
    pub fn opening_balance(&self, account: AccountId) -> Option<Decimal> {
        self.snapshot
            .accounts
            .iter()
            .find(|candidate| candidate.id == account)
            .map(|candidate| candidate.opening_balance)
    }
}

impl Default for SeedDataset {
    fn default() -> Self {
        Self::canonical()
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}
