use crate::config::{StoreConfig, DEFAULT_DATA_DIR, DEFAULT_LOG_LEVEL};
use crate::io::persistence::DEFAULT_KEY;
use crate::types::{AccountId, Currency, Operation, TransactionId, TransactionStatus};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Personal banking ledger with durable storage
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "Inspect and change a personal banking ledger", long_about = None)]
pub struct CliArgs {
    /// Directory holding the ledger document
    #[arg(long = "data-dir", value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Storage key of the ledger document
    #[arg(long = "key", value_name = "KEY", default_value = DEFAULT_KEY)]
    pub key: String,

    /// Persist on a background task instead of writing synchronously
    #[arg(long = "write-behind")]
    pub write_behind: bool,

    /// Default log filter when RUST_LOG is not set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do with the ledger
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List accounts
    Accounts,

    /// List transactions, most recent first
    Transactions {
        /// Only transactions of this account
        #[arg(long, value_name = "ID")]
        account: Option<AccountId>,
    },

    /// Sum of balances in one currency
    Total { currency: Currency },

    /// Spending per category in one currency
    Summary { currency: Currency },

    /// Move money between two accounts
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        currency: Currency,
    },

    /// Pay out of an account
    Pay {
        account: AccountId,
        amount: Decimal,
        #[arg(long, default_value = "")]
        purpose: String,
        #[arg(long)]
        merchant: Option<String>,
    },

    /// Convert money between accounts at a rate
    Exchange {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        rate: Decimal,
    },

    /// Place money on a term deposit
    Deposit {
        account: AccountId,
        amount: Decimal,
        #[arg(long = "term-days", value_name = "DAYS")]
        term_days: u32,
    },

    /// Complete or fail a pending transaction
    Settle { tx: TransactionId, outcome: Outcome },

    /// Block an account
    Block { account: AccountId },

    /// Unblock an account
    Unblock { account: AccountId },

    /// Apply an operation script (CSV)
    Batch { file: PathBuf },

    /// Restore the seed dataset
    Reset,
}

/// Final status of a settled transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Outcome {
    Completed,
    Failed,
}

impl From<Outcome> for TransactionStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Completed => TransactionStatus::Completed,
            Outcome::Failed => TransactionStatus::Failed,
        }
    }
}

impl Command {
    /// The ledger operation this command submits, if it is one
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Command::Transfer {
                from,
                to,
                amount,
                currency,
            } => Some(Operation::Transfer {
                from: *from,
                to: *to,
                amount: *amount,
                currency: *currency,
            }),
            Command::Pay {
                account,
                amount,
                purpose,
                merchant,
            } => Some(Operation::Payment {
                account: *account,
                amount: *amount,
                purpose: purpose.clone(),
                merchant: merchant.clone(),
            }),
            Command::Exchange {
                from,
                to,
                amount,
                rate,
            } => Some(Operation::Exchange {
                from: *from,
                to: *to,
                source_amount: *amount,
                rate: *rate,
            }),
            Command::Deposit {
                account,
                amount,
                term_days,
            } => Some(Operation::DepositOpen {
                source_account: *account,
                amount: *amount,
                term_days: *term_days,
            }),
            _ => None,
        }
    }
}

impl CliArgs {
    /// Create a StoreConfig from CLI arguments
    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: self.data_dir.clone(),
            storage_key: self.key.clone(),
            write_behind: self.write_behind,
            log_level: self.log_level.clone(),
        }
    }
}
