// CLI module
// Command-line interface, argument parsing and command execution

mod args;

pub use args::{CliArgs, Command, Outcome};

use crate::core::seed::SeedDataset;
use crate::core::store::LedgerStore;
use crate::core::traits::KeyValueStorage;
use crate::io::csv_format::{
    write_accounts_csv, write_category_summary_csv, write_transactions_csv,
};
use crate::io::persistence::PersistenceAdapter;
use crate::io::sync_reader::SyncReader;
use crate::io::open_storage;
use crate::types::{Account, AccountId, AccountStatus, Transaction};
use clap::Parser;
use std::io::Write;

/// Parse command-line arguments using clap
///
/// On invalid arguments or `--help`, clap prints a message and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Open the configured ledger and run one command
///
/// # Returns
///
/// * `Ok(())` if the command succeeded
/// * `Err(String)` if storage could not be opened or the command was rejected
pub fn run(args: &CliArgs, output: &mut dyn Write) -> Result<(), String> {
    let config = args.to_store_config();
    let storage = open_storage(&config).map_err(|e| {
        format!("Failed to open storage '{}': {}", config.data_dir.display(), e)
    })?;
    let persistence =
        PersistenceAdapter::with_key(storage, SeedDataset::canonical(), config.storage_key);
    let mut store = LedgerStore::open(persistence).map_err(|e| e.to_string())?;
    execute(&mut store, &args.command, output)
}

/// Run one command against an open store, writing CSV to `output`
///
/// Mutations print the transactions or account they produced; listings print
/// their table.
pub fn execute<S: KeyValueStorage>(
    store: &mut LedgerStore<S>,
    command: &Command,
    output: &mut dyn Write,
) -> Result<(), String> {
    match command {
        Command::Accounts => write_accounts_csv(&owned_accounts(store), output),
        Command::Transactions { account } => {
            let transactions: Vec<Transaction> = store
                .list_transactions(*account)
                .into_iter()
                .cloned()
                .collect();
            write_transactions_csv(&transactions, output)
        }
        Command::Total { currency } => {
            let total = store.total_balance(*currency);
            writeln!(output, "currency,total\n{},{}", currency, total)
                .map_err(|e| format!("Failed to write output: {}", e))
        }
        Command::Summary { currency } => {
            write_category_summary_csv(&store.spending_by_category(*currency), output)
        }
        Command::Settle { tx, outcome } => {
            let effect = store
                .settle(*tx, (*outcome).into())
                .map_err(|e| format!("settle rejected: {}", e))?;
            write_transactions_csv(&effect.transactions, output)
        }
        Command::Batch { file } => {
            let reader = SyncReader::new(file)?;
            let report = store.run_batch(reader);
            writeln!(
                output,
                "applied,rejected,malformed\n{},{},{}",
                report.applied, report.rejected, report.malformed
            )
            .map_err(|e| format!("Failed to write output: {}", e))
        }
        Command::Reset => {
            store.reset().map_err(|e| e.to_string())?;
            write_accounts_csv(&owned_accounts(store), output)
        }
        Command::Transfer { .. }
        | Command::Pay { .. }
        | Command::Exchange { .. }
        | Command::Deposit { .. } => {
            let operation = command
                .operation()
                .ok_or_else(|| format!("{:?} does not describe an operation", command))?;
            let name = operation.name();
            let effect = store
                .apply(operation)
                .map_err(|e| format!("{} rejected: {}", name, e))?;
            write_transactions_csv(&effect.transactions, output)
        }
        Command::Block { account } => change_status(store, *account, AccountStatus::Blocked, output),
        Command::Unblock { account } => change_status(store, *account, AccountStatus::Active, output),
    }
}

fn change_status<S: KeyValueStorage>(
    store: &mut LedgerStore<S>,
    account: AccountId,
    status: AccountStatus,
    output: &mut dyn Write,
) -> Result<(), String> {
    let updated = store
        .set_account_status(account, status)
        .map_err(|e| format!("status change rejected: {}", e))?;
    write_accounts_csv(&[updated], output)
}

fn owned_accounts<S: KeyValueStorage>(store: &LedgerStore<S>) -> Vec<Account> {
    store.list_accounts().into_iter().cloned().collect()
}
