//! CSV format handling for operation scripts and ledger reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - OperationRecord structure for deserializing script rows
//! - Conversion from script rows to `Operation` values
//! - Report serialization for accounts, transactions and category summaries
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{Account, AccountId, Category, Currency, Operation, Transaction, TransactionKind};
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// One row of an operation script
///
/// Columns: op, from, to, amount, currency, rate, term_days, purpose, merchant.
/// Only the columns an operation needs have to be filled:
///
/// | op         | required                    | optional          |
/// |------------|-----------------------------|-------------------|
/// | `transfer` | from, to, amount, currency  |                   |
/// | `payment`  | from, amount                | purpose, merchant |
/// | `exchange` | from, to, amount, rate      |                   |
/// | `deposit`  | from, amount, term_days     |                   |
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct OperationRecord {
    pub op: String,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub rate: Option<String>,
    pub term_days: Option<u32>,
    pub purpose: Option<String>,
    pub merchant: Option<String>,
}

/// Convert an OperationRecord to an Operation
///
/// This function:
/// - Parses the operation name (case insensitive; `pay` is accepted for payments)
/// - Parses decimal fields and the currency code
/// - Checks that every field the operation needs is present
///
/// Business validation (funds, currencies, blocked accounts) is left to the engine.
///
/// # Returns
///
/// * `Ok(Operation)` - Successfully converted record
/// * `Err(String)` - Error message describing the conversion failure
pub fn convert_operation_record(record: OperationRecord) -> Result<Operation, String> {
    let op = record.op.trim().to_lowercase();
    match op.as_str() {
        "transfer" => Ok(Operation::Transfer {
            from: required(record.from, &op, "from")?,
            to: required(record.to, &op, "to")?,
            amount: decimal(record.amount.as_deref(), &op, "amount")?,
            currency: currency(record.currency.as_deref(), &op)?,
        }),
        "payment" | "pay" => Ok(Operation::Payment {
            account: required(record.from, "payment", "from")?,
            amount: decimal(record.amount.as_deref(), "payment", "amount")?,
            purpose: record.purpose.unwrap_or_default(),
            merchant: record.merchant.filter(|merchant| !merchant.trim().is_empty()),
        }),
        "exchange" => Ok(Operation::Exchange {
            from: required(record.from, &op, "from")?,
            to: required(record.to, &op, "to")?,
            source_amount: decimal(record.amount.as_deref(), &op, "amount")?,
            rate: decimal(record.rate.as_deref(), &op, "rate")?,
        }),
        "deposit" => Ok(Operation::DepositOpen {
            source_account: required(record.from, &op, "from")?,
            amount: decimal(record.amount.as_deref(), &op, "amount")?,
            term_days: required(record.term_days, &op, "term_days")?,
        }),
        _ => Err(format!("Invalid operation: '{}'", record.op)),
    }
}

fn required<T>(value: Option<T>, op: &str, field: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("{} requires '{}'", op, field))
}

fn decimal(value: Option<&str>, op: &str, field: &str) -> Result<Decimal, String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Decimal::from_str(text)
            .map_err(|_| format!("Invalid {} '{}' for {}", field, text, op)),
        _ => Err(format!("{} requires '{}'", op, field)),
    }
}

fn currency(value: Option<&str>, op: &str) -> Result<Currency, String> {
    match value.map(str::trim) {
        Some(code) if !code.is_empty() => Currency::from_str(code).map_err(|e| e.to_string()),
        _ => Err(format!("{} requires 'currency'", op)),
    }
}

/// Write accounts as CSV: id, name, kind, currency, balance, status
///
/// Accounts are sorted by id for deterministic output.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["id", "name", "kind", "currency", "balance", "status"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by_key(|account| account.id);

    for account in sorted {
        writer
            .write_record(&[
                account.id.to_string(),
                account.name.clone(),
                account.kind.to_string(),
                account.currency.to_string(),
                account.balance.to_string(),
                account.status.to_string(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write transactions as CSV, in the order given
///
/// Columns: id, date, account, description, category, amount, kind, status, merchant.
/// Dates are RFC 3339 in UTC.
pub fn write_transactions_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "date",
            "account",
            "description",
            "category",
            "amount",
            "kind",
            "status",
            "merchant",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for tx in transactions {
        let kind = match tx.kind {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        };
        writer
            .write_record(&[
                tx.id.to_string(),
                tx.date.to_rfc3339_opts(SecondsFormat::Secs, true),
                tx.account_id.to_string(),
                tx.description.clone(),
                tx.category.to_string(),
                tx.amount.to_string(),
                kind.to_string(),
                tx.status.to_string(),
                tx.merchant.clone().unwrap_or_default(),
            ])
            .map_err(|e| format!("Failed to write transaction record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write a spending summary as CSV: category, amount
pub fn write_category_summary_csv(
    summary: &[(Category, Decimal)],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["category", "amount"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for (category, amount) in summary {
        writer
            .write_record(&[category.to_string(), amount.to_string()])
            .map_err(|e| format!("Failed to write summary record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}
