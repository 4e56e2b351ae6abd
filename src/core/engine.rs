//! Operation engine
//!
//! This module provides the OperationEngine that turns submitted operations
//! into ledger deltas and applies them to a `LedgerState`.
//!
//! The engine enforces business rules, in this order, stopping at the first failure:
//! 1. Referenced accounts exist, are distinct, and are not blocked
//! 2. The operation currency matches every referenced account (exchanges need a rate instead)
//! 3. Amounts are positive, within currency precision and below `MAX_AMOUNT`
//! 4. Debited accounts hold enough funds
//!
//! Only after every check passes is a single `LedgerDelta` handed to
//! `LedgerState::apply_delta`, so a rejected operation never mutates state.

use crate::core::ledger_state::{LedgerDelta, LedgerState};
use crate::core::traits::{Clock, SystemClock};
use crate::types::snapshot::exceeds_precision;
use crate::types::{
    Account, AccountId, AccountStatus, AppliedEffect, Category, Currency, Operation,
    OperationError, Transaction, TransactionId, TransactionStatus,
};
use rust_decimal::{Decimal, RoundingStrategy};

/// Largest amount a single operation may move (one trillion units)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Shortest accepted deposit term
pub const MIN_TERM_DAYS: u32 = 1;

/// Longest accepted deposit term (ten years)
pub const MAX_TERM_DAYS: u32 = 3650;

/// Operation processing engine
///
/// Stateless apart from its clock: all ledger data lives in the `LedgerState`
/// passed to each call.
pub struct OperationEngine {
    clock: Box<dyn Clock>,
}

impl OperationEngine {
    /// Create an engine that stamps transactions with the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create an engine with a custom clock
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        OperationEngine {
            clock: Box::new(clock),
        }
    }

    /// Validate and apply an operation
    ///
    /// # Arguments
    ///
    /// * `state` - The ledger to apply the operation to
    /// * `operation` - The operation to apply
    ///
    /// # Returns
    ///
    /// * `Ok(AppliedEffect)` - The posted transactions and resulting balances
    /// * `Err(OperationError)` - If validation failed; the state is unchanged
    pub fn apply(
        &self,
        state: &mut LedgerState,
        operation: Operation,
    ) -> Result<AppliedEffect, OperationError> {
        let delta = self.plan(state, &operation)?;
        commit(state, delta)
    }

    /// Compute the delta an operation would apply, without applying it
    ///
    /// # Errors
    ///
    /// Returns the first failed validation step; see the module documentation
    /// for the order.
    pub fn plan(
        &self,
        state: &LedgerState,
        operation: &Operation,
    ) -> Result<LedgerDelta, OperationError> {
        match operation {
            Operation::Transfer {
                from,
                to,
                amount,
                currency,
            } => self.plan_transfer(state, *from, *to, *amount, *currency),
            Operation::Payment {
                account,
                amount,
                purpose,
                merchant,
            } => self.plan_payment(state, *account, *amount, purpose, merchant.as_deref()),
            Operation::Exchange {
                from,
                to,
                source_amount,
                rate,
            } => self.plan_exchange(state, *from, *to, *source_amount, *rate),
            Operation::DepositOpen {
                source_account,
                amount,
                term_days,
            } => self.plan_deposit(state, *source_account, *amount, *term_days),
        }
    }

    /// Settle a pending transaction
    ///
    /// Completing a transaction posts its amount to the account balance (a
    /// debit still needs sufficient funds); failing it changes only the status.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transaction does not exist
    /// - The transaction is not pending, or `outcome` is `Pending`
    /// - Completing a debit would overdraw the account
    pub fn settle(
        &self,
        state: &mut LedgerState,
        tx_id: TransactionId,
        outcome: TransactionStatus,
    ) -> Result<AppliedEffect, OperationError> {
        let tx = state
            .get_transaction(tx_id)
            .ok_or(OperationError::TransactionNotFound { tx: tx_id })?;
        if tx.status != TransactionStatus::Pending || outcome == TransactionStatus::Pending {
            return Err(OperationError::InvalidStatusTransition {
                tx: tx_id,
                from: tx.status,
                to: outcome,
            });
        }

        let mut delta = LedgerDelta {
            settlements: vec![(tx_id, outcome)],
            ..LedgerDelta::default()
        };
        if outcome == TransactionStatus::Completed {
            let account = existing(state, tx.account_id)?;
            if tx.amount.is_sign_negative() {
                ensure_funds(account, -tx.amount)?;
            }
            delta.balance_deltas.push((tx.account_id, tx.amount));
        }

        let mut settled = tx.clone();
        settled.status = outcome;
        let touched = vec![settled.account_id];
        state.apply_delta(delta)?;

        Ok(AppliedEffect {
            transactions: vec![settled],
            balances: balances_of(state, &touched),
        })
    }

    /// Block or unblock an account
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub fn set_account_status(
        &self,
        state: &mut LedgerState,
        account: AccountId,
        status: AccountStatus,
    ) -> Result<Account, OperationError> {
        existing(state, account)?;
        state.apply_delta(LedgerDelta {
            status_changes: vec![(account, status)],
            ..LedgerDelta::default()
        })?;
        existing(state, account).cloned()
    }

    fn plan_transfer(
        &self,
        state: &LedgerState,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        currency: Currency,
    ) -> Result<LedgerDelta, OperationError> {
        let (source, target) = distinct_pair(state, from, to)?;

        for account in [source, target] {
            if account.currency != currency {
                return Err(OperationError::currency_mismatch(
                    account.id,
                    account.currency,
                    currency,
                ));
            }
        }

        let amount = checked_amount(amount, currency)?;
        ensure_funds(source, amount)?;

        let (debit_id, credit_id) = paired_ids(state, to)?;
        let now = self.clock.now();
        let debit = Transaction::new(
            debit_id,
            from,
            now,
            format!("Transfer to {}", target.name),
            Category::Transfer,
            -amount,
        )
        .linked(to, debit_id);
        let credit = Transaction::new(
            credit_id,
            to,
            now,
            format!("Transfer from {}", source.name),
            Category::Transfer,
            amount,
        )
        .linked(from, debit_id);

        Ok(LedgerDelta {
            balance_deltas: vec![(from, -amount), (to, amount)],
            transactions: vec![debit, credit],
            ..LedgerDelta::default()
        })
    }

    fn plan_payment(
        &self,
        state: &LedgerState,
        account_id: AccountId,
        amount: Decimal,
        purpose: &str,
        merchant: Option<&str>,
    ) -> Result<LedgerDelta, OperationError> {
        let account = existing(state, account_id)?;
        ensure_active(account)?;

        let amount = checked_amount(amount, account.currency)?;
        ensure_funds(account, amount)?;

        let description = match purpose.trim() {
            "" => "Payment",
            trimmed => trimmed,
        };
        let mut payment = Transaction::new(
            state.next_transaction_id(),
            account_id,
            self.clock.now(),
            description,
            Category::Payment,
            -amount,
        );
        if let Some(merchant) = merchant.map(str::trim).filter(|m| !m.is_empty()) {
            payment = payment.with_merchant(merchant);
        }

        Ok(LedgerDelta {
            balance_deltas: vec![(account_id, -amount)],
            transactions: vec![payment],
            ..LedgerDelta::default()
        })
    }

    fn plan_exchange(
        &self,
        state: &LedgerState,
        from: AccountId,
        to: AccountId,
        source_amount: Decimal,
        rate: Decimal,
    ) -> Result<LedgerDelta, OperationError> {
        let (source, target) = distinct_pair(state, from, to)?;

        // Currencies may differ; the rate carries the conversion
        if rate <= Decimal::ZERO || (source.currency == target.currency && rate != Decimal::ONE) {
            return Err(OperationError::InvalidRate { rate });
        }

        let debited = checked_amount(source_amount, source.currency)?;
        let credited = converted(debited, rate, target.currency)?;
        ensure_funds(source, debited)?;

        let (debit_id, credit_id) = paired_ids(state, to)?;
        let now = self.clock.now();
        let description = format!("Exchange {} to {} at {}", source.currency, target.currency, rate);
        let debit = Transaction::new(
            debit_id,
            from,
            now,
            description.clone(),
            Category::Exchange,
            -debited,
        )
        .linked(to, debit_id);
        let credit = Transaction::new(
            credit_id,
            to,
            now,
            description,
            Category::Exchange,
            credited,
        )
        .linked(from, debit_id);

        Ok(LedgerDelta {
            balance_deltas: vec![(from, -debited), (to, credited)],
            transactions: vec![debit, credit],
            ..LedgerDelta::default()
        })
    }

    fn plan_deposit(
        &self,
        state: &LedgerState,
        source_account: AccountId,
        amount: Decimal,
        term_days: u32,
    ) -> Result<LedgerDelta, OperationError> {
        let source = existing(state, source_account)?;
        ensure_active(source)?;

        let amount = checked_amount(amount, source.currency)?;
        if !(MIN_TERM_DAYS..=MAX_TERM_DAYS).contains(&term_days) {
            return Err(OperationError::InvalidTerm { term_days });
        }
        ensure_funds(source, amount)?;

        let opening = Transaction::new(
            state.next_transaction_id(),
            source_account,
            self.clock.now(),
            format!("Term deposit for {} days", term_days),
            Category::Deposit,
            -amount,
        );

        Ok(LedgerDelta {
            balance_deltas: vec![(source_account, -amount)],
            transactions: vec![opening],
            ..LedgerDelta::default()
        })
    }
}

impl Default for OperationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a planned delta and describe its effect
fn commit(state: &mut LedgerState, delta: LedgerDelta) -> Result<AppliedEffect, OperationError> {
    let transactions = delta.transactions.clone();
    let touched = delta.touched_accounts();
    state.apply_delta(delta)?;
    Ok(AppliedEffect {
        transactions,
        balances: balances_of(state, &touched),
    })
}

fn balances_of(state: &LedgerState, accounts: &[AccountId]) -> Vec<(AccountId, Decimal)> {
    accounts
        .iter()
        .filter_map(|id| state.get_account(*id).map(|account| (*id, account.balance)))
        .collect()
}

fn existing(state: &LedgerState, id: AccountId) -> Result<&Account, OperationError> {
    state.get_account(id).ok_or(OperationError::not_found(id))
}

/// Both accounts of a two-account operation: existing, distinct and active
fn distinct_pair(
    state: &LedgerState,
    from: AccountId,
    to: AccountId,
) -> Result<(&Account, &Account), OperationError> {
    let source = existing(state, from)?;
    let target = existing(state, to)?;
    if from == to {
        return Err(OperationError::SameAccount { account: from });
    }
    ensure_active(source)?;
    ensure_active(target)?;
    Ok((source, target))
}

/// Ids for a debit/credit pair posted in one operation
fn paired_ids(
    state: &LedgerState,
    credited: AccountId,
) -> Result<(TransactionId, TransactionId), OperationError> {
    let debit_id = state.next_transaction_id();
    let credit_id = debit_id
        .checked_add(1)
        .ok_or_else(|| OperationError::arithmetic_overflow("transaction id", credited))?;
    Ok((debit_id, credit_id))
}

fn ensure_active(account: &Account) -> Result<(), OperationError> {
    if account.is_active() {
        Ok(())
    } else {
        Err(OperationError::account_blocked(account.id))
    }
}

/// Validate an operation amount and rescale it to the currency's minor units
fn checked_amount(amount: Decimal, currency: Currency) -> Result<Decimal, OperationError> {
    if amount <= Decimal::ZERO {
        return Err(OperationError::invalid_amount(amount, "must be positive"));
    }
    if exceeds_precision(amount, currency.minor_units()) {
        return Err(OperationError::invalid_amount(
            amount,
            &format!("{} allows {} fraction digits", currency, currency.minor_units()),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(OperationError::invalid_amount(amount, "exceeds the operation limit"));
    }
    let mut scaled = amount;
    scaled.rescale(currency.minor_units());
    Ok(scaled)
}

/// Convert an amount at `rate`, rounding half-to-even to the target's minor units
fn converted(amount: Decimal, rate: Decimal, target: Currency) -> Result<Decimal, OperationError> {
    let raw = amount
        .checked_mul(rate)
        .ok_or_else(|| OperationError::invalid_amount(amount, "exchange result out of range"))?;
    let mut credited =
        raw.round_dp_with_strategy(target.minor_units(), RoundingStrategy::MidpointNearestEven);
    credited.rescale(target.minor_units());
    if credited <= Decimal::ZERO {
        return Err(OperationError::invalid_amount(credited, "exchange result rounds to zero"));
    }
    if credited > MAX_AMOUNT {
        return Err(OperationError::invalid_amount(credited, "exceeds the operation limit"));
    }
    Ok(credited)
}

fn ensure_funds(account: &Account, amount: Decimal) -> Result<(), OperationError> {
    if account.balance < amount {
        return Err(OperationError::insufficient_funds(
            account.id,
            account.balance,
            amount,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::FixedClock;
    use crate::types::{AccountKind, LedgerSnapshot, TransactionKind};
    use chrono::{DateTime, Utc};
    use rstest::rstest;

    fn instant() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_717_200_000, 0).unwrap()
    }

    fn engine() -> OperationEngine {
        OperationEngine::with_clock(FixedClock(instant()))
    }

    /// A = 1000 RUB, B = 0 RUB, C = 0 USD, D = 50 RUB blocked, E = 0 JPY
    fn state() -> LedgerState {
        LedgerState::from_snapshot(LedgerSnapshot {
            version: 1,
            accounts: vec![
                Account::new(1, "A", AccountKind::Checking, Currency::RUB, Decimal::new(1000, 0)),
                Account::new(2, "B", AccountKind::Savings, Currency::RUB, Decimal::ZERO),
                Account::new(3, "C", AccountKind::Checking, Currency::USD, Decimal::ZERO),
                Account::new(4, "D", AccountKind::Card, Currency::RUB, Decimal::new(50, 0))
                    .blocked(),
                Account::new(5, "E", AccountKind::Checking, "JPY".parse().unwrap(), Decimal::ZERO),
            ],
            transactions: vec![],
        })
        .unwrap()
    }

    fn transfer(from: AccountId, to: AccountId, amount: Decimal, currency: Currency) -> Operation {
        Operation::Transfer {
            from,
            to,
            amount,
            currency,
        }
    }

    #[test]
    fn test_transfer_moves_funds_and_links_legs() {
        let mut state = state();
        let effect = engine()
            .apply(&mut state, transfer(1, 2, Decimal::new(300, 0), Currency::RUB))
            .unwrap();

        assert_eq!(state.get_account(1).unwrap().balance, Decimal::new(700, 0));
        assert_eq!(state.get_account(2).unwrap().balance, Decimal::new(300, 0));
        assert_eq!(state.total_balance(Currency::RUB), Decimal::new(1050, 0));
        assert_eq!(effect.balance_of(1), Some(Decimal::new(700, 0)));
        assert_eq!(effect.balance_of(2), Some(Decimal::new(300, 0)));

        let [debit, credit] = effect.transactions.as_slice() else {
            panic!("expected two transactions, got {:?}", effect.transactions);
        };
        assert_eq!(debit.amount, Decimal::new(-300, 0));
        assert_eq!(debit.kind, TransactionKind::Expense);
        assert_eq!(credit.kind, TransactionKind::Income);
        assert_eq!(debit.correlation, credit.correlation);
        assert_eq!(debit.counter_account, Some(2));
        assert_eq!(credit.counter_account, Some(1));
        assert!(debit.is_completed() && credit.is_completed());
        assert_eq!(debit.date, instant());
        assert_eq!(state.verify_invariant(), Ok(()));
    }

    #[rstest]
    #[case::unknown_source(transfer(9, 2, Decimal::ONE, Currency::RUB), OperationError::not_found(9))]
    #[case::unknown_target(transfer(1, 9, Decimal::ONE, Currency::RUB), OperationError::not_found(9))]
    #[case::unknown_beats_currency(transfer(9, 3, Decimal::ONE, Currency::EUR), OperationError::not_found(9))]
    #[case::same_account(transfer(1, 1, Decimal::ONE, Currency::RUB), OperationError::SameAccount { account: 1 })]
    #[case::blocked_target(transfer(1, 4, Decimal::ONE, Currency::RUB), OperationError::account_blocked(4))]
    #[case::currency_mismatch(
        transfer(1, 3, Decimal::ONE, Currency::RUB),
        OperationError::currency_mismatch(3, Currency::USD, Currency::RUB)
    )]
    #[case::currency_beats_amount(
        transfer(1, 2, Decimal::ZERO, Currency::USD),
        OperationError::currency_mismatch(1, Currency::RUB, Currency::USD)
    )]
    #[case::amount_beats_funds(
        transfer(2, 1, Decimal::new(-5, 0), Currency::RUB),
        OperationError::invalid_amount(Decimal::new(-5, 0), "must be positive")
    )]
    #[case::insufficient(
        transfer(2, 1, Decimal::new(5, 0), Currency::RUB),
        OperationError::insufficient_funds(2, Decimal::ZERO, Decimal::new(5, 0))
    )]
    #[case::exchange_insufficient(
        Operation::Exchange { from: 2, to: 3, source_amount: Decimal::new(5, 0), rate: Decimal::new(11, 3) },
        OperationError::insufficient_funds(2, Decimal::ZERO, Decimal::new(5, 0))
    )]
    #[case::rounding_beats_funds(
        Operation::Exchange { from: 2, to: 3, source_amount: Decimal::new(1, 2), rate: Decimal::new(11, 3) },
        OperationError::invalid_amount(Decimal::new(0, 2), "exchange result rounds to zero")
    )]
    fn test_validation_order(#[case] operation: Operation, #[case] expected: OperationError) {
        let mut state = state();
        let before = state.clone();

        assert_eq!(engine().apply(&mut state, operation), Err(expected));
        assert_eq!(state, before);
    }

    #[rstest]
    #[case::zero(Decimal::ZERO)]
    #[case::negative(Decimal::new(-1, 2))]
    #[case::three_digits(Decimal::new(1001, 3))]
    #[case::over_limit(Decimal::new(1_000_000_000_001, 0))]
    fn test_invalid_amounts(#[case] amount: Decimal) {
        let mut state = state();
        let result = engine().apply(&mut state, transfer(1, 2, amount, Currency::RUB));
        assert!(matches!(result, Err(OperationError::InvalidAmount { .. })));
    }

    #[test]
    fn test_trailing_zero_fraction_digits_accepted() {
        let mut state = state();
        let effect = engine()
            .apply(&mut state, transfer(1, 2, Decimal::new(1_0000, 4), Currency::RUB))
            .unwrap();
        assert_eq!(effect.transactions[1].amount.to_string(), "1.00");
    }

    #[test]
    fn test_payment_debits_with_merchant() {
        let mut state = state();
        let effect = engine()
            .apply(
                &mut state,
                Operation::Payment {
                    account: 1,
                    amount: Decimal::new(12550, 2),
                    purpose: " Mobile bill ".to_string(),
                    merchant: Some("Telecom".to_string()),
                },
            )
            .unwrap();

        let payment = &effect.transactions[0];
        assert_eq!(payment.description, "Mobile bill");
        assert_eq!(payment.merchant.as_deref(), Some("Telecom"));
        assert_eq!(payment.category, Category::Payment);
        assert_eq!(state.get_account(1).unwrap().balance, Decimal::new(87450, 2));
    }

    #[test]
    fn test_payment_insufficient_funds_changes_nothing() {
        let mut state = state();
        engine()
            .apply(&mut state, transfer(1, 2, Decimal::new(300, 0), Currency::RUB))
            .unwrap();
        let before = state.clone();

        let result = engine().apply(
            &mut state,
            Operation::Payment {
                account: 1,
                amount: Decimal::new(5000, 0),
                purpose: "Rent".to_string(),
                merchant: None,
            },
        );

        assert_eq!(
            result,
            Err(OperationError::insufficient_funds(
                1,
                Decimal::new(70000, 2),
                Decimal::new(500000, 2)
            ))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_exchange_credits_converted_amount() {
        let mut state = state();
        let effect = engine()
            .apply(
                &mut state,
                Operation::Exchange {
                    from: 1,
                    to: 3,
                    source_amount: Decimal::new(1000, 0),
                    rate: Decimal::new(11, 3),
                },
            )
            .unwrap();

        assert_eq!(state.get_account(1).unwrap().balance, Decimal::ZERO);
        assert_eq!(state.get_account(3).unwrap().balance.to_string(), "11.00");
        assert_eq!(effect.transactions[0].correlation, effect.transactions[1].correlation);
        assert_eq!(state.verify_invariant(), Ok(()));
    }

    #[rstest]
    #[case::half_down_to_even(Decimal::new(125, 1), "0.12")]
    #[case::half_up_to_even(Decimal::new(135, 1), "0.14")]
    #[case::below_half(Decimal::new(124, 1), "0.12")]
    #[case::above_half(Decimal::new(126, 1), "0.13")]
    fn test_exchange_rounds_half_to_even(#[case] source: Decimal, #[case] expected: &str) {
        let mut state = state();
        let effect = engine()
            .apply(
                &mut state,
                Operation::Exchange {
                    from: 1,
                    to: 3,
                    source_amount: source,
                    rate: Decimal::new(1, 2),
                },
            )
            .unwrap();
        assert_eq!(effect.transactions[1].amount.to_string(), expected);
    }

    #[test]
    fn test_exchange_to_zero_decimal_currency() {
        let mut state = state();
        let effect = engine()
            .apply(
                &mut state,
                Operation::Exchange {
                    from: 1,
                    to: 5,
                    source_amount: Decimal::new(10, 0),
                    rate: Decimal::new(165, 2),
                },
            )
            .unwrap();
        // 16.5 rounds to the even 16
        assert_eq!(effect.transactions[1].amount.to_string(), "16");
    }

    #[rstest]
    #[case::zero_rate(1, 3, Decimal::ZERO)]
    #[case::negative_rate(1, 3, Decimal::new(-2, 0))]
    #[case::same_currency_not_one(1, 2, Decimal::new(2, 0))]
    fn test_exchange_invalid_rate(#[case] from: AccountId, #[case] to: AccountId, #[case] rate: Decimal) {
        let mut state = state();
        let result = engine().apply(
            &mut state,
            Operation::Exchange {
                from,
                to,
                source_amount: Decimal::ONE,
                rate,
            },
        );
        assert_eq!(result, Err(OperationError::InvalidRate { rate }));
    }

    #[test]
    fn test_exchange_rounding_to_zero_rejected() {
        let mut state = state();
        let result = engine().apply(
            &mut state,
            Operation::Exchange {
                from: 1,
                to: 3,
                source_amount: Decimal::new(1, 2),
                rate: Decimal::new(11, 3),
            },
        );
        assert!(matches!(result, Err(OperationError::InvalidAmount { .. })));
    }

    #[test]
    fn test_deposit_open_debits_source() {
        let mut state = state();
        let effect = engine()
            .apply(
                &mut state,
                Operation::DepositOpen {
                    source_account: 1,
                    amount: Decimal::new(400, 0),
                    term_days: 180,
                },
            )
            .unwrap();

        assert_eq!(effect.transactions.len(), 1);
        assert_eq!(effect.transactions[0].category, Category::Deposit);
        assert_eq!(effect.transactions[0].description, "Term deposit for 180 days");
        assert_eq!(state.get_account(1).unwrap().balance, Decimal::new(600, 0));
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_TERM_DAYS + 1)]
    fn test_deposit_term_bounds(#[case] term_days: u32) {
        let mut state = state();
        let result = engine().apply(
            &mut state,
            Operation::DepositOpen {
                source_account: 1,
                amount: Decimal::ONE,
                term_days,
            },
        );
        assert_eq!(result, Err(OperationError::InvalidTerm { term_days }));
    }

    #[test]
    fn test_settle_pending_transaction() {
        let mut state = state();
        let pending = Transaction::new(
            1,
            1,
            instant(),
            "Card hold",
            Category::Shopping,
            Decimal::new(-200, 0),
        )
        .pending();
        state
            .apply_delta(LedgerDelta {
                transactions: vec![pending],
                ..LedgerDelta::default()
            })
            .unwrap();

        let effect = engine()
            .settle(&mut state, 1, TransactionStatus::Completed)
            .unwrap();

        assert_eq!(effect.transactions[0].status, TransactionStatus::Completed);
        assert_eq!(effect.balance_of(1), Some(Decimal::new(800, 0)));
        assert_eq!(state.verify_invariant(), Ok(()));
        assert!(matches!(
            engine().settle(&mut state, 1, TransactionStatus::Failed),
            Err(OperationError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_settle_failed_leaves_balance() {
        let mut state = state();
        let pending = Transaction::new(1, 2, instant(), "Hold", Category::Other, Decimal::new(-9, 0))
            .pending();
        state
            .apply_delta(LedgerDelta {
                transactions: vec![pending],
                ..LedgerDelta::default()
            })
            .unwrap();

        // Completing would overdraw B
        assert!(matches!(
            engine().settle(&mut state, 1, TransactionStatus::Completed),
            Err(OperationError::InsufficientFunds { account: 2, .. })
        ));
        engine().settle(&mut state, 1, TransactionStatus::Failed).unwrap();
        assert_eq!(state.get_account(2).unwrap().balance, Decimal::ZERO);
        assert_eq!(
            state.get_transaction(1).unwrap().status,
            TransactionStatus::Failed
        );
    }

    #[test]
    fn test_block_then_unblock() {
        let mut state = state();
        let engine = engine();

        engine.set_account_status(&mut state, 2, AccountStatus::Blocked).unwrap();
        assert_eq!(
            engine.apply(&mut state, transfer(1, 2, Decimal::ONE, Currency::RUB)),
            Err(OperationError::account_blocked(2))
        );

        engine.set_account_status(&mut state, 2, AccountStatus::Active).unwrap();
        assert!(engine
            .apply(&mut state, transfer(1, 2, Decimal::ONE, Currency::RUB))
            .is_ok());
        assert_eq!(
            engine.set_account_status(&mut state, 77, AccountStatus::Blocked),
            Err(OperationError::not_found(77))
        );
    }

    #[test]
    fn test_transaction_ids_are_monotonic() {
        let mut state = state();
        let engine = engine();
        let first = engine
            .apply(&mut state, transfer(1, 2, Decimal::ONE, Currency::RUB))
            .unwrap();
        let second = engine
            .apply(&mut state, transfer(2, 1, Decimal::ONE, Currency::RUB))
            .unwrap();

        let ids: Vec<TransactionId> = first
            .transactions
            .iter()
            .chain(&second.transactions)
            .map(|tx| tx.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_exhausted_transaction_ids_reject_operation() {
        let mut snapshot = state().snapshot();
        snapshot.transactions.push(
            Transaction::new(
                crate::types::MAX_STORED_TRANSACTION_ID,
                2,
                instant(),
                "Pending hold",
                Category::Payment,
                Decimal::new(-1, 0),
            )
            .pending(),
        );
        let mut state = LedgerState::from_snapshot(snapshot).unwrap();
        let before = state.clone();

        let result = engine().apply(&mut state, transfer(1, 2, Decimal::ONE, Currency::RUB));

        assert!(matches!(result, Err(OperationError::ArithmeticOverflow { .. })));
        assert_eq!(state, before);
    }

    #[test]
    fn test_max_amount_constant() {
        assert_eq!(MAX_AMOUNT, Decimal::new(1_000_000_000_000, 0));
    }
}
