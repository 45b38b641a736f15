//! Reconciliation of the two candidate records into the final
//! `StatementRecord`.
//!
//! The merge priority table is field-specific by design and must not be
//! collapsed into a single global policy:
//! - name, card number and bank name trust the pattern extractors (short,
//!   format-constrained fields),
//! - transactions trust whichever source recovered more rows,
//! - amounts, dates and reward components trust the model first and use
//!   pattern values to fill gaps.

use log::debug;

use crate::schema::{RewardPointsSummary, StatementRecord};
use crate::validate::Usable;

/// Pattern value overrides whenever it is usable.
fn prefer_pattern<T: Usable>(pattern: Option<T>, llm: Option<T>) -> Option<T> {
    match pattern {
        Some(value) if value.is_usable() => Some(value),
        _ => llm,
    }
}

/// Model value is kept when usable; the pattern value only fills a gap.
fn fill_gap<T: Usable>(llm: Option<T>, pattern: Option<T>) -> Option<T> {
    match llm {
        Some(value) if value.is_usable() => Some(value),
        _ => pattern,
    }
}

/// Merges the model-extracted record with the pattern-matched record under
/// the field-level priority rules.
pub fn merge(llm: StatementRecord, pattern: StatementRecord) -> StatementRecord {
    let transactions = if pattern.transactions.len() > llm.transactions.len() {
        pattern.transactions
    } else {
        llm.transactions
    };

    StatementRecord {
        customer_name: prefer_pattern(pattern.customer_name, llm.customer_name),
        card_number: prefer_pattern(pattern.card_number, llm.card_number),
        bank_name: prefer_pattern(pattern.bank_name, llm.bank_name),

        statement_date: fill_gap(llm.statement_date, pattern.statement_date),
        payment_due_date: fill_gap(llm.payment_due_date, pattern.payment_due_date),
        total_amount_due: fill_gap(llm.total_amount_due, pattern.total_amount_due),
        minimum_amount_due: fill_gap(llm.minimum_amount_due, pattern.minimum_amount_due),
        credit_limit: fill_gap(llm.credit_limit, pattern.credit_limit),
        available_credit_limit: fill_gap(
            llm.available_credit_limit,
            pattern.available_credit_limit,
        ),

        transactions,

        reward_points_summary: RewardPointsSummary {
            opening_balance: fill_gap(
                llm.reward_points_summary.opening_balance,
                pattern.reward_points_summary.opening_balance,
            ),
            earned: fill_gap(
                llm.reward_points_summary.earned,
                pattern.reward_points_summary.earned,
            ),
            closing_balance: fill_gap(
                llm.reward_points_summary.closing_balance,
                pattern.reward_points_summary.closing_balance,
            ),
        },
    }
}

fn scrub<T: Usable>(value: Option<T>) -> Option<T> {
    value.filter(Usable::is_usable)
}

/// Re-validates every field and repairs the derivable ones, in a fixed order:
/// available credit, reward closing balance, then minimum due.
pub fn finalize(record: StatementRecord) -> StatementRecord {
    let mut record = StatementRecord {
        customer_name: scrub(record.customer_name),
        statement_date: scrub(record.statement_date),
        payment_due_date: scrub(record.payment_due_date),
        total_amount_due: scrub(record.total_amount_due),
        minimum_amount_due: scrub(record.minimum_amount_due),
        credit_limit: scrub(record.credit_limit),
        available_credit_limit: scrub(record.available_credit_limit),
        card_number: scrub(record.card_number),
        bank_name: scrub(record.bank_name),
        transactions: record.transactions,
        reward_points_summary: RewardPointsSummary {
            opening_balance: scrub(record.reward_points_summary.opening_balance),
            earned: scrub(record.reward_points_summary.earned),
            closing_balance: scrub(record.reward_points_summary.closing_balance),
        },
    };

    if record.available_credit_limit.is_none() {
        if let (Some(limit), Some(due)) = (record.credit_limit, record.total_amount_due) {
            record.available_credit_limit = Some(limit - due);
            debug!("derived available_credit_limit = {}", limit - due);
        }
    }

    let rewards = &mut record.reward_points_summary;
    if rewards.closing_balance.is_none() {
        if let (Some(opening), Some(earned)) = (rewards.opening_balance, rewards.earned) {
            rewards.closing_balance = Some(opening + earned);
        }
    }

    if record.minimum_amount_due.is_none() {
        if let Some(total) = record.total_amount_due {
            // 5% of the total is the issuer convention when no minimum is
            // printed, rounded to 2 decimal places.
            record.minimum_amount_due = Some((total * 0.05 * 100.0).round() / 100.0);
        }
    }

    record
}

/// Full reconciliation: merge then finalize.
pub fn reconcile(llm: StatementRecord, pattern: StatementRecord) -> StatementRecord {
    finalize(merge(llm, pattern))
}
