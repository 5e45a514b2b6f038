//! Equal-and-opposite reconciliation.
//!
//! The two legs of an internal transfer (paying a card from checking, moving
//! money between accounts) show up as amounts that cancel exactly and post
//! close together in time. This filter removes such pairs.
//!
//! Matching is a single greedy pass from the latest transaction to the
//! earliest. Unmatched transactions wait in a window, newest insert at the
//! front; entries further than the tolerance from the transaction being
//! examined are dropped from the back and never match. The first window
//! entry whose amount is the exact negation wins. With three or more equal
//! amounts inside one window this is not guaranteed to pick the closest
//! possible pairing, but the result is deterministic.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};

use super::{Filter, Notice};
use crate::models::Transaction;

pub(crate) const DEFAULT_TOLERANCE_SECS: i64 = 24 * 60 * 60;

struct Candidate {
    index: usize,
    amount: i64,
    time: DateTime<FixedOffset>,
}

fn gap(a: DateTime<FixedOffset>, b: DateTime<FixedOffset>) -> Duration {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// Remove pairs of transactions whose amounts are exact negations and whose
/// times are at most `tolerance` apart. Survivors keep their input order and
/// the caller's slice is left untouched. A non-positive tolerance matches
/// nothing.
///
/// Transactions without an amount or a parseable time never pair.
pub(crate) fn reconcile(
    transactions: &[Arc<Transaction>],
    tolerance: Duration,
    notices: &mut Vec<Notice>,
) -> Vec<Arc<Transaction>> {
    if tolerance <= Duration::zero() {
        return transactions.to_vec();
    }

    // Stable: equal times keep their input order.
    let mut order: Vec<usize> = (0..transactions.len()).collect();
    order.sort_by_key(|&i| transactions[i].timestamp());

    let mut removed = vec![false; transactions.len()];
    let mut window: VecDeque<Candidate> = VecDeque::new();

    for &index in order.iter().rev() {
        let txn = &transactions[index];
        let (Some(amount), Some(time)) = (txn.amount(), txn.timestamp()) else {
            continue;
        };

        while window
            .back()
            .is_some_and(|oldest| gap(oldest.time, time) > tolerance)
        {
            window.pop_back();
        }

        let target = amount.checked_neg();
        let partner = window
            .iter()
            .position(|c| Some(c.amount) == target)
            .and_then(|pos| window.remove(pos));

        match partner {
            Some(partner) => {
                removed[index] = true;
                removed[partner.index] = true;

                let other = &transactions[partner.index];
                let (debit, credit) = if amount <= partner.amount {
                    (txn, other)
                } else {
                    (other, txn)
                };
                tracing::debug!(
                    amount = debit.amount().unwrap_or_default(),
                    debit_time = debit.transaction_time().unwrap_or_default(),
                    credit_time = credit.transaction_time().unwrap_or_default(),
                    debit_merchant = debit.label(),
                    credit_merchant = credit.label(),
                    "reconciled pair"
                );
                notices.push(Notice::Reconciled {
                    debit: Arc::clone(debit),
                    credit: Arc::clone(credit),
                });
            }
            None => window.push_front(Candidate {
                index,
                amount,
                time,
            }),
        }
    }

    transactions
        .iter()
        .zip(&removed)
        .filter(|(_, gone)| !**gone)
        .map(|(txn, _)| Arc::clone(txn))
        .collect()
}

/// [`reconcile`] as a pipeline stage.
#[derive(Debug, Clone)]
pub(crate) struct ReconcileFilter {
    tolerance: Duration,
}

impl ReconcileFilter {
    pub(crate) fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    pub(crate) fn tolerance(&self) -> Duration {
        self.tolerance
    }
}

impl Default for ReconcileFilter {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TOLERANCE_SECS))
    }
}

impl Filter for ReconcileFilter {
    fn name(&self) -> &str {
        "reconcile"
    }

    fn apply(
        &self,
        transactions: &[Arc<Transaction>],
        notices: &mut Vec<Notice>,
    ) -> Vec<Arc<Transaction>> {
        let tolerance = self.tolerance();
        if tolerance <= Duration::zero() {
            tracing::warn!(
                tolerance_ms = tolerance.num_milliseconds(),
                "non-positive tolerance; reconciliation is a no-op"
            );
            notices.push(Notice::FilterDisabled {
                filter: self.name().to_string(),
                reason: format!(
                    "tolerance must be positive (got {}ms)",
                    tolerance.num_milliseconds()
                ),
            });
        }
        reconcile(transactions, tolerance, notices)
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
