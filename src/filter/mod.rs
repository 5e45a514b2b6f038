mod pattern;
mod reconcile;

use std::sync::Arc;

use crate::models::Transaction;

pub(crate) use pattern::{Field, PatternFilter};
pub(crate) use reconcile::{ReconcileFilter, DEFAULT_TOLERANCE_SECS};

/// A pure transformation over an ordered transaction list. Implementations
/// never add transactions and report every exclusion to `notices`.
pub(crate) trait Filter {
    fn name(&self) -> &str;

    fn apply(
        &self,
        transactions: &[Arc<Transaction>],
        notices: &mut Vec<Notice>,
    ) -> Vec<Arc<Transaction>>;
}

/// Advisory record of something the engine dropped or skipped.
#[derive(Debug, Clone)]
pub(crate) enum Notice {
    /// A single transaction removed by a pattern filter.
    Rejected {
        filter: String,
        transaction: Arc<Transaction>,
    },
    /// A pair cancelled by reconciliation; `debit` holds the lower amount.
    Reconciled {
        debit: Arc<Transaction>,
        credit: Arc<Transaction>,
    },
    /// Left out of aggregation because it has no amount or no month.
    Unaggregated {
        transaction: Arc<Transaction>,
        reason: &'static str,
    },
    /// A filter configured in a way that turns it into a no-op.
    FilterDisabled { filter: String, reason: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected {
                filter,
                transaction,
            } => write!(
                f,
                "[{filter}] rejected {} {} at {}",
                describe_amount(transaction),
                transaction.label(),
                transaction.transaction_time().unwrap_or("(no time)"),
            ),
            Self::Reconciled { debit, credit } => write!(
                f,
                "[reconcile] paired {} {} at {} with {} {} at {}",
                describe_amount(debit),
                debit.label(),
                debit.transaction_time().unwrap_or("(no time)"),
                describe_amount(credit),
                credit.label(),
                credit.transaction_time().unwrap_or("(no time)"),
            ),
            Self::Unaggregated {
                transaction,
                reason,
            } => write!(
                f,
                "[aggregate] skipped {} ({reason})",
                transaction.label()
            ),
            Self::FilterDisabled { filter, reason } => {
                write!(f, "[{filter}] disabled: {reason}")
            }
        }
    }
}

fn describe_amount(transaction: &Transaction) -> String {
    transaction
        .value()
        .map(crate::util::format_currency)
        .unwrap_or_else(|| "(no amount)".into())
}

/// Run `filters` in order, each one consuming the previous one's output.
/// An empty filter list returns the input unchanged.
pub(crate) fn apply_all(
    transactions: &[Arc<Transaction>],
    filters: &[Box<dyn Filter>],
    notices: &mut Vec<Notice>,
) -> Vec<Arc<Transaction>> {
    let mut current = transactions.to_vec();
    for filter in filters {
        let before = current.len();
        current = filter.apply(&current, notices);
        tracing::info!(
            filter = filter.name(),
            kept = current.len(),
            removed = before.saturating_sub(current.len()),
            "filter applied"
        );
    }
    current
}
