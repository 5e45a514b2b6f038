use std::sync::Arc;

use crate::aggregate::{aggregate_in, MonthlySummary};
use crate::config::FilterConfig;
use crate::filter::{apply_all, Notice};
use crate::import::TransactionBatch;
use crate::models::Transaction;

/// Everything one evaluation of a batch produces.
#[derive(Debug, Clone)]
pub(crate) struct Report {
    /// Transactions that survived the filters, in batch order.
    pub(crate) transactions: Vec<Arc<Transaction>>,
    pub(crate) summary: MonthlySummary,
    pub(crate) notices: Vec<Notice>,
}

/// Filter `batch` as `config` describes, then aggregate what is left.
/// The batch itself is not modified.
pub(crate) fn build_report(batch: &TransactionBatch, config: &FilterConfig) -> Report {
    let mut notices = Vec::new();
    let filters = config.build_filters();
    let transactions = apply_all(batch.transactions(), &filters, &mut notices);
    let summary = aggregate_in(&transactions, config.offset(), &mut notices);

    tracing::info!(
        input = batch.len(),
        kept = transactions.len(),
        notices = notices.len(),
        "report built"
    );

    Report {
        transactions,
        summary,
        notices,
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
