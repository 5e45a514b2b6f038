use std::collections::HashMap;
use std::sync::Arc;

use chrono::FixedOffset;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::filter::Notice;
use crate::models::{Bucket, MonthKey, MonthlyAggregate, Transaction};
use crate::util::sort_by_key;

/// Monthly aggregates plus the `average` row, ordered by key.
#[derive(Debug, Clone, Default)]
pub(crate) struct MonthlySummary {
    rows: Vec<(Bucket, MonthlyAggregate)>,
}

impl MonthlySummary {
    pub(crate) fn rows(&self) -> &[(Bucket, MonthlyAggregate)] {
        &self.rows
    }

    pub(crate) fn get(&self, key: &str) -> Option<&MonthlyAggregate> {
        self.rows
            .iter()
            .find(|(bucket, _)| bucket.as_str() == key)
            .map(|(_, agg)| agg)
    }

    pub(crate) fn months(&self) -> impl Iterator<Item = (&Bucket, &MonthlyAggregate)> {
        self.rows
            .iter()
            .filter(|(bucket, _)| bucket.is_month())
            .map(|(bucket, agg)| (bucket, agg))
    }

    pub(crate) fn average(&self) -> Option<&MonthlyAggregate> {
        self.get(Bucket::AVERAGE)
    }

    /// Per-field maxima over the concrete months.
    pub(crate) fn max(&self) -> MonthlyAggregate {
        MonthlyAggregate::max(self.months())
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

/// A JSON object whose keys appear in row order.
impl Serialize for MonthlySummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (bucket, agg) in &self.rows {
            map.serialize_entry(bucket.as_str(), agg)?;
        }
        map.end()
    }
}

/// Bucket transactions by the month written in their timestamp.
pub(crate) fn aggregate(
    transactions: &[Arc<Transaction>],
    notices: &mut Vec<Notice>,
) -> MonthlySummary {
    aggregate_in(transactions, None, notices)
}

/// Bucket transactions by calendar month, optionally shifting each instant
/// into `offset` first. Transactions without an amount or a month are left
/// out and reported. The `average` row is computed from the finished months.
pub(crate) fn aggregate_in(
    transactions: &[Arc<Transaction>],
    offset: Option<FixedOffset>,
    notices: &mut Vec<Notice>,
) -> MonthlySummary {
    let mut months: HashMap<MonthKey, MonthlyAggregate> = HashMap::new();
    let mut skipped = 0usize;

    for txn in transactions {
        let month = match offset {
            Some(offset) => txn.month_in(offset),
            None => txn.month(),
        };
        let reason = match (txn.amount(), month) {
            (Some(_), Some(month)) => {
                months.entry(month).or_default().add_transaction(txn);
                continue;
            }
            (None, _) => "no amount",
            (_, None) => "no month",
        };
        skipped += 1;
        tracing::debug!(
            transaction = txn.label(),
            time = txn.transaction_time().unwrap_or_default(),
            reason,
            "left out of aggregation"
        );
        notices.push(Notice::Unaggregated {
            transaction: Arc::clone(txn),
            reason,
        });
    }

    let mut buckets: Vec<(Bucket, MonthlyAggregate)> = months
        .into_iter()
        .map(|(month, agg)| (Bucket::Month(month), agg))
        .collect();
    let average = MonthlyAggregate::average(buckets.iter().map(|(b, agg)| (b, agg)));
    buckets.push((Bucket::Average, average));

    tracing::info!(
        months = buckets.len() - 1,
        aggregated = transactions.len() - skipped,
        skipped,
        "aggregation complete"
    );

    MonthlySummary {
        rows: sort_by_key(buckets),
    }
}

#[cfg(test)]
mod tests;
