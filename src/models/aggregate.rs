use std::sync::Arc;

use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::{MonthKey, Transaction};
use crate::util::format_currency;

/// Key of a summary row: a calendar month or the synthetic average row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Bucket {
    Month(MonthKey),
    Average,
}

impl Bucket {
    pub(crate) const AVERAGE: &'static str = "average";

    pub(crate) fn as_str(&self) -> &str {
        match self {
            Self::Month(m) => m.as_str(),
            Self::Average => Self::AVERAGE,
        }
    }

    pub(crate) fn is_month(&self) -> bool {
        matches!(self, Self::Month(_))
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered by the plain string key, so `average` lands after every `YYYY-MM`.
impl Ord for Bucket {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Bucket {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Running income/spending totals for one bucket.
#[derive(Debug, Clone, Default)]
pub(crate) struct MonthlyAggregate {
    pub(crate) income: Decimal,
    pub(crate) spent: Decimal,
    /// Contributing transactions in processing order, shared with the
    /// filtered list they came from.
    pub(crate) transactions: Vec<Arc<Transaction>>,
}

impl MonthlyAggregate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_transaction(&mut self, transaction: &Arc<Transaction>) {
        self.income += transaction.income();
        self.spent += transaction.spent();
        self.transactions.push(Arc::clone(transaction));
    }

    pub(crate) fn savings(&self) -> Decimal {
        self.income - self.spent
    }

    pub(crate) fn surplus(&self) -> Decimal {
        self.savings().max(Decimal::ZERO)
    }

    pub(crate) fn deficit(&self) -> Decimal {
        (-self.savings()).max(Decimal::ZERO)
    }

    /// Mean income and spending over the concrete months. Synthetic buckets
    /// are skipped; no months means zero.
    pub(crate) fn average<'a, I>(aggregates: I) -> Self
    where
        I: IntoIterator<Item = (&'a Bucket, &'a MonthlyAggregate)>,
    {
        let mut income = Decimal::ZERO;
        let mut spent = Decimal::ZERO;
        let mut months = 0u32;
        for (bucket, agg) in aggregates {
            if !bucket.is_month() {
                continue;
            }
            income += agg.income;
            spent += agg.spent;
            months += 1;
        }
        if months == 0 {
            return Self::new();
        }
        let count = Decimal::from(months);
        Self {
            income: income / count,
            spent: spent / count,
            transactions: Vec::new(),
        }
    }

    /// Largest income and largest spending seen in any concrete month.
    pub(crate) fn max<'a, I>(aggregates: I) -> Self
    where
        I: IntoIterator<Item = (&'a Bucket, &'a MonthlyAggregate)>,
    {
        aggregates
            .into_iter()
            .filter(|(bucket, _)| bucket.is_month())
            .fold(Self::new(), |acc, (_, agg)| Self {
                income: acc.income.max(agg.income),
                spent: acc.spent.max(agg.spent),
                transactions: Vec::new(),
            })
    }
}

/// Serializes as `{"spent": "$200.00", "income": "$500.00"}`.
impl Serialize for MonthlyAggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("MonthlyAggregate", 2)?;
        s.serialize_field("spent", &format_currency(self.spent))?;
        s.serialize_field("income", &format_currency(self.income))?;
        s.end()
    }
}
