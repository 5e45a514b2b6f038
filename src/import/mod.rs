mod csv_import;
mod json;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::models::{RawTransaction, Transaction};

pub(crate) use csv_import::read_csv;
pub(crate) use json::parse_json;

/// A caller-owned set of transactions, fetched once and then filtered and
/// aggregated as many times as needed.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionBatch {
    transactions: Vec<Arc<Transaction>>,
}

impl TransactionBatch {
    pub(crate) fn from_raw(records: Vec<RawTransaction>) -> Self {
        Self::from_transactions(records.into_iter().map(Transaction::from_raw))
    }

    pub(crate) fn from_transactions(transactions: impl IntoIterator<Item = Transaction>) -> Self {
        Self {
            transactions: transactions.into_iter().map(Arc::new).collect(),
        }
    }

    pub(crate) fn transactions(&self) -> &[Arc<Transaction>] {
        &self.transactions
    }

    pub(crate) fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Load a batch from a `.csv` file or a JSON feed dump (anything else).
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let records = if is_csv {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            read_csv(file).with_context(|| format!("Failed to read {}", path.display()))?
        } else {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            parse_json(&text).with_context(|| format!("Failed to parse {}", path.display()))?
        };

        let batch = Self::from_raw(records);
        let fetched = batch
            .transactions
            .iter()
            .filter_map(|t| t.aggregation_time())
            .max()
            .and_then(chrono::DateTime::from_timestamp_millis);
        tracing::info!(
            path = %path.display(),
            count = batch.len(),
            fetched = %fetched.map(|t| t.to_rfc3339()).unwrap_or_default(),
            "loaded transactions"
        );
        Ok(batch)
    }
}
