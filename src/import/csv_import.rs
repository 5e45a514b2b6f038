use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

use crate::models::{RawTransaction, AMOUNT_SCALE};

/// A CSV row with the feed's column names. Amounts here are written in
/// currency units (`-9.99`, `$1,234.56`, `(500.00)`), not feed units.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CsvRecord {
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    transaction_time: Option<String>,
    #[serde(default)]
    merchant: Option<String>,
    #[serde(default)]
    raw_merchant: Option<String>,
    #[serde(default)]
    categorization: Option<String>,
    #[serde(default)]
    clear_date: Option<String>,
    #[serde(default)]
    is_pending: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    aggregation_time: Option<String>,
}

impl CsvRecord {
    fn into_raw(self) -> RawTransaction {
        RawTransaction {
            account_id: non_empty(self.account_id),
            amount: self.amount.as_deref().and_then(parse_units),
            transaction_time: non_empty(self.transaction_time),
            merchant: non_empty(self.merchant),
            raw_merchant: non_empty(self.raw_merchant),
            categorization: non_empty(self.categorization),
            clear_date: self.clear_date.as_deref().and_then(|s| s.trim().parse().ok()),
            is_pending: self.is_pending.as_deref().and_then(parse_bool),
            transaction_id: non_empty(self.transaction_id),
            aggregation_time: self
                .aggregation_time
                .as_deref()
                .and_then(|s| s.trim().parse().ok()),
        }
    }
}

/// Read transactions from CSV with a header row naming the columns.
pub(crate) fn read_csv<R: Read>(reader: R) -> Result<Vec<RawTransaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (i, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = result.with_context(|| format!("Row {}: failed to read CSV record", i + 1))?;
        records.push(record.into_raw());
    }
    Ok(records)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Currency text to feed units (1/10,000), rounded to the nearest unit.
/// Unparseable or out-of-range text gives `None`.
fn parse_units(s: &str) -> Option<i64> {
    let value = parse_decimal(s).ok()?;
    let scale = Decimal::from(10i64.pow(AMOUNT_SCALE));
    value.checked_mul(scale)?.round().to_i64()
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    let cleaned = s
        .replace(['$', ','], "")
        .replace('(', "-")
        .replace(')', "")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        anyhow::bail!("empty amount");
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_str(&cleaned.replace('"', "")))
        .context(format!("Failed to parse '{}' as decimal", s))
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
