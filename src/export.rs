use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::aggregate::MonthlySummary;
use crate::util::to_cents;

#[derive(Serialize)]
struct ExportRow<'a> {
    month: &'a str,
    income: String,
    spent: String,
    savings: String,
    transactions: usize,
}

/// Write one CSV row per summary bucket, `average` included. Returns the
/// number of rows written.
pub(crate) fn write_summary<W: Write>(summary: &MonthlySummary, out: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    for (bucket, agg) in summary.rows() {
        writer
            .serialize(ExportRow {
                month: bucket.as_str(),
                income: format!("{:.2}", to_cents(agg.income)),
                spent: format!("{:.2}", to_cents(agg.spent)),
                savings: format!("{:.2}", to_cents(agg.savings())),
                transactions: agg.transactions.len(),
            })
            .with_context(|| format!("failed to serialize export row for {bucket}"))?;
    }
    writer.flush().context("failed to finalize export")?;
    Ok(summary.len())
}

pub(crate) fn export_to_csv(summary: &MonthlySummary, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_summary(summary, file)
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
