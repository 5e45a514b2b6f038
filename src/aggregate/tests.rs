#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

fn txn(amount: i64, time: &str) -> Arc<Transaction> {
    Arc::new(Transaction::new(Some(amount), Some(time)))
}

fn keys(summary: &MonthlySummary) -> Vec<&str> {
    summary.rows().iter().map(|(b, _)| b.as_str()).collect()
}

// ── Bucketing ─────────────────────────────────────────────────

#[test]
fn test_aggregate_single_month() {
    let txns = vec![
        txn(5194500, "2024-03-01T10:00:00Z"),
        txn(-99900, "2024-03-20T10:00:00Z"),
    ];
    let summary = aggregate(&txns, &mut Vec::new());
    let march = summary.get("2024-03").unwrap();
    assert_eq!(march.income, dec!(519.45));
    assert_eq!(march.spent, dec!(9.99));
    let json = serde_json::to_value(march).unwrap();
    assert_eq!(json["income"], "$519.45");
    assert_eq!(json["spent"], "$9.99");
}

#[test]
fn test_aggregate_keys_sorted_with_average_last() {
    let txns = vec![
        txn(-100, "2015-05-03T00:00:00Z"),
        txn(-100, "2014-11-03T00:00:00Z"),
        txn(-100, "2015-01-03T00:00:00Z"),
    ];
    let summary = aggregate(&txns, &mut Vec::new());
    assert_eq!(keys(&summary), vec!["2014-11", "2015-01", "2015-05", "average"]);
}

#[test]
fn test_aggregate_keeps_processing_order_within_month() {
    let txns = vec![
        txn(-300, "2024-01-20T00:00:00Z"),
        txn(-100, "2024-01-05T00:00:00Z"),
        txn(-200, "2024-01-10T00:00:00Z"),
    ];
    let summary = aggregate(&txns, &mut Vec::new());
    let jan = summary.get("2024-01").unwrap();
    assert_eq!(jan.transactions.len(), 3);
    for (agg_txn, input) in jan.transactions.iter().zip(&txns) {
        assert!(Arc::ptr_eq(agg_txn, input));
    }
}

#[test]
fn test_aggregate_empty_input() {
    let summary = aggregate(&[], &mut Vec::new());
    assert_eq!(keys(&summary), vec!["average"]);
    let avg = summary.average().unwrap();
    assert_eq!(avg.income, Decimal::ZERO);
    assert_eq!(avg.spent, Decimal::ZERO);
}

#[test]
fn test_aggregate_skips_malformed() {
    let txns = vec![
        txn(-100, "2024-01-05T00:00:00Z"),
        txn(-100, "garbage"),
        Arc::new(Transaction::new(None, Some("2024-01-05T00:00:00Z"))),
        Arc::new(Transaction::new(Some(-100), None)),
    ];
    let mut notices = Vec::new();
    let summary = aggregate(&txns, &mut notices);
    assert_eq!(keys(&summary), vec!["2024-01", "average"]);
    assert_eq!(summary.get("2024-01").unwrap().spent, dec!(0.01));
    assert_eq!(notices.len(), 3);
    let reasons: Vec<&str> = notices
        .iter()
        .map(|n| match n {
            Notice::Unaggregated { reason, .. } => *reason,
            other => panic!("unexpected notice {other:?}"),
        })
        .collect();
    assert_eq!(reasons, vec!["no month", "no amount", "no month"]);
}

#[test]
fn test_aggregate_zero_amount_counts_toward_month() {
    let summary = aggregate(&[txn(0, "2024-02-01T00:00:00Z")], &mut Vec::new());
    let feb = summary.get("2024-02").unwrap();
    assert_eq!(feb.income, Decimal::ZERO);
    assert_eq!(feb.spent, Decimal::ZERO);
    assert_eq!(feb.transactions.len(), 1);
}

#[test]
fn test_aggregate_in_offset_moves_month() {
    let txns = vec![txn(-100, "2024-02-01T02:00:00Z")];
    let utc = aggregate(&txns, &mut Vec::new());
    assert!(utc.get("2024-02").is_some());

    let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
    let shifted = aggregate_in(&txns, Some(eastern), &mut Vec::new());
    assert_eq!(keys(&shifted), vec!["2024-01", "average"]);
}

// ── Totals and averages ───────────────────────────────────────

#[test]
fn test_aggregate_totals_match_contributions() {
    let txns = vec![
        txn(5194500, "2014-11-03T18:58:00Z"),
        txn(-99900, "2014-11-03T06:25:00Z"),
        txn(-129200, "2014-11-11T16:29:00Z"),
        txn(1, "2015-05-01T00:00:00Z"),
        txn(-400000, "2015-05-05T00:00:00Z"),
        txn(-3, "2016-01-01T00:00:00Z"),
    ];
    let summary = aggregate(&txns, &mut Vec::new());
    let month_total: Decimal = summary.months().map(|(_, a)| a.income + a.spent).sum();
    let txn_total: Decimal = txns.iter().map(|t| t.income() + t.spent()).sum();
    assert_eq!(month_total, txn_total);
}

#[test]
fn test_aggregate_average_is_mean_of_months() {
    let txns = vec![
        txn(1000000, "2024-01-01T00:00:00Z"),
        txn(-200000, "2024-01-02T00:00:00Z"),
        txn(-400000, "2024-02-01T00:00:00Z"),
        txn(500000, "2024-03-01T00:00:00Z"),
    ];
    let summary = aggregate(&txns, &mut Vec::new());
    let avg = summary.average().unwrap();
    assert_eq!(avg.income, dec!(50));
    assert_eq!(avg.spent, dec!(20));
    assert!(avg.transactions.is_empty());
}

#[test]
fn test_aggregate_average_ignores_existing_average() {
    let summary = aggregate(
        &[
            txn(1000000, "2024-01-01T00:00:00Z"),
            txn(3000000, "2024-02-01T00:00:00Z"),
        ],
        &mut Vec::new(),
    );
    // Recomputing over all rows, average included, gives the same result
    let again = MonthlyAggregate::average(summary.rows().iter().map(|(b, a)| (b, a)));
    assert_eq!(again.income, dec!(200));
    assert_eq!(summary.average().unwrap().income, dec!(200));
}

#[test]
fn test_summary_max() {
    let summary = aggregate(
        &[
            txn(1000000, "2024-01-01T00:00:00Z"),
            txn(-900000, "2024-01-01T00:00:00Z"),
            txn(3000000, "2024-02-01T00:00:00Z"),
            txn(-100000, "2024-02-01T00:00:00Z"),
        ],
        &mut Vec::new(),
    );
    let max = summary.max();
    assert_eq!(max.income, dec!(300));
    assert_eq!(max.spent, dec!(90));
}

// ── Serialization ─────────────────────────────────────────────

#[test]
fn test_summary_serializes_in_key_order() {
    let summary = aggregate(
        &[
            txn(-58600, "2015-05-03T00:00:00Z"),
            txn(5194500, "2014-11-03T00:00:00Z"),
        ],
        &mut Vec::new(),
    );
    let json = serde_json::to_string(&summary).unwrap();
    assert_eq!(
        json,
        concat!(
            r#"{"2014-11":{"spent":"$0.00","income":"$519.45"},"#,
            r#""2015-05":{"spent":"$5.86","income":"$0.00"},"#,
            r#""average":{"spent":"$2.93","income":"$259.73"}}"#
        )
    );
}

#[test]
fn test_summary_len() {
    let summary = aggregate(&[txn(-1, "2024-01-01T00:00:00Z")], &mut Vec::new());
    assert_eq!(summary.len(), 2);
}
