#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::util::*;

// ── format_currency ───────────────────────────────────────────

#[test]
fn test_format_currency_basic() {
    assert_eq!(format_currency(dec!(519.45)), "$519.45");
    assert_eq!(format_currency(dec!(9.99)), "$9.99");
}

#[test]
fn test_format_currency_pads_decimals() {
    assert_eq!(format_currency(dec!(200)), "$200.00");
    assert_eq!(format_currency(dec!(0.5)), "$0.50");
    assert_eq!(format_currency(Decimal::ZERO), "$0.00");
}

#[test]
fn test_format_currency_no_separators() {
    assert_eq!(format_currency(dec!(1234567.89)), "$1234567.89");
}

#[test]
fn test_format_currency_rounds_half_away_from_zero() {
    assert_eq!(format_currency(dec!(259.725)), "$259.73");
    assert_eq!(format_currency(dec!(733.8349)), "$733.83");
}

#[test]
fn test_format_currency_negative() {
    assert_eq!(format_currency(dec!(-5.86)), "-$5.86");
}

// ── format_amount ─────────────────────────────────────────────

#[test]
fn test_format_amount_positive() {
    assert_eq!(format_amount(dec!(1234.56)), "$1,234.56");
}

#[test]
fn test_format_amount_negative() {
    assert_eq!(format_amount(dec!(-42.99)), "-$42.99");
}

#[test]
fn test_format_amount_zero() {
    assert_eq!(format_amount(Decimal::ZERO), "$0.00");
}

#[test]
fn test_format_amount_large() {
    assert_eq!(format_amount(dec!(1234567.89)), "$1,234,567.89");
}

#[test]
fn test_format_amount_small() {
    assert_eq!(format_amount(dec!(0.01)), "$0.01");
}

#[test]
fn test_format_amount_exact_thousands() {
    assert_eq!(format_amount(dec!(1000.00)), "$1,000.00");
    assert_eq!(format_amount(dec!(999.99)), "$999.99");
}

#[test]
fn test_format_amount_rounds_to_cents() {
    assert_eq!(format_amount(dec!(12.345)), "$12.35");
    // Rounds to zero, so no minus sign
    assert_eq!(format_amount(dec!(-0.001)), "$0.00");
}

// ── sort_by_key ───────────────────────────────────────────────

#[test]
fn test_sort_by_key_orders_strings() {
    let sorted = sort_by_key(vec![("2015-05", 2), ("average", 3), ("2014-11", 1)]);
    let keys: Vec<&str> = sorted.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec!["2014-11", "2015-05", "average"]);
}

#[test]
fn test_sort_by_key_stable_for_equal_keys() {
    let sorted = sort_by_key(vec![("b", 1), ("a", 2), ("b", 3)]);
    assert_eq!(sorted, vec![("a", 2), ("b", 1), ("b", 3)]);
}

#[test]
fn test_sort_by_key_empty() {
    let sorted: Vec<(String, i32)> = sort_by_key(Vec::new());
    assert!(sorted.is_empty());
}
