use rust_decimal::{Decimal, RoundingStrategy};

/// Round half away from zero to whole cents.
pub(crate) fn to_cents(val: Decimal) -> Decimal {
    val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Currency string for serialized output: `$` and exactly two decimals, no
/// separators. e.g. `519.45` → `"$519.45"`
pub(crate) fn format_currency(val: Decimal) -> String {
    let cents = to_cents(val);
    let abs = cents.abs();
    if cents < Decimal::ZERO {
        format!("-${abs:.2}")
    } else {
        format!("${abs:.2}")
    }
}

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"$1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let abs = to_cents(val).abs();
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO && abs > Decimal::ZERO {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Collect `(key, value)` pairs into a list ordered by key. The sort is
/// stable, so equal keys keep their incoming order.
pub(crate) fn sort_by_key<K: Ord, V>(entries: impl IntoIterator<Item = (K, V)>) -> Vec<(K, V)> {
    let mut sorted: Vec<(K, V)> = entries.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
}
