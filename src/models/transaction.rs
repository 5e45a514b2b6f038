use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{de::IgnoredAny, Deserialize, Deserializer};

/// Amounts are stored in 1/10,000 of the currency's major unit.
pub(crate) const AMOUNT_SCALE: u32 = 4;

/// Calendar month bucket, always `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct MonthKey(String);

impl MonthKey {
    /// Accepts only `YYYY-MM` with a month between 01 and 12.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return None;
        }
        if !bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit) {
            return None;
        }
        let month: u32 = s[5..].parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self(s.to_string()))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One record of the upstream feed, keyed the way the feed names its fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct RawTransaction {
    #[serde(deserialize_with = "lenient_string")]
    pub(crate) account_id: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) amount: Option<i64>,
    #[serde(deserialize_with = "lenient_string")]
    pub(crate) transaction_time: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub(crate) merchant: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub(crate) raw_merchant: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub(crate) categorization: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) clear_date: Option<i64>,
    #[serde(deserialize_with = "lenient_bool")]
    pub(crate) is_pending: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    pub(crate) transaction_id: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub(crate) aggregation_time: Option<i64>,
}

// A wrongly typed field reads as unset instead of failing the whole record.

#[derive(Deserialize)]
#[serde(untagged)]
enum IntField {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolField {
    Bool(bool),
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextField {
    Text(String),
    Other(IgnoredAny),
}

fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let field = Option::<IntField>::deserialize(d)?;
    Ok(field.and_then(|f| match f {
        IntField::Int(n) => Some(n),
        IntField::Float(x) if x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Some(x as i64),
        IntField::Text(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let field = Option::<BoolField>::deserialize(d)?;
    Ok(field.and_then(|f| match f {
        BoolField::Bool(b) => Some(b),
        BoolField::Text(s) => s.trim().to_lowercase().parse().ok(),
        BoolField::Other(_) => None,
    }))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let field = Option::<TextField>::deserialize(d)?;
    Ok(field.and_then(|f| match f {
        TextField::Text(s) => Some(s),
        TextField::Other(_) => None,
    }))
}

/// An immutable transaction. Fields are private; "changing" one produces a
/// new value through the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Transaction {
    account_id: Option<String>,
    amount: Option<i64>,
    transaction_time: Option<String>,
    timestamp: Option<DateTime<FixedOffset>>,
    merchant: Option<String>,
    raw_merchant: Option<String>,
    categorization: Option<String>,
    clear_date: Option<i64>,
    is_pending: Option<bool>,
    transaction_id: Option<String>,
    aggregation_time: Option<i64>,
}

impl Transaction {
    pub(crate) fn new(amount: Option<i64>, transaction_time: Option<&str>) -> Self {
        Self {
            account_id: None,
            amount,
            transaction_time: transaction_time.map(str::to_string),
            timestamp: transaction_time.and_then(parse_timestamp),
            merchant: None,
            raw_merchant: None,
            categorization: None,
            clear_date: None,
            is_pending: None,
            transaction_id: None,
            aggregation_time: None,
        }
    }

    pub(crate) fn from_raw(raw: RawTransaction) -> Self {
        let base = Self {
            clear_date: raw.clear_date,
            is_pending: raw.is_pending,
            aggregation_time: raw.aggregation_time,
            ..Self::new(raw.amount, raw.transaction_time.as_deref())
        };
        let updates: [(Option<String>, fn(Self, String) -> Self); 5] = [
            (raw.account_id, Self::with_account_id),
            (raw.merchant, Self::with_merchant),
            (raw.raw_merchant, Self::with_raw_merchant),
            (raw.categorization, Self::with_categorization),
            (raw.transaction_id, Self::with_transaction_id),
        ];
        updates
            .into_iter()
            .fold(base, |txn, (value, update)| match value {
                Some(value) => update(txn, value),
                None => txn,
            })
    }

    pub(crate) fn with_account_id(self, account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..self
        }
    }

    pub(crate) fn with_merchant(self, merchant: impl Into<String>) -> Self {
        Self {
            merchant: Some(merchant.into()),
            ..self
        }
    }

    pub(crate) fn with_raw_merchant(self, raw_merchant: impl Into<String>) -> Self {
        Self {
            raw_merchant: Some(raw_merchant.into()),
            ..self
        }
    }

    pub(crate) fn with_categorization(self, categorization: impl Into<String>) -> Self {
        Self {
            categorization: Some(categorization.into()),
            ..self
        }
    }

    pub(crate) fn with_transaction_id(self, transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: Some(transaction_id.into()),
            ..self
        }
    }

    pub(crate) fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub(crate) fn amount(&self) -> Option<i64> {
        self.amount
    }

    pub(crate) fn transaction_time(&self) -> Option<&str> {
        self.transaction_time.as_deref()
    }

    /// Parsed `transaction_time`; `None` when the timestamp is absent or malformed.
    pub(crate) fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp
    }

    pub(crate) fn merchant(&self) -> Option<&str> {
        self.merchant.as_deref()
    }

    pub(crate) fn raw_merchant(&self) -> Option<&str> {
        self.raw_merchant.as_deref()
    }

    pub(crate) fn categorization(&self) -> Option<&str> {
        self.categorization.as_deref()
    }

    pub(crate) fn clear_date(&self) -> Option<i64> {
        self.clear_date
    }

    pub(crate) fn is_pending(&self) -> Option<bool> {
        self.is_pending
    }

    pub(crate) fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub(crate) fn aggregation_time(&self) -> Option<i64> {
        self.aggregation_time
    }

    /// Month of the transaction as written in the feed (the `YYYY-MM` prefix).
    pub(crate) fn month(&self) -> Option<MonthKey> {
        self.timestamp?;
        let time = self.transaction_time.as_deref()?.trim();
        MonthKey::parse(time.get(..7)?)
    }

    /// Month of the transaction after shifting its instant into `offset`.
    pub(crate) fn month_in(&self, offset: FixedOffset) -> Option<MonthKey> {
        let local = self.timestamp?.with_timezone(&offset);
        MonthKey::parse(&local.format("%Y-%m").to_string())
    }

    pub(crate) fn income(&self) -> Decimal {
        match self.amount {
            Some(a) if a > 0 => Decimal::new(a, AMOUNT_SCALE),
            _ => Decimal::ZERO,
        }
    }

    pub(crate) fn spent(&self) -> Decimal {
        match self.amount {
            Some(a) if a < 0 => -Decimal::new(a, AMOUNT_SCALE),
            _ => Decimal::ZERO,
        }
    }

    /// Signed amount in currency units.
    pub(crate) fn value(&self) -> Option<Decimal> {
        self.amount.map(|a| Decimal::new(a, AMOUNT_SCALE))
    }

    /// Best label for display: merchant, then raw merchant, then id.
    pub(crate) fn label(&self) -> &str {
        self.merchant()
            .or(self.raw_merchant())
            .or(self.transaction_id())
            .unwrap_or("(unknown)")
    }
}

/// Parse a feed timestamp. RFC 3339 first; naive forms are taken as UTC.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    let utc = FixedOffset::east_opt(0)?;
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive).with_timezone(&utc));
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?).with_timezone(&utc))
}
