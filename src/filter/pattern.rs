use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use super::{Filter, Notice};
use crate::models::Transaction;

/// Text field of a transaction that a pattern can be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    AccountId,
    Merchant,
    RawMerchant,
    Categorization,
    TransactionId,
}

impl Field {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::AccountId => "account-id",
            Self::Merchant => "merchant",
            Self::RawMerchant => "raw-merchant",
            Self::Categorization => "categorization",
            Self::TransactionId => "transaction-id",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "account-id" | "account" => Some(Self::AccountId),
            "merchant" => Some(Self::Merchant),
            "raw-merchant" => Some(Self::RawMerchant),
            "categorization" | "category" => Some(Self::Categorization),
            "transaction-id" | "id" => Some(Self::TransactionId),
            _ => None,
        }
    }

    pub(crate) fn all() -> &'static [Field] {
        &[
            Self::AccountId,
            Self::Merchant,
            Self::RawMerchant,
            Self::Categorization,
            Self::TransactionId,
        ]
    }

    /// Value of this field; unset fields read as the empty string.
    pub(crate) fn value_of<'a>(&self, transaction: &'a Transaction) -> &'a str {
        let value = match self {
            Self::AccountId => transaction.account_id(),
            Self::Merchant => transaction.merchant(),
            Self::RawMerchant => transaction.raw_merchant(),
            Self::Categorization => transaction.categorization(),
            Self::TransactionId => transaction.transaction_id(),
        };
        value.unwrap_or("")
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps a transaction when the case-insensitive match of `regex` against
/// `field` equals `!invert`. Without a usable regex it keeps everything.
#[derive(Debug, Clone)]
pub(crate) struct PatternFilter {
    name: String,
    field: Field,
    regex: Option<Regex>,
    invert: bool,
    disabled: Option<String>,
}

impl PatternFilter {
    pub(crate) fn by_field(field: Field, pattern: &str, invert: bool) -> Self {
        let (regex, disabled) = if pattern.is_empty() {
            (None, Some("empty pattern".to_string()))
        } else {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => (Some(re), None),
                Err(e) => (None, Some(format!("invalid pattern '{pattern}': {e}"))),
            }
        };
        Self {
            name: field.as_str().to_string(),
            field,
            regex,
            invert,
            disabled,
        }
    }

    pub(crate) fn reject_by_field(field: Field, pattern: &str) -> Self {
        Self::by_field(field, pattern, true)
    }

    /// Split `text` on commas into literal alternatives. Blank or missing
    /// text gives the identity filter.
    pub(crate) fn by_comma_list(field: Field, text: Option<&str>, invert: bool) -> Self {
        let tokens: Vec<String> = text
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();

        if tokens.is_empty() {
            return Self {
                name: field.as_str().to_string(),
                field,
                regex: None,
                invert,
                disabled: None,
            };
        }
        Self::by_field(field, &tokens.join("|"), invert)
    }

    pub(crate) fn named(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.regex.is_none()
    }

    pub(crate) fn keeps(&self, transaction: &Transaction) -> bool {
        match &self.regex {
            Some(re) => re.is_match(self.field.value_of(transaction)) != self.invert,
            None => true,
        }
    }
}

impl Filter for PatternFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        transactions: &[Arc<Transaction>],
        notices: &mut Vec<Notice>,
    ) -> Vec<Arc<Transaction>> {
        if let Some(reason) = &self.disabled {
            tracing::warn!(filter = %self.name, "{reason}; filter is a no-op");
            notices.push(Notice::FilterDisabled {
                filter: self.name.clone(),
                reason: reason.clone(),
            });
        }
        if self.is_identity() {
            return transactions.to_vec();
        }

        let mut kept = Vec::with_capacity(transactions.len());
        for txn in transactions {
            if self.keeps(txn) {
                kept.push(Arc::clone(txn));
            } else {
                tracing::debug!(
                    filter = %self.name,
                    field = %self.field,
                    value = self.field.value_of(txn),
                    "rejected transaction"
                );
                notices.push(Notice::Rejected {
                    filter: self.name.clone(),
                    transaction: Arc::clone(txn),
                });
            }
        }
        kept
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
