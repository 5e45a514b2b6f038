use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::RawTransaction;

/// The feed either returns a bare array or wraps it in `{"transactions": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    List(Vec<RawTransaction>),
    Wrapped { transactions: Vec<RawTransaction> },
}

pub(crate) fn parse_json(text: &str) -> Result<Vec<RawTransaction>> {
    let doc: FeedDocument = serde_json::from_str(text)
        .context("expected an array of transactions or {\"transactions\": [...]}")?;
    Ok(match doc {
        FeedDocument::List(records)
        | FeedDocument::Wrapped {
            transactions: records,
        } => records,
    })
}
