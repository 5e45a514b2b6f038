mod aggregate;
mod transaction;

pub(crate) use aggregate::{Bucket, MonthlyAggregate};
pub(crate) use transaction::{MonthKey, RawTransaction, Transaction, AMOUNT_SCALE};
