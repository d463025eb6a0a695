//! Transaction derivation.
//!
//! Both engines call [`derive`] after an item mutation has been persisted to
//! build the audit record they then append to the `transactions` source.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};

use crate::error::{Result, StoreError};
use crate::record::{Field, Record, Value};

use super::traits::Source;

/// Persisted format of the `date` field.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// What happened to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionKind {
    #[default]
    Added,
    Updated,
    Deleted,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Added => "added",
            TransactionKind::Updated => "updated",
            TransactionKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "added" => Ok(TransactionKind::Added),
            "updated" => Ok(TransactionKind::Updated),
            "deleted" => Ok(TransactionKind::Deleted),
            other => Err(StoreError::InvalidInput(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

/// Local calendar date used to stamp new transactions.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Build the transaction record for `item`.
///
/// Carries every item column the item defines, then `transactionType` and
/// `date`.
///
/// # Errors
///
/// Returns `StoreError::InvalidInput` if the item has no id.
pub fn derive(item: &Record, kind: TransactionKind, date: NaiveDate) -> Result<Record> {
    if item.id().is_none() {
        return Err(StoreError::InvalidInput(
            "Cannot derive a transaction for an item without an id".to_string(),
        ));
    }

    let item_values = Source::Items
        .schema()
        .iter()
        .filter_map(|field| item.get(*field).map(|value| (*field, value)));
    let stamp = [
        (Field::TransactionType, Value::Text(kind.as_str().to_string())),
        (Field::Date, Value::Text(date.format(DATE_FORMAT).to_string())),
    ];

    Record::from_values(item_values.chain(stamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Record {
        Record::parse(
            &["00010", "Widget", "5.0", "3"],
            &["id", "description", "unitPrice", "qtyInStock"],
        )
        .unwrap()
    }

    #[test]
    fn test_derive_carries_item_and_stamp() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        let txn = derive(&widget(), TransactionKind::Updated, date).unwrap();

        assert_eq!(txn.defined_fields(), Source::Transactions.schema());
        assert_eq!(txn.to_line(), "00010,Widget,5.0,3,15.0,updated,07/03/2024");
    }

    #[test]
    fn test_derive_requires_id() {
        let item = Record::parse(&["Widget"], &["description"]).unwrap();
        let result = derive(&item, TransactionKind::Added, today());
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            TransactionKind::Added,
            TransactionKind::Updated,
            TransactionKind::Deleted,
        ] {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert_eq!(TransactionKind::default(), TransactionKind::Added);
    }
}
