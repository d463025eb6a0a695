//! Store trait definition.
//!
//! The `Store` trait defines the contract every backend implements. The
//! user interface only talks to this trait; it never touches files or the
//! document collection directly.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};
use crate::record::{Field, Record};

use super::transaction::TransactionKind;

/// A named record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Items,
    Transactions,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Items, Source::Transactions];

    pub fn name(self) -> &'static str {
        match self {
            Source::Items => "items",
            Source::Transactions => "transactions",
        }
    }

    /// Canonical header row for this source.
    pub fn schema(self) -> &'static [Field] {
        const ITEMS: [Field; 5] = [
            Field::Id,
            Field::Description,
            Field::UnitPrice,
            Field::QtyInStock,
            Field::TotalPrice,
        ];
        const TRANSACTIONS: [Field; 7] = [
            Field::Id,
            Field::Description,
            Field::UnitPrice,
            Field::QtyInStock,
            Field::TotalPrice,
            Field::TransactionType,
            Field::Date,
        ];
        match self {
            Source::Items => &ITEMS,
            Source::Transactions => &TRANSACTIONS,
        }
    }
}

impl FromStr for Source {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "items" => Ok(Source::Items),
            "transactions" => Ok(Source::Transactions),
            other => Err(StoreError::UnknownSource(other.to_string())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Backend-neutral storage contract.
///
/// All implementations must ensure:
/// - Every item mutation appends exactly one transaction record
/// - A failed call leaves the persisted form at its last good state
/// - Reads reflect every committed mutation of this instance
pub trait Store {
    /// Names of the configured collections, in a stable order.
    fn sources(&self) -> Vec<Source> {
        Source::ALL.to_vec()
    }

    /// Defined fields of the first record in `source`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmptySource` if the source has no records.
    fn headers(&self, source: Source) -> Result<Vec<Field>> {
        self.read_all(source)?
            .first()
            .map(|record| record.defined_fields().to_vec())
            .ok_or_else(|| StoreError::EmptySource(source.name().to_string()))
    }

    /// Persist a new record.
    ///
    /// For `items`, `values` start at `description`; a fresh id is assigned
    /// and a linked transaction of type `kind` is appended after the item is
    /// persisted. Other sources store `values` as given.
    ///
    /// # Returns
    ///
    /// Returns `false` without writing when `values` is empty.
    fn add_record(&mut self, values: &[String], source: Source, kind: TransactionKind)
        -> Result<bool>;

    /// Replace one field of the item with `id` and append an `updated`
    /// transaction of the full post-update record.
    ///
    /// `totalPrice` is recomputed when `unitPrice` or `qtyInStock` changes.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no item has `id`
    /// - `InvalidInput` for `id` or the derived `totalPrice`
    /// - `MalformedValue` if `value` does not fit the field's type
    fn update_record(&mut self, id: &str, field: Field, value: &str) -> Result<()>;

    /// Remove the item with `id` and append a `deleted` transaction of the
    /// pre-deletion record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no item has `id`.
    fn delete_record(&mut self, id: &str) -> Result<()>;

    /// Full contents of `source`.
    fn read_all(&self, source: Source) -> Result<Vec<Record>>;

    /// Records whose `field` contains `needle` as a literal substring.
    ///
    /// Searching `id` for the empty string returns every record.
    fn search(&self, source: Source, field: Field, needle: &str) -> Result<Vec<Record>>;

    /// Identifier for the next item.
    fn generate_id(&self) -> Result<String>;

    /// Ids of every item, in storage order.
    fn ids(&self) -> Result<Vec<String>> {
        Ok(self
            .read_all(Source::Items)?
            .iter()
            .filter_map(|record| record.id().map(str::to_string))
            .collect())
    }
}
