//! Storage abstraction for Stockbook.
//!
//! This module defines the `Store` trait and its two backends.
//!
//! ## Architecture
//!
//! The storage layer is backend-agnostic:
//! - `FlatFileStore`: one delimited text file per source, cached in memory
//! - `DocumentStore`: a document collection reached through a client
//!
//! Both derive a transaction record for every item mutation through
//! [`transaction::derive`].

pub mod document;
pub mod flat_file;
pub mod traits;
pub mod transaction;

// Re-export public types
pub use document::{DocumentClient, DocumentStore, LocalCluster};
pub use flat_file::FlatFileStore;
pub use traits::{Source, Store};
pub use transaction::TransactionKind;

use crate::error::{Result, StoreError};
use crate::record::Field;

/// Reject updates to fields callers may not set directly.
pub(crate) fn ensure_updatable(field: Field) -> Result<()> {
    match field {
        Field::Id => Err(StoreError::InvalidInput(
            "The id of an item cannot be changed".to_string(),
        )),
        Field::TotalPrice => Err(StoreError::InvalidInput(
            "totalPrice is derived from unitPrice and qtyInStock".to_string(),
        )),
        _ => Ok(()),
    }
}
