//! Document collection storage backend.
//!
//! Items are documents whose collection-assigned `_id` is the item id.
//! Transaction documents carry their own `_id` plus a reference to the item
//! under `id`, so every id query is built for the source it targets.
//!
//! Numbers are stored typed. A substring search on a numeric field converts
//! the field to a string inside the query before matching.

mod client;
mod local;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::record::{Field, Record, Value};

use super::ensure_updatable;
use super::traits::{Source, Store};
use super::transaction::{self, TransactionKind};

pub use client::{Document, DocumentClient, Filter};
pub use local::LocalCluster;

/// Store backed by a [`DocumentClient`].
#[derive(Debug)]
pub struct DocumentStore<C> {
    client: C,
}

impl<C: DocumentClient> DocumentStore<C> {
    /// Handshake with the server and wrap the client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the handshake fails. There is no
    /// retry.
    pub fn connect(client: C) -> Result<Self> {
        client.ping().map_err(|err| match err {
            StoreError::Connection(_) => err,
            other => StoreError::Connection(other.to_string()),
        })?;
        info!("connected to document backend");
        Ok(Self { client })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Document key holding the item id in `source`.
    fn id_key(source: Source) -> &'static str {
        match source {
            Source::Items => "_id",
            Source::Transactions => "id",
        }
    }

    fn id_filter(source: Source, id: &str) -> Filter {
        Filter::Eq {
            field: Self::id_key(source).to_string(),
            value: id.to_string(),
        }
    }

    fn to_record(source: Source, document: &Document) -> Result<Record> {
        let mut values = Vec::with_capacity(document.len());
        for (key, value) in document {
            // A transaction's own `_id` is not part of the record.
            if source == Source::Transactions && key == "_id" {
                continue;
            }
            let field: Field = key.parse()?;
            let raw = match value {
                JsonValue::String(text) => text.clone(),
                other => other.to_string(),
            };
            values.push((field, Value::parse(field, &raw)?));
        }
        Record::from_values(values)
    }

    fn to_document(source: Source, record: &Record) -> Result<Document> {
        let mut document = Document::new();
        for (field, value) in record.values() {
            let key = match field {
                Field::Id => Self::id_key(source),
                other => other.name(),
            };
            document.insert(key.to_string(), serde_json::to_value(&value)?);
        }
        Ok(document)
    }

    fn find_item(&self, id: &str) -> Result<(Filter, Record)> {
        let filter = Self::id_filter(Source::Items, id);
        let document = self
            .client
            .find(Source::Items.name(), &filter)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                warn!(id, "no item matched");
                StoreError::NotFound(id.to_string())
            })?;
        Ok((filter, Self::to_record(Source::Items, &document)?))
    }

    fn record_transaction(&self, item: &Record, kind: TransactionKind) -> Result<()> {
        let txn = transaction::derive(item, kind, transaction::today())?;
        self.client.insert_one(
            Source::Transactions.name(),
            Self::to_document(Source::Transactions, &txn)?,
        )?;
        info!(id = item.id().unwrap_or_default(), kind = %kind, "recorded transaction");
        Ok(())
    }
}

impl<C: DocumentClient> Store for DocumentStore<C> {
    fn add_record(
        &mut self,
        values: &[String],
        source: Source,
        kind: TransactionKind,
    ) -> Result<bool> {
        if values.is_empty() {
            return Ok(false);
        }

        match source {
            Source::Items => {
                let mut row = Vec::with_capacity(values.len() + 1);
                row.push(self.generate_id()?);
                row.extend(values.iter().cloned());
                let record = Record::from_row(&row, Source::Items.schema())?;

                self.client
                    .insert_one(source.name(), Self::to_document(source, &record)?)?;
                info!(id = record.id().unwrap_or_default(), "added item");
                self.record_transaction(&record, kind)?;
            }
            Source::Transactions => {
                let record = Record::from_row(values, source.schema())?;
                self.client
                    .insert_one(source.name(), Self::to_document(source, &record)?)?;
            }
        }
        Ok(true)
    }

    fn update_record(&mut self, id: &str, field: Field, value: &str) -> Result<()> {
        ensure_updatable(field)?;
        let (filter, current) = self.find_item(id)?;

        let mut updated = current.with_value(field, value)?;
        if field.affects_total() {
            updated = updated.with_recomputed_total();
        }

        let mut set = Document::new();
        for changed in [field, Field::TotalPrice] {
            if let Some(new_value) = updated.get(changed) {
                if current.get(changed).as_ref() != Some(&new_value) {
                    set.insert(changed.name().to_string(), serde_json::to_value(&new_value)?);
                }
            }
        }
        if self.client.update_one(Source::Items.name(), &filter, set)? == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        info!(id, field = %field, "updated item");

        self.record_transaction(&updated, TransactionKind::Updated)
    }

    fn delete_record(&mut self, id: &str) -> Result<()> {
        let (filter, current) = self.find_item(id)?;
        if self.client.delete_one(Source::Items.name(), &filter)? == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        info!(id, "deleted item");

        self.record_transaction(&current, TransactionKind::Deleted)
    }

    fn read_all(&self, source: Source) -> Result<Vec<Record>> {
        self.client
            .find(source.name(), &Filter::All)?
            .iter()
            .map(|document| Self::to_record(source, document))
            .collect()
    }

    fn search(&self, source: Source, field: Field, needle: &str) -> Result<Vec<Record>> {
        let filter = match field {
            Field::Id if needle.is_empty() => Filter::All,
            Field::Id => Self::id_filter(source, needle),
            numeric if numeric.is_numeric() => Filter::StringifiedContains {
                field: numeric.name().to_string(),
                needle: needle.to_string(),
            },
            text => Filter::Contains {
                field: text.name().to_string(),
                needle: needle.to_string(),
            },
        };

        self.client
            .find(source.name(), &filter)?
            .iter()
            .map(|document| Self::to_record(source, document))
            .collect()
    }

    /// A fresh collection-assigned identifier.
    fn generate_id(&self) -> Result<String> {
        Ok(self.client.object_id())
    }
}
