//! In-process document cluster.
//!
//! Keeps collections in memory and, when given a snapshot path, persists
//! them as one JSON file replaced atomically after every write. Filters are
//! evaluated with the same semantics the Mongo query they render to has.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value as JsonValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};

use super::client::{Document, DocumentClient, Filter};

type Collections = BTreeMap<String, Vec<Document>>;

/// Document client backed by process memory and an optional JSON snapshot.
#[derive(Debug, Default)]
pub struct LocalCluster {
    snapshot: Option<PathBuf>,
    collections: Mutex<Collections>,
}

impl LocalCluster {
    /// A cluster that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A cluster persisted to `path`. Nothing is read until [`ping`].
    ///
    /// [`ping`]: DocumentClient::ping
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot: Some(path.into()),
            collections: Mutex::new(Collections::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Persistence("Document cluster lock poisoned".to_string()))
    }

    /// Apply `edit` to a copy of the collections, persist the copy, then
    /// swap it in. Memory changes only once the snapshot is written. An edit
    /// returning `None` changed nothing and is not persisted.
    fn write<T>(&self, edit: impl FnOnce(&mut Collections) -> Option<T>) -> Result<Option<T>> {
        let mut collections = self.lock()?;
        let mut next = collections.clone();
        let Some(outcome) = edit(&mut next) else {
            return Ok(None);
        };
        self.persist(&next)?;
        *collections = next;
        Ok(Some(outcome))
    }

    fn persist(&self, collections: &Collections) -> Result<()> {
        if let Some(path) = &self.snapshot {
            let data = serde_json::to_vec_pretty(collections)?;
            crate::fs::write_atomic(path, &data)?;
            debug!(path = %path.display(), "wrote document snapshot");
        }
        Ok(())
    }

    fn matches(filter: &Filter, document: &Document) -> bool {
        match filter {
            Filter::All => true,
            Filter::Eq { field, value } => {
                document.get(field).and_then(JsonValue::as_str) == Some(value.as_str())
            }
            // A string pattern never matches a stored number.
            Filter::Contains { field, needle } => document
                .get(field)
                .and_then(JsonValue::as_str)
                .is_some_and(|text| contains_ignore_case(text, needle)),
            Filter::StringifiedContains { field, needle } => document
                .get(field)
                .and_then(stringify)
                .is_some_and(|text| contains_ignore_case(&text, needle)),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn stringify(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) => Some(text.clone()),
        JsonValue::Number(number) => Some(number.to_string()),
        JsonValue::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

impl DocumentClient for LocalCluster {
    fn ping(&self) -> Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let data = fs::read(path).map_err(|e| {
            StoreError::Connection(format!("Cannot read snapshot {}: {}", path.display(), e))
        })?;
        let loaded: Collections = serde_json::from_slice(&data).map_err(|e| {
            StoreError::Connection(format!("Corrupt snapshot {}: {}", path.display(), e))
        })?;
        *self.lock()? = loaded;
        Ok(())
    }

    fn object_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn insert_one(&self, collection: &str, document: Document) -> Result<()> {
        let document = if document.contains_key("_id") {
            document
        } else {
            let mut with_id = Document::new();
            with_id.insert("_id".to_string(), JsonValue::String(self.object_id()));
            with_id.extend(document);
            with_id
        };

        self.write(|collections| {
            collections
                .entry(collection.to_string())
                .or_default()
                .push(document);
            Some(())
        })?;
        Ok(())
    }

    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| Self::matches(filter, document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn update_one(&self, collection: &str, filter: &Filter, set: Document) -> Result<u64> {
        let updated = self.write(|collections| {
            let document = collections
                .get_mut(collection)?
                .iter_mut()
                .find(|d| Self::matches(filter, d))?;
            document.extend(set);
            Some(())
        })?;
        Ok(u64::from(updated.is_some()))
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let deleted = self.write(|collections| {
            let documents = collections.get_mut(collection)?;
            let position = documents.iter().position(|d| Self::matches(filter, d))?;
            documents.remove(position);
            Some(())
        })?;
        Ok(u64::from(deleted.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(value: JsonValue) -> Document {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_insert_assigns_leading_id() {
        let cluster = LocalCluster::in_memory();
        cluster
            .insert_one("items", doc(json!({ "description": "Widget" })))
            .unwrap();

        let found = cluster.find("items", &Filter::All).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].keys().next().map(String::as_str), Some("_id"));
    }

    #[test]
    fn test_plain_substring_does_not_match_numbers() {
        let cluster = LocalCluster::in_memory();
        cluster
            .insert_one("items", doc(json!({ "unitPrice": 2.5 })))
            .unwrap();

        let plain = Filter::Contains {
            field: "unitPrice".to_string(),
            needle: "2.5".to_string(),
        };
        let stringified = Filter::StringifiedContains {
            field: "unitPrice".to_string(),
            needle: "2.5".to_string(),
        };
        assert!(cluster.find("items", &plain).unwrap().is_empty());
        assert_eq!(cluster.find("items", &stringified).unwrap().len(), 1);
    }

    #[test]
    fn test_update_and_delete_first_match_only() {
        let cluster = LocalCluster::in_memory();
        for name in ["a", "a"] {
            cluster
                .insert_one("items", doc(json!({ "description": name })))
                .unwrap();
        }
        let filter = Filter::Eq {
            field: "description".to_string(),
            value: "a".to_string(),
        };

        let updated = cluster
            .update_one("items", &filter, doc(json!({ "description": "b" })))
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(cluster.find("items", &filter).unwrap().len(), 1);

        assert_eq!(cluster.delete_one("items", &filter).unwrap(), 1);
        assert_eq!(cluster.delete_one("items", &filter).unwrap(), 0);
        assert_eq!(cluster.find("items", &Filter::All).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_snapshot_write_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let cluster = LocalCluster::with_snapshot(dir.path().join("missing").join("cluster.json"));
        cluster.ping().unwrap();

        let result = cluster.insert_one("items", doc(json!({ "_id": "x1" })));

        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert!(cluster.find("items", &Filter::All).unwrap().is_empty());
    }

    #[test]
    fn test_failed_snapshot_write_keeps_document_on_delete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("cluster.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let cluster = LocalCluster::with_snapshot(&path);
        cluster.ping().unwrap();
        cluster
            .insert_one("items", doc(json!({ "_id": "x1", "description": "Widget" })))
            .unwrap();
        fs::remove_dir_all(path.parent().unwrap()).unwrap();

        let filter = Filter::Eq {
            field: "_id".to_string(),
            value: "x1".to_string(),
        };
        assert!(cluster.delete_one("items", &filter).is_err());
        assert!(cluster
            .update_one("items", &filter, doc(json!({ "description": "Gadget" })))
            .is_err());

        let found = cluster.find("items", &Filter::All).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("description"), Some(&json!("Widget")));
    }

    #[test]
    fn test_snapshot_survives_reconnect() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cluster.json");

        let cluster = LocalCluster::with_snapshot(&path);
        cluster.ping().unwrap();
        cluster
            .insert_one("items", doc(json!({ "_id": "x1", "description": "Widget" })))
            .unwrap();

        let reopened = LocalCluster::with_snapshot(&path);
        reopened.ping().unwrap();
        let found = reopened.find("items", &Filter::All).unwrap();
        assert_eq!(found[0].get("_id"), Some(&json!("x1")));
    }

    #[test]
    fn test_corrupt_snapshot_fails_handshake() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cluster.json");
        fs::write(&path, "not json").unwrap();

        let cluster = LocalCluster::with_snapshot(&path);
        assert!(matches!(cluster.ping(), Err(StoreError::Connection(_))));
    }
}
