//! Backend selection.
//!
//! The backend is chosen once at startup from configuration; callers then
//! hold the resulting `Box<dyn Store>` for the rest of the session.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{DocumentStore, FlatFileStore, LocalCluster, Store};

/// Which storage engine to open, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BackendConfig {
    /// `items.txt` and `transactions.txt` inside `directory`
    FlatFile { directory: PathBuf },
    /// Document collections, snapshotted to `snapshot` when set
    Document {
        #[serde(default)]
        snapshot: Option<PathBuf>,
    },
}

/// Open the configured store.
///
/// # Errors
///
/// Propagates the backend's open or handshake failure.
pub fn open_store(config: &BackendConfig) -> Result<Box<dyn Store>> {
    match config {
        BackendConfig::FlatFile { directory } => Ok(Box::new(FlatFileStore::open(directory)?)),
        BackendConfig::Document { snapshot } => Ok(Box::new(connect_document(snapshot)?)),
    }
}

/// Like [`open_store`], laying down empty flat files first when missing.
pub fn create_store(config: &BackendConfig) -> Result<Box<dyn Store>> {
    match config {
        BackendConfig::FlatFile { directory } => Ok(Box::new(FlatFileStore::create(directory)?)),
        BackendConfig::Document { snapshot } => Ok(Box::new(connect_document(snapshot)?)),
    }
}

fn connect_document(snapshot: &Option<PathBuf>) -> Result<DocumentStore<LocalCluster>> {
    let cluster = match snapshot {
        Some(path) => LocalCluster::with_snapshot(path),
        None => LocalCluster::in_memory(),
    };
    DocumentStore::connect(cluster)
}
