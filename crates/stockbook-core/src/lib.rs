//! # Stockbook Core
//!
//! Core library for Stockbook - an inventory book that keeps items and an
//! automatically derived audit trail of transactions.
//!
//! This crate provides the record model, the backend-neutral storage contract
//! and its two backends, independent of any user interface.
//!
//! ## Architecture
//!
//! - **record**: Sparse, ordered-field rows and their typed fields
//! - **storage**: The `Store` contract, the flat-file and document engines,
//!   and transaction derivation
//! - **config**: Backend selection at startup
//! - **fs**: Atomic file replacement helpers

pub mod config;
pub mod error;
pub mod fs;
pub mod record;
pub mod storage;

pub use config::{open_store, BackendConfig};
pub use error::{Result, StoreError};
pub use record::{Field, Record, Value};
pub use storage::{Source, Store, TransactionKind};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
