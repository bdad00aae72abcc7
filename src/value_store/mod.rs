//! Persistent per-host value stores.
//!
//! A host's store is loaded once at the start of its check cycle, mutated by
//! the check functions through namespaced views and written back once at the
//! end. Stores of different hosts never share state.

mod manager;
mod store;

pub use manager::*;
pub use store::*;

use crate::db::DbError;
use thiserror::Error;

/// Value store error types.
#[derive(Error, Debug)]
pub enum ValueStoreError {
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error("value store of host {0} is held by another cycle")]
    HostBusy(String),
    #[error("value store lease registry poisoned")]
    Poisoned,
}
