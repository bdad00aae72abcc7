//! Database module for the checking engine.
//!
//! Provides SQLite storage of per-host value stores.

mod models;
mod store;

pub use models::*;
pub use store::*;
