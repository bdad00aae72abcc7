//! SQLite database store implementation.

use rusqlite::{params, Connection, Result as SqlResult};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::models::*;

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("database connection lock poisoned")]
    Poisoned,
}

/// Thread-safe database store.
///
/// Every host owns a disjoint set of rows, so hosts can be loaded and saved
/// from parallel cycles without coordinating beyond the connection lock.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Create a store that lives in memory only.
    pub fn in_memory() -> Result<Self, DbError> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        store.init()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;
        Ok(())
    }

    // --- Value stores ---
    //
    // Floats are stored as their IEEE 754 bit pattern, NaN and -0.0 included.

    /// Load the complete value store of a host.
    pub fn load_value_store(&self, host: &str) -> Result<Vec<StoredSample>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT service, node, key, time_bits, value_bits FROM value_store \
             WHERE host = ?1 ORDER BY service, node, key",
        )?;

        let samples = stmt
            .query_map(params![host], |row| {
                let node: String = row.get(1)?;
                Ok(StoredSample {
                    service: row.get(0)?,
                    node: (!node.is_empty()).then_some(node),
                    key: row.get(2)?,
                    time: from_bits(row.get(3)?),
                    value: from_bits(row.get(4)?),
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(samples)
    }

    /// Replace the value store of a host in one transaction.
    pub fn save_value_store(&self, host: &str, samples: &[StoredSample]) -> Result<(), DbError> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute("DELETE FROM value_store WHERE host = ?1", params![host])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO value_store (host, service, node, key, time_bits, value_bits) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for s in samples {
                stmt.execute(params![
                    host,
                    s.service,
                    s.node.as_deref().unwrap_or(""),
                    s.key,
                    to_bits(s.time),
                    to_bits(s.value)
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Delete the value store of a host.
    pub fn delete_value_store(&self, host: &str) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM value_store WHERE host = ?1", params![host])?;
        Ok(())
    }

    /// Per-host entry counts.
    pub fn get_host_stats(&self) -> Result<Vec<HostStoreStat>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT host, COUNT(DISTINCT service), COUNT(*) FROM value_store GROUP BY host ORDER BY host",
        )?;

        let stats = stmt
            .query_map([], |row| {
                Ok(HostStoreStat {
                    host: row.get(0)?,
                    services: row.get(1)?,
                    entries: row.get(2)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(stats)
    }
}

fn to_bits(value: f64) -> i64 {
    value.to_bits() as i64
}

fn from_bits(bits: i64) -> f64 {
    f64::from_bits(bits as u64)
}
