// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! SQLite-backed document store for cards, decks, users, and password
//! reset tokens. Decks are stored as documents: the line set lives in a
//! single JSON column and is always written whole, never patched.

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter, Write as _};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

pub const CRATE_NAME: &str = "cardkeep-store";

mod cards;
mod decks;
mod schema;
mod tokens;
mod users;

pub use tokens::hash_reset_token;

#[derive(Debug)]
#[non_exhaustive]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    Query(String),
    NotFound(&'static str),
    Duplicate(&'static str),
    Invalid(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "sqlite error: {e}"),
            Self::Serde(e) => write!(f, "document encode/decode error: {e}"),
            Self::Query(msg) => write!(f, "query error: {msg}"),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Duplicate(what) => write!(f, "{what} already exists"),
            Self::Invalid(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            Self::Serde(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e)
    }
}

impl From<cardkeep_query::QueryError> for StoreError {
    fn from(e: cardkeep_query::QueryError) -> Self {
        Self::Query(e.0)
    }
}

/// Seconds since the unix epoch. Clock regressions clamp to zero rather
/// than panic.
#[must_use]
pub fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Generates a fresh entity id: a short prefix plus the first eight bytes
/// of a SHA-256 over wall clock nanos and a process-wide counter, hex
/// encoded. Unique within a process and effectively unique across restarts.
#[must_use]
pub fn new_entity_id(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(nanos.to_le_bytes());
    hasher.update(seq.to_le_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(prefix.len() + 17);
    out.push_str(prefix);
    out.push('-');
    for byte in &digest[..8] {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Handle to the backing database. All access serializes through one
/// connection; writes are single statements, so the last write wins at
/// statement granularity.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(schema::SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Invalid("store connection mutex poisoned".to_string()))
    }
}
