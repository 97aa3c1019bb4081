//! Persistence layer for session packs.
//!
//! Storage is a plain key-value capability ([`Store`]) over four collections,
//! each held as one serialized JSON array. [`Repository`] adds typed
//! list/find on top, plus the crate-private writes the managers are built on.

mod memory;
mod repository;
mod schema;

pub use memory::*;
pub use repository::*;
pub use schema::*;

use std::fmt;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed {collection} collection: {source}")]
    Malformed {
        collection: Collection,
        source: serde_json::Error,
    },
}

pub type DbResult<T> = Result<T, DbError>;

/// The four independently keyed record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Templates,
    Packs,
    Ledger,
    Appointments,
}

impl Collection {
    /// Storage key of the collection.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Templates => "session-pack-templates",
            Collection::Packs => "session-patient-packs",
            Collection::Ledger => "session-ledger",
            Collection::Appointments => "session-appointments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw whole-collection storage.
///
/// Implementations hold one opaque payload per collection. There is no
/// locking or transaction support at this level.
pub trait Store: Send {
    /// Read a collection's payload, `None` if it was never written.
    fn read(&self, collection: Collection) -> DbResult<Option<String>>;

    /// Replace a collection's payload.
    fn write(&self, collection: Collection, payload: &str) -> DbResult<()>;
}

/// SQLite-backed store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl Store for Database {
    fn read(&self, collection: Collection) -> DbResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM collections WHERE name = ?1",
                [collection.key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write(&self, collection: Collection, payload: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO collections (name, payload, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(name) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
            params![collection.key(), payload],
        )?;
        Ok(())
    }
}
