// Hivetrap Engine — Durable Key-Value Storage
//
// The engine only needs "read initial state at startup, write current
// state after each mutation" semantics, so persistence is an opaque
// key/value pair behind the `KvStore` trait. Ships with two
// implementations:
//   SqliteStore — single-table SQLite store (WAL), the durable default
//   MemoryStore — HashMap-backed store for tests and embedders that
//                 handle durability themselves

use crate::atoms::error::EngineResult;
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

/// Durable key-value mapping that survives process restarts.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> EngineResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> EngineResult<()>;
}

// ── SQLite implementation ──────────────────────────────────────────────

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path` and initialize the table.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        info!("[storage] Opening kv store at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        Self::init(conn)
    }

    /// In-memory database. Contents vanish on drop — test use only.
    pub fn open_in_memory() -> EngineResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> EngineResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS engine_kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT value FROM engine_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO engine_kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

// ── In-memory implementation ───────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        self.map.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
