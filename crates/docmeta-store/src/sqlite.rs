//! SQLite-backed object store

use crate::{validate_path, StoreError};
use docmeta_domain::ObjectStore;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS objects (
    path       TEXT PRIMARY KEY NOT NULL,
    data       BLOB NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (unixepoch())
);
";

/// Object store keeping every object as a row of one table
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl ObjectStore for SqliteStore {
    type Error = StoreError;

    fn list(&self, prefix: &str) -> Result<Vec<String>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT path FROM objects WHERE substr(path, 1, length(?1)) = ?1 ORDER BY path",
        )?;
        let paths = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paths)
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, Self::Error> {
        self.conn
            .query_row(
                "SELECT data FROM objects WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn put(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error> {
        validate_path(path)?;
        self.conn.execute(
            "INSERT INTO objects (path, data) VALUES (?1, ?2)
             ON CONFLICT(path) DO UPDATE SET data = excluded.data, updated_at = unixepoch()",
            params![path, data],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_in_memory() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.put("raw/a.txt", b"alpha").unwrap();
        store.put("raw/a.txt", b"beta").unwrap();

        assert_eq!(store.get("raw/a.txt").unwrap(), b"beta");
        assert_eq!(store.list("raw/").unwrap(), vec!["raw/a.txt"]);
    }

    #[test]
    fn test_missing_row() {
        let store = SqliteStore::new(":memory:").unwrap();
        assert!(matches!(store.get("raw/none.txt"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_prefix_is_literal() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.put("a_b/x", b"").unwrap();
        store.put("a%b/y", b"").unwrap();

        assert_eq!(store.list("a_").unwrap(), vec!["a_b/x"]);
    }
}
