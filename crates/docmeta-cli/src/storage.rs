//! Object store selected by configuration.

use crate::config::{StoreBackend, StoreSettings};
use crate::error::Result;
use docmeta_domain::ObjectStore;
use docmeta_store::{FsStore, SqliteStore, StoreError};
use std::fs;
use tracing::debug;

/// The backend named by `[store] backend`.
pub enum Storage {
    /// Directory tree on local disk
    Fs(FsStore),
    /// Single SQLite file
    Sqlite(SqliteStore),
}

impl Storage {
    /// Open the configured backend, creating its directory or database file.
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        match settings.backend {
            StoreBackend::Fs => {
                debug!("Using filesystem store at {}", settings.root.display());
                Ok(Storage::Fs(FsStore::new(&settings.root)?))
            }
            StoreBackend::Sqlite => {
                if let Some(parent) = settings.database.parent() {
                    fs::create_dir_all(parent)?;
                }
                debug!("Using SQLite store at {}", settings.database.display());
                Ok(Storage::Sqlite(SqliteStore::new(&settings.database)?))
            }
        }
    }
}

impl ObjectStore for Storage {
    type Error = StoreError;

    fn list(&self, prefix: &str) -> std::result::Result<Vec<String>, StoreError> {
        match self {
            Storage::Fs(store) => store.list(prefix),
            Storage::Sqlite(store) => store.list(prefix),
        }
    }

    fn get(&self, path: &str) -> std::result::Result<Vec<u8>, StoreError> {
        match self {
            Storage::Fs(store) => store.get(path),
            Storage::Sqlite(store) => store.get(path),
        }
    }

    fn put(&mut self, path: &str, data: &[u8]) -> std::result::Result<(), StoreError> {
        match self {
            Storage::Fs(store) => store.put(path, data),
            Storage::Sqlite(store) => store.put(path, data),
        }
    }
}
