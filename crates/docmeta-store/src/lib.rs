//! docmeta Storage Layer
//!
//! Implements the `ObjectStore` trait over three backends, plus a versioned
//! prompt catalogue on top of any of them.
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process map, for tests and dry runs
//! - [`FsStore`]: a directory tree on local disk
//! - [`SqliteStore`]: one table in a single SQLite file
//!
//! Paths are slash-separated and relative (`raw/2024/report.txt`). Empty
//! segments, `.` and `..` are rejected by every backend.
//!
//! # Examples
//!
//! ```
//! use docmeta_domain::ObjectStore;
//! use docmeta_store::{MemoryStore, PromptStore};
//!
//! let mut prompts = PromptStore::new(MemoryStore::new());
//! prompts.upload_prompt("summary", 1, "Summarise the following document.").unwrap();
//! prompts.upload_prompt("summary", 2, "Describe the following document.").unwrap();
//!
//! assert_eq!(prompts.get_prompt("summary", None).unwrap(), "Describe the following document.");
//! assert_eq!(prompts.store().list("prompts/").unwrap().len(), 2);
//! ```

#![warn(missing_docs)]

mod fs;
mod memory;
mod prompts;
mod sqlite;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use prompts::{PromptStore, DEFAULT_PROMPT_FOLDER};
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path is empty, absolute or escapes the store
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No prompt matches the requested name and version
    #[error("Prompt not found: {name}{}", .version.map(|v| format!(" v{}", v)).unwrap_or_default())]
    PromptNotFound {
        /// Prompt name
        name: String,
        /// Requested version; `None` means any
        version: Option<u32>,
    },

    /// Stored bytes are not what the caller expected
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Check that `path` is a relative, slash-separated object path
pub(crate) fn validate_path(path: &str) -> Result<(), StoreError> {
    if path.is_empty() || path.starts_with('/') || path.ends_with('/') || path.contains('\\') {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}
