//! docmeta CLI library.
//!
//! Wires the aggregation engine to an object store and a model provider:
//! configuration, store selection, batch preparation, metadata jobs and
//! output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prepare;
pub mod storage;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use pipeline::{AllFiles, DocumentReport, FileSelector, MetadataJob};
pub use storage::Storage;
