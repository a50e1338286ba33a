//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the aggregation engine and
//! infrastructure. Infrastructure implementations live in other crates.

use std::fmt::Display;
use std::future::Future;

/// A language model seen as an opaque function from prompt to response.
///
/// Implemented by the infrastructure layer (docmeta-llm). Any retry or backoff
/// policy belongs to the implementation; callers treat an `Err` as final.
pub trait TextGenerator {
    /// Error type for generation failures
    type Error: Display + Send;

    /// Generate a completion for `prompt`
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Estimates the token cost of a string.
///
/// Must return the same count for the same text within one run. It does not
/// need to match any provider's tokenizer exactly.
pub trait TokenCounter: Send + Sync {
    /// Count tokens in `text`
    fn count(&self, text: &str) -> usize;
}

/// Flat object storage addressed by slash-separated paths.
///
/// Implemented by the infrastructure layer (docmeta-store)
pub trait ObjectStore {
    /// Error type for store operations
    type Error;

    /// List object paths starting with `prefix`, in lexical order.
    /// Directory placeholders (paths ending in `/`) are never returned.
    fn list(&self, prefix: &str) -> Result<Vec<String>, Self::Error>;

    /// Read an object's bytes
    fn get(&self, path: &str) -> Result<Vec<u8>, Self::Error>;

    /// Create or overwrite an object
    fn put(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for Box<T> {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for std::sync::Arc<T> {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}
