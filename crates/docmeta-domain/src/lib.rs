//! docmeta Domain Layer
//!
//! Trait boundaries shared by every other crate in the workspace. This crate
//! has no external dependencies: it names the collaborators the aggregation
//! engine talks to and nothing else.
//!
//! ## Boundaries
//!
//! - **TextGenerator**: prompt in, response out. Providers live in `docmeta-llm`.
//! - **TokenCounter**: deterministic token cost of a string.
//! - **ObjectStore**: list/get/put over flat, slash-separated object paths.
//!   Implementations live in `docmeta-store`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod traits;

pub use traits::{ObjectStore, TextGenerator, TokenCounter};
