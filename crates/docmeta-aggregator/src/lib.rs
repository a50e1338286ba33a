//! docmeta Aggregator
//!
//! Extracts structured metadata from documents too large for one model call.
//!
//! # Overview
//!
//! Text arrives as ordered batches. The aggregator packs them into chunks that
//! fit the model's budget, asks the model for a JSON object per chunk, and,
//! when there was more than one chunk, asks the model once per field to merge
//! the per-chunk values into a final value.
//!
//! # Architecture
//!
//! ```text
//! batches → pack → chunks → extract (1 call/chunk) → partial objects
//!                                                       │
//!                  final metadata ← reduce (1 call/field)
//! ```
//!
//! # Key Features
//!
//! - **Budgeted packing**: deterministic, order-preserving, never splits a batch
//! - **Forgiving parsing**: JSON objects are recovered from prose and fences
//! - **Graceful degradation**: bad responses become empty values, not errors
//! - **Accounting**: every call is logged with its token cost
//! - **Bounded concurrency**: optional, with results kept in input order
//!
//! # Example Usage
//!
//! ```
//! use docmeta_aggregator::{AggregatorConfig, HeuristicCounter, MetadataAggregator};
//! use docmeta_llm::MockProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), docmeta_aggregator::AggregatorError> {
//! let llm = MockProvider::new(r#"{"title": "Annual report", "year": 2024}"#);
//! let aggregator = MetadataAggregator::new(llm, HeuristicCounter, AggregatorConfig::default())?;
//!
//! let outcome = aggregator
//!     .aggregate(&["The 2024 annual report."], "Extract the metadata of the following document.", &[])
//!     .await?;
//!
//! assert_eq!(outcome.metadata.get("title").unwrap(), "Annual report");
//! assert_eq!(outcome.call_count(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod aggregator;
mod batching;
mod config;
mod error;
mod extractor;
mod interaction;
mod invoke;
mod parser;
mod prompt;
mod reducer;
mod tokens;
mod types;


pub use aggregator::MetadataAggregator;
pub use batching::pack;
pub use config::{AggregatorConfig, DEFAULT_MODEL, DEFAULT_TOKEN_LIMIT};
pub use error::{AggregatorError, ParseError};
pub use extractor::ChunkExtractor;
pub use interaction::{Interaction, InteractionKind, InteractionLog};
pub use parser::{json_span, parse_metadata};
pub use prompt::{extraction_prompt, reduction_prompt, truncate_chars, DOCUMENT_PHRASE};
pub use reducer::{json_kind, FieldReducer};
pub use tokens::HeuristicCounter;
#[cfg(feature = "tiktoken")]
pub use tokens::TiktokenCounter;
pub use types::{
    is_reserved_key, AggregationOutcome, ChunkDiagnostic, ChunkExtraction, FieldReduction,
    FinalMetadata, ParseStatus, PartialMetadata, ReductionDiagnostic, ReductionStatus,
    ShapeMismatch, TokenUsage, TOTAL_INPUT_TOKENS, TOTAL_OUTPUT_TOKENS,
};
