//! Token counters
//!
//! [`HeuristicCounter`] is the default: a deterministic length heuristic that
//! needs no tokenizer. With the `tiktoken` feature, [`TiktokenCounter`] gives
//! exact `cl100k_base` counts.

use docmeta_domain::TokenCounter;

/// Roughly four characters per token, never less than one token
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> usize {
        (text.chars().count() / 4).max(1)
    }
}

/// Exact BPE counts using the `cl100k_base` vocabulary
#[cfg(feature = "tiktoken")]
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl TiktokenCounter {
    /// Load the `cl100k_base` vocabulary
    pub fn new() -> Result<Self, crate::AggregatorError> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| crate::AggregatorError::Config(format!("tokenizer unavailable: {}", e)))?;
        Ok(Self { bpe })
    }
}

#[cfg(feature = "tiktoken")]
impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}
