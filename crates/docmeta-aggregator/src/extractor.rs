//! Per-chunk metadata extraction

use crate::error::AggregatorError;
use crate::interaction::{Interaction, InteractionKind};
use crate::invoke::call_model;
use crate::parser::parse_metadata;
use crate::prompt::extraction_prompt;
use crate::types::{is_reserved_key, ChunkExtraction, ParseStatus, PartialMetadata, TokenUsage};
use docmeta_domain::{TextGenerator, TokenCounter};
use std::time::Duration;
use tracing::{debug, warn};

/// Runs the extraction template over one chunk at a time
pub struct ChunkExtractor<'a, G, C> {
    generator: &'a G,
    counter: &'a C,
    budget: usize,
    timeout: Duration,
}

impl<'a, G, C> ChunkExtractor<'a, G, C>
where
    G: TextGenerator + Sync,
    C: TokenCounter,
{
    /// Create an extractor that truncates chunks to `budget` characters
    pub fn new(generator: &'a G, counter: &'a C, budget: usize, timeout: Duration) -> Self {
        Self {
            generator,
            counter,
            budget,
            timeout,
        }
    }

    /// Extract partial metadata from one chunk
    ///
    /// `chunk_index` is `None` when the document fits in a single chunk.
    /// An unparseable response yields empty metadata and a
    /// `ParseStatus::Failed` diagnostic; only generator failures are errors.
    pub async fn extract(
        &self,
        chunk: &str,
        template: &str,
        chunk_index: Option<usize>,
        total_chunks: usize,
        files: &[String],
    ) -> Result<ChunkExtraction, AggregatorError> {
        let prompt = extraction_prompt(template, chunk, chunk_index, total_chunks, self.budget);
        debug!("Extraction prompt length: {} chars", prompt.len());

        let response = call_model(self.generator, &prompt, self.timeout).await?;
        let usage = TokenUsage::new(self.counter.count(&prompt), self.counter.count(&response));

        let (metadata, status) = match parse_metadata(&response) {
            Ok((metadata, status)) => (strip_reserved(metadata), status),
            Err(e) => {
                warn!(
                    "Chunk {} of {}: could not parse model response ({}): {}",
                    chunk_index.map_or(1, |i| i + 1),
                    total_chunks,
                    e,
                    response
                );
                (PartialMetadata::new(), ParseStatus::Failed(e.to_string()))
            }
        };

        let interaction = Interaction::record(
            InteractionKind::Extraction {
                chunk_index,
                total_chunks,
            },
            prompt,
            response,
            files,
            usage,
            status.is_success(),
        );

        Ok(ChunkExtraction {
            chunk_index: chunk_index.unwrap_or(0),
            metadata,
            status,
            usage,
            interaction,
        })
    }
}

fn strip_reserved(metadata: PartialMetadata) -> PartialMetadata {
    metadata
        .into_iter()
        .filter(|(key, _)| !is_reserved_key(key))
        .collect()
}
