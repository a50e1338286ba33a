//! Map-reduce driver: pack, extract per chunk, reduce per field

use crate::batching::pack;
use crate::config::AggregatorConfig;
use crate::error::AggregatorError;
use crate::extractor::ChunkExtractor;
use crate::interaction::InteractionLog;
use crate::reducer::FieldReducer;
use crate::types::{
    AggregationOutcome, ChunkDiagnostic, ChunkExtraction, FieldReduction, FinalMetadata,
    ReductionDiagnostic, TokenUsage,
};
use docmeta_domain::{TextGenerator, TokenCounter};
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::pin;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Aggregates document metadata across chunks
///
/// One instance can serve many documents; every [`aggregate`](Self::aggregate)
/// call keeps its own token totals and interaction log.
pub struct MetadataAggregator<G, C> {
    generator: G,
    counter: C,
    config: AggregatorConfig,
    budget: usize,
    call_timeout: Duration,
}

impl<G, C> MetadataAggregator<G, C>
where
    G: TextGenerator + Sync,
    C: TokenCounter,
{
    /// Create an aggregator, resolving the chunk budget from `config`
    pub fn new(generator: G, counter: C, config: AggregatorConfig) -> Result<Self, AggregatorError> {
        config.validate()?;
        let budget = config.token_budget();
        let call_timeout = config.call_timeout();
        info!(
            "Metadata aggregator ready: model '{}', budget {} chars, {} concurrent call(s)",
            config.model_name, budget, config.max_concurrent_calls
        );
        Ok(Self {
            generator,
            counter,
            config,
            budget,
            call_timeout,
        })
    }

    /// Override the per-call timeout with sub-second precision
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// The wrapped text generator
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Active configuration
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Resolved chunk budget
    pub fn token_budget(&self) -> usize {
        self.budget
    }

    /// Produce final metadata for the text held in `batches`
    ///
    /// `files` names the sources the batches came from; it is only copied into
    /// the interaction log. Unparseable responses degrade to empty values.
    ///
    /// # Errors
    ///
    /// Fails only when the generator fails or a call exceeds the timeout. The
    /// error is [`AggregatorError::Interrupted`], carrying the calls that
    /// completed before the failure.
    pub async fn aggregate<S: AsRef<str>>(
        &self,
        batches: &[S],
        template: &str,
        files: &[String],
    ) -> Result<AggregationOutcome, AggregatorError> {
        let chunks = pack(batches, self.budget);
        let total = chunks.len();
        info!("Packed {} batch(es) into {} chunk(s)", batches.len(), total);

        let mut usage = TokenUsage::default();
        let mut interactions = InteractionLog::new();

        if chunks.is_empty() {
            warn!("No text to analyse; returning token totals only");
            return Ok(AggregationOutcome {
                metadata: FinalMetadata::new(Map::new(), usage),
                usage,
                chunk_count: 0,
                chunks: Vec::new(),
                reductions: Vec::new(),
                interactions,
            });
        }

        let extractor = ChunkExtractor::new(&self.generator, &self.counter, self.budget, self.call_timeout);
        let extractor = &extractor;
        let (extractions, failure): (Vec<ChunkExtraction>, _) = self
            .run_ordered(chunks.iter().enumerate().map(move |(i, chunk)| {
                let index = (total > 1).then_some(i);
                extractor.extract(chunk, template, index, total, files)
            }))
            .await;

        let mut chunk_diagnostics = Vec::with_capacity(total);
        for (extraction, chunk) in extractions.iter().zip(&chunks) {
            usage += extraction.usage;
            interactions.push(extraction.interaction.clone());
            chunk_diagnostics.push(ChunkDiagnostic {
                chunk_index: extraction.chunk_index,
                chars: chunk.chars().count(),
                field_count: extraction.metadata.len(),
                status: extraction.status.clone(),
                usage: extraction.usage,
            });
        }
        if let Some(cause) = failure {
            return Err(abort(cause, interactions));
        }

        let mut reduction_diagnostics = Vec::new();
        let fields = if total == 1 {
            extractions.into_iter().next().map(|e| e.metadata).unwrap_or_default()
        } else {
            match extractions.iter().find(|e| !e.metadata.is_empty()) {
                None => {
                    warn!("None of the {} chunks produced usable metadata", total);
                    Map::new()
                }
                Some(first) => {
                    let keys: Vec<String> = first.metadata.keys().cloned().collect();
                    debug!("Reducing {} field(s): {:?}", keys.len(), keys);

                    let reducer = FieldReducer::new(&self.generator, &self.counter, self.call_timeout)
                        .with_shape_check(self.config.check_reduced_shapes);
                    let reducer = &reducer;
                    let columns: Vec<Vec<Value>> = keys
                        .iter()
                        .map(|key| field_values(&extractions, key))
                        .collect();
                    let (reductions, failure): (Vec<FieldReduction>, _) = self
                        .run_ordered(
                            keys.iter()
                                .zip(&columns)
                                .map(move |(key, values)| reducer.reduce(key, values, files)),
                        )
                        .await;

                    let mut fields = Map::new();
                    for reduction in reductions {
                        usage += reduction.usage;
                        interactions.push(reduction.interaction);
                        reduction_diagnostics.push(ReductionDiagnostic {
                            field: reduction.field.clone(),
                            status: reduction.status,
                            shape_mismatch: reduction.shape_mismatch,
                            usage: reduction.usage,
                        });
                        fields.insert(reduction.field, reduction.value);
                    }
                    if let Some(cause) = failure {
                        return Err(abort(cause, interactions));
                    }
                    fields
                }
            }
        };

        let metadata = FinalMetadata::new(fields, usage);
        if metadata.is_empty() {
            warn!("Aggregation produced no metadata fields");
        }
        info!(
            "Aggregation finished: {} field(s), {} call(s), {} input / {} output tokens",
            metadata.fields.len(),
            interactions.len(),
            usage.input_tokens,
            usage.output_tokens
        );

        Ok(AggregationOutcome {
            metadata,
            usage,
            chunk_count: total,
            chunks: chunk_diagnostics,
            reductions: reduction_diagnostics,
            interactions,
        })
    }

    /// Drive `calls` with at most `max_concurrent_calls` in flight, keeping input order
    ///
    /// Stops at the first error, returning it with every result that precedes
    /// it in input order. Calls still in flight are dropped.
    async fn run_ordered<I, T>(&self, calls: I) -> (Vec<T>, Option<AggregatorError>)
    where
        I: IntoIterator,
        I::Item: Future<Output = Result<T, AggregatorError>>,
    {
        let mut results = pin!(stream::iter(calls).buffered(self.config.max_concurrent_calls));
        let mut completed = Vec::new();
        while let Some(result) = results.next().await {
            match result {
                Ok(value) => completed.push(value),
                Err(e) => return (completed, Some(e)),
            }
        }
        (completed, None)
    }
}

fn abort(cause: AggregatorError, interactions: InteractionLog) -> AggregatorError {
    warn!(
        "Aggregation aborted after {} completed call(s): {}",
        interactions.len(),
        cause
    );
    AggregatorError::interrupted(cause, interactions)
}

/// One field's value from every chunk, in chunk order; gaps become `""`
fn field_values(extractions: &[ChunkExtraction], key: &str) -> Vec<Value> {
    extractions
        .iter()
        .map(|e| {
            e.metadata
                .get(key)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::HeuristicCounter;
    use docmeta_llm::MockProvider;
    use serde_json::json;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = AggregatorConfig::default().with_max_concurrent_calls(0);
        let result = MetadataAggregator::new(MockProvider::default(), HeuristicCounter, config);
        assert!(matches!(result, Err(AggregatorError::Config(_))));
    }

    #[test]
    fn test_budget_resolved_at_construction() {
        let config = AggregatorConfig::for_model("small").with_token_limit("small", 2048);
        let aggregator = MetadataAggregator::new(MockProvider::default(), HeuristicCounter, config).unwrap();
        assert_eq!(aggregator.token_budget(), 2048);
        assert_eq!(aggregator.config().model_name, "small");
    }

    #[test]
    fn test_field_values_fill_gaps_with_empty_string() {
        let with_title = ChunkExtraction {
            chunk_index: 0,
            metadata: json!({"title": "A"}).as_object().cloned().unwrap(),
            status: crate::types::ParseStatus::Direct,
            usage: TokenUsage::default(),
            interaction: crate::interaction::Interaction::record(
                crate::interaction::InteractionKind::Extraction { chunk_index: Some(0), total_chunks: 2 },
                String::new(),
                String::new(),
                &[],
                TokenUsage::default(),
                true,
            ),
        };
        let mut failed = with_title.clone();
        failed.chunk_index = 1;
        failed.metadata = Map::new();

        assert_eq!(field_values(&[with_title, failed], "title"), vec![json!("A"), json!("")]);
    }
}
