//! Value types produced by an aggregation run

use crate::interaction::{Interaction, InteractionLog};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::AddAssign;

/// Field mapping parsed from one chunk's model response
pub type PartialMetadata = Map<String, Value>;

/// Key holding the summed prompt token cost in the final metadata
pub const TOTAL_INPUT_TOKENS: &str = "total_input_tokens";

/// Key holding the summed response token cost in the final metadata
pub const TOTAL_OUTPUT_TOKENS: &str = "total_output_tokens";

/// Whether `key` is one of the two accounting fields
pub fn is_reserved_key(key: &str) -> bool {
    key == TOTAL_INPUT_TOKENS || key == TOTAL_OUTPUT_TOKENS
}

/// Token cost of one or more model calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens sent to the model
    pub input_tokens: u64,

    /// Tokens received from the model
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Usage of a single call
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens: input_tokens as u64,
            output_tokens: output_tokens as u64,
        }
    }

    /// Sum of both directions
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// How a response was turned into a JSON object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ParseStatus {
    /// The whole response was a JSON object
    Direct,
    /// A JSON object was recovered from surrounding prose
    Recovered,
    /// Nothing usable; the partial metadata is empty
    Failed(String),
}

impl ParseStatus {
    /// True unless parsing failed
    pub fn is_success(&self) -> bool {
        !matches!(self, ParseStatus::Failed(_))
    }
}

/// Result of one chunk extraction call
#[derive(Debug, Clone)]
pub struct ChunkExtraction {
    /// Position of the chunk, 0-based
    pub chunk_index: usize,

    /// Parsed fields; empty when parsing failed
    pub metadata: PartialMetadata,

    /// Parse diagnostics
    pub status: ParseStatus,

    /// Token cost of the call
    pub usage: TokenUsage,

    /// Audit record of the call
    pub interaction: Interaction,
}

/// How a field reduction ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ReductionStatus {
    /// The response carried the field
    Reduced,
    /// The response parsed but lacked the field
    MissingField,
    /// The response could not be parsed
    ParseFailed(String),
}

/// A reduced value whose JSON type differs from its inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeMismatch {
    /// Field name
    pub field: String,

    /// JSON type shared by the non-empty inputs
    pub expected: String,

    /// JSON type of the reduced value
    pub actual: String,
}

/// Result of one field reduction call
#[derive(Debug, Clone)]
pub struct FieldReduction {
    /// Field name
    pub field: String,

    /// Final value; an empty object when reduction failed
    pub value: Value,

    /// Reduction diagnostics
    pub status: ReductionStatus,

    /// Set only when shape checking is enabled and the types disagree
    pub shape_mismatch: Option<ShapeMismatch>,

    /// Token cost of the call
    pub usage: TokenUsage,

    /// Audit record of the call
    pub interaction: Interaction,
}

/// Final metadata for a document or document set
///
/// Serializes as one flat object: the extracted fields side by side with
/// `total_input_tokens` and `total_output_tokens`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalMetadata {
    /// Reduced fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,

    /// Summed prompt token cost of every call made
    pub total_input_tokens: u64,

    /// Summed response token cost of every call made
    pub total_output_tokens: u64,
}

impl FinalMetadata {
    /// Build final metadata from reduced fields and accumulated usage
    pub fn new(fields: Map<String, Value>, usage: TokenUsage) -> Self {
        let fields = fields
            .into_iter()
            .filter(|(key, _)| !is_reserved_key(key))
            .collect();
        Self {
            fields,
            total_input_tokens: usage.input_tokens,
            total_output_tokens: usage.output_tokens,
        }
    }

    /// True when no domain field survived: the soft-failure signal
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Accumulated usage
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.total_input_tokens,
            output_tokens: self.total_output_tokens,
        }
    }

    /// Pretty JSON, ready to persist
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Per-chunk diagnostics kept in the outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDiagnostic {
    /// Position of the chunk, 0-based
    pub chunk_index: usize,

    /// Length of the chunk in characters
    pub chars: usize,

    /// Number of fields parsed from the response
    pub field_count: usize,

    /// Parse diagnostics
    pub status: ParseStatus,

    /// Token cost of the call
    pub usage: TokenUsage,
}

/// Per-field diagnostics kept in the outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionDiagnostic {
    /// Field name
    pub field: String,

    /// Reduction diagnostics
    pub status: ReductionStatus,

    /// Shape check result, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_mismatch: Option<ShapeMismatch>,

    /// Token cost of the call
    pub usage: TokenUsage,
}

/// Everything an aggregation run produces
#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    /// The final metadata, accounting fields included
    pub metadata: FinalMetadata,

    /// Summed usage of every call
    pub usage: TokenUsage,

    /// Number of chunks the batches were packed into
    pub chunk_count: usize,

    /// One entry per chunk, in chunk order
    pub chunks: Vec<ChunkDiagnostic>,

    /// One entry per reduced field, in field order
    pub reductions: Vec<ReductionDiagnostic>,

    /// Every model call, in the order they were issued logically
    pub interactions: InteractionLog,
}

impl AggregationOutcome {
    /// Summed prompt tokens
    pub fn total_input_tokens(&self) -> u64 {
        self.usage.input_tokens
    }

    /// Summed response tokens
    pub fn total_output_tokens(&self) -> u64 {
        self.usage.output_tokens
    }

    /// True when no domain field could be produced
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Number of model calls made
    pub fn call_count(&self) -> usize {
        self.interactions.len()
    }
}
