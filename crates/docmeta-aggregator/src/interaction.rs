//! Audit log of model calls
//!
//! Every extraction and reduction call leaves one [`Interaction`], whether or
//! not its response could be parsed, so failures can be diagnosed after the
//! run has degraded gracefully.

use crate::types::TokenUsage;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Which phase issued a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    /// A chunk extraction call
    Extraction {
        /// Chunk position; `None` when the document fit in one chunk
        chunk_index: Option<usize>,
        /// Number of chunks in the run
        total_chunks: usize,
    },
    /// A field reduction call
    Reduction {
        /// Field being reduced
        field: String,
    },
}

/// One logged model call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Unix seconds when the response arrived
    pub timestamp: u64,

    /// Phase that issued the call
    pub kind: InteractionKind,

    /// Prompt sent
    pub prompt: String,

    /// Raw response received
    pub response: String,

    /// Source files the prompt was built from
    pub files: Vec<String>,

    /// Prompt token cost
    pub input_tokens: u64,

    /// Response token cost
    pub output_tokens: u64,

    /// Whether the response yielded a usable value
    pub parsed: bool,
}

impl Interaction {
    pub(crate) fn record(
        kind: InteractionKind,
        prompt: String,
        response: String,
        files: &[String],
        usage: TokenUsage,
        parsed: bool,
    ) -> Self {
        Self {
            timestamp: unix_now(),
            kind,
            prompt,
            response,
            files: files.to_vec(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            parsed,
        }
    }

    /// Token cost of this call
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        }
    }
}

/// Ordered collection of interactions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionLog {
    entries: Vec<Interaction>,
}

impl InteractionLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry
    pub fn push(&mut self, interaction: Interaction) {
        self.entries.push(interaction);
    }

    /// Append every entry of another log
    pub fn append(&mut self, other: InteractionLog) {
        self.entries.extend(other.entries);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was logged
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in log order
    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter()
    }

    /// Entries whose response could not be used
    pub fn failures(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter().filter(|entry| !entry.parsed)
    }

    /// Summed usage of every entry
    pub fn total_usage(&self) -> TokenUsage {
        self.entries.iter().fold(TokenUsage::default(), |mut acc, entry| {
            acc += entry.usage();
            acc
        })
    }

    /// Pretty JSON array of entries
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl IntoIterator for InteractionLog {
    type Item = Interaction;
    type IntoIter = std::vec::IntoIter<Interaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
