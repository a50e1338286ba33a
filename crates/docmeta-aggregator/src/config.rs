//! Configuration for the MetadataAggregator

use crate::error::AggregatorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Model assumed when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Token limit used for models missing from `token_limits`
pub const DEFAULT_TOKEN_LIMIT: usize = 1_000_000;

/// Configuration for the MetadataAggregator
///
/// The chunk budget is resolved once, at construction: an explicit
/// `token_budget` wins, otherwise `token_limits[model_name]`, otherwise
/// `default_token_limit`.
///
/// ```
/// use docmeta_aggregator::AggregatorConfig;
///
/// let config = AggregatorConfig::for_model("llama3").with_token_limit("llama3", 8_192);
/// assert_eq!(config.token_budget(), 8_192);
///
/// let config = AggregatorConfig::for_model("unknown-model");
/// assert_eq!(config.token_budget(), 1_000_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Name of the model behind the text generator
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Budget for models without an entry in `token_limits`
    #[serde(default = "default_token_limit")]
    pub default_token_limit: usize,

    /// Explicit chunk budget, overriding the per-model limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<usize>,

    /// Maximum time for a single model call (seconds)
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Model calls allowed in flight at once; 1 keeps calls strictly sequential
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Warn when a reduced value changes JSON type relative to its inputs
    #[serde(default)]
    pub check_reduced_shapes: bool,

    /// Token limits per model name
    #[serde(default = "default_token_limits")]
    pub token_limits: BTreeMap<String, usize>,
}

impl AggregatorConfig {
    /// Default configuration for a given model
    pub fn for_model(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    /// Set an explicit chunk budget
    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.token_budget = Some(budget);
        self
    }

    /// Register the token limit of a model
    pub fn with_token_limit(mut self, model_name: impl Into<String>, limit: usize) -> Self {
        self.token_limits.insert(model_name.into(), limit);
        self
    }

    /// Set how many model calls may run concurrently
    pub fn with_max_concurrent_calls(mut self, calls: usize) -> Self {
        self.max_concurrent_calls = calls;
        self
    }

    /// The chunk budget this configuration resolves to
    pub fn token_budget(&self) -> usize {
        self.token_budget.unwrap_or_else(|| {
            self.token_limits
                .get(&self.model_name)
                .copied()
                .unwrap_or(self.default_token_limit)
        })
    }

    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AggregatorError> {
        if self.token_budget() == 0 {
            return Err(AggregatorError::Config(format!(
                "token budget for model '{}' must be greater than 0",
                self.model_name
            )));
        }
        if self.default_token_limit == 0 {
            return Err(AggregatorError::Config(
                "default_token_limit must be greater than 0".to_string(),
            ));
        }
        if let Some((model, _)) = self.token_limits.iter().find(|(_, limit)| **limit == 0) {
            return Err(AggregatorError::Config(format!(
                "token limit for model '{}' must be greater than 0",
                model
            )));
        }
        if self.call_timeout_secs == 0 {
            return Err(AggregatorError::Config(
                "call_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_concurrent_calls == 0 {
            return Err(AggregatorError::Config(
                "max_concurrent_calls must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, AggregatorError> {
        toml::from_str(toml_str)
            .map_err(|e| AggregatorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, AggregatorError> {
        toml::to_string_pretty(self)
            .map_err(|e| AggregatorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            default_token_limit: default_token_limit(),
            token_budget: None,
            call_timeout_secs: default_call_timeout_secs(),
            max_concurrent_calls: default_max_concurrent_calls(),
            check_reduced_shapes: false,
            token_limits: default_token_limits(),
        }
    }
}

fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_token_limit() -> usize {
    DEFAULT_TOKEN_LIMIT
}

fn default_call_timeout_secs() -> u64 {
    120
}

fn default_max_concurrent_calls() -> usize {
    1
}

fn default_token_limits() -> BTreeMap<String, usize> {
    BTreeMap::from([(DEFAULT_MODEL.to_string(), 1_000_000)])
}
