//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use docmeta_aggregator::AggregatorConfig;
use docmeta_llm::ollama::{retry_window, DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use docmeta_store::DEFAULT_PROMPT_FOLDER;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model provider settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Object store settings
    #[serde(default)]
    pub store: StoreSettings,

    /// Aggregation engine settings
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Metadata job settings
    #[serde(default)]
    pub job: JobSettings,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,
}

/// Ollama connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name; also selects the token limit
    #[serde(default = "default_model")]
    pub model: String,

    /// Attempts per prompt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// HTTP request timeout (seconds); all attempts must fit in `call_timeout_secs`
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Where objects live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Object store implementation
    #[serde(default)]
    pub backend: StoreBackend,

    /// Root directory of the `fs` backend
    #[serde(default = "default_store_root")]
    pub root: PathBuf,

    /// Database file of the `sqlite` backend
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Folder holding versioned prompts
    #[serde(default = "default_prompt_folder")]
    pub prompt_folder: String,
}

/// Object store implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One file per object under `root`
    #[default]
    Fs,
    /// One row per object in `database`
    Sqlite,
}

/// Defaults for metadata jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    /// Prompt used for extraction
    #[serde(default = "default_prompt_name")]
    pub prompt_name: String,

    /// Prompt version; latest when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_version: Option<u32>,

    /// User the conversation log is filed under
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl From<crate::cli::CliFormat> for OutputFormat {
    fn from(format: crate::cli::CliFormat) -> Self {
        match format {
            crate::cli::CliFormat::Table => OutputFormat::Table,
            crate::cli::CliFormat::Json => OutputFormat::Json,
            crate::cli::CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".docmeta").join("config.toml"))
    }

    /// Load configuration from `path` (or the default path), falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Check settings that would only fail later, mid-run.
    pub fn validate(&self) -> Result<()> {
        self.aggregator_config()
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        if self.job.user_id.is_empty() || self.job.user_id.contains(['/', '\\']) {
            return Err(CliError::Config(format!(
                "user_id '{}' must be a non-empty single path segment",
                self.job.user_id
            )));
        }
        if self.job.prompt_name.is_empty() {
            return Err(CliError::Config("prompt_name must not be empty".into()));
        }

        let window = retry_window(
            Duration::from_secs(self.llm.request_timeout_secs),
            self.llm.max_retries,
        );
        let deadline = self.aggregator.call_timeout();
        if window >= deadline {
            return Err(CliError::Config(format!(
                "{} attempt(s) of {}s plus backoff take {:?}, which does not fit in call_timeout_secs = {}",
                self.llm.max_retries.max(1),
                self.llm.request_timeout_secs,
                window,
                self.aggregator.call_timeout_secs
            )));
        }
        Ok(())
    }

    /// Engine configuration, with the model taken from `[llm]`.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            model_name: self.llm.model.clone(),
            ..self.aggregator.clone()
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
            temperature: None,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Fs,
            root: default_store_root(),
            database: default_database(),
            prompt_folder: default_prompt_folder(),
        }
    }
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            prompt_name: default_prompt_name(),
            prompt_version: None,
            user_id: default_user_id(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_store_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_database() -> PathBuf {
    PathBuf::from("data").join("docmeta.db")
}

fn default_prompt_folder() -> String {
    DEFAULT_PROMPT_FOLDER.to_string()
}

fn default_prompt_name() -> String {
    "metadata".to_string()
}

fn default_user_id() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
