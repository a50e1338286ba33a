//! docmeta LLM Provider Layer
//!
//! Implementations of the `TextGenerator` trait from `docmeta-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted, deterministic responses for testing
//! - `FnProvider`: Adapts any synchronous `Fn(&str) -> Result<String, E>`
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use docmeta_llm::MockProvider;
//! use docmeta_domain::TextGenerator;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod ollama;

use docmeta_domain::TextGenerator;
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

impl Reply {
    fn into_result(self) -> Result<String, LlmError> {
        match self {
            Reply::Text(text) => Ok(text),
            Reply::Fail(message) => Err(LlmError::Other(message)),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    exact: HashMap<String, Reply>,
    rules: Vec<(String, Reply)>,
    queue: VecDeque<Reply>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Replies are chosen in this order: an exact prompt match, then the first
/// rule whose needle occurs in the prompt, then the next queued reply, then
/// the default response. Every prompt is recorded.
///
/// # Examples
///
/// ```
/// use docmeta_llm::MockProvider;
/// use docmeta_domain::TextGenerator;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.add_rule("key to combine is 'title'", r#"{"title": "merged"}"#);
/// provider.push_response("first queued");
///
/// assert_eq!(provider.generate("prompt1").await.unwrap(), "response1");
/// assert_eq!(
///     provider.generate("The key to combine is 'title'.").await.unwrap(),
///     r#"{"title": "merged"}"#
/// );
/// assert_eq!(provider.generate("anything").await.unwrap(), "first queued");
/// assert_eq!(provider.generate("anything").await.unwrap(), "Default mock response");
/// assert_eq!(provider.call_count(), 4);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(Script::default())),
            delay: None,
        }
    }

    /// Create a provider that replies with `responses` in order, then the default
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::default();
        for response in responses {
            provider.push_response(response);
        }
        provider
    }

    /// Sleep for `delay` before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.lock().exact.insert(prompt.into(), Reply::Text(response.into()));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.lock()
            .exact
            .insert(prompt.into(), Reply::Fail("Mock error".to_string()));
    }

    /// Reply with `response` to any prompt containing `needle`
    pub fn add_rule(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.lock().rules.push((needle.into(), Reply::Text(response.into())));
    }

    /// Queue a response for the next prompt that matches nothing else
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock().queue.push_back(Reply::Text(response.into()));
    }

    /// Queue an error for the next prompt that matches nothing else
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock().queue.push_back(Reply::Fail(message.into()));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Every prompt received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    /// Forget recorded prompts
    pub fn reset_call_count(&self) {
        self.lock().prompts.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not poison the script for other calls.
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reply_for(&self, prompt: &str) -> Reply {
        let mut script = self.lock();
        script.prompts.push(prompt.to_string());

        if let Some(reply) = script.exact.get(prompt) {
            return reply.clone();
        }
        if let Some((_, reply)) = script.rules.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            return reply.clone();
        }
        script
            .queue
            .pop_front()
            .unwrap_or_else(|| Reply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl TextGenerator for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>> + Send {
        let reply = self.reply_for(prompt);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            reply.into_result()
        }
    }
}

/// Adapts a synchronous closure into a `TextGenerator`.
///
/// ```
/// use docmeta_llm::FnProvider;
/// use docmeta_domain::TextGenerator;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let echo = FnProvider::new(|prompt: &str| Ok::<_, std::io::Error>(prompt.to_uppercase()));
/// assert_eq!(echo.generate("hi").await.unwrap(), "HI");
/// # }
/// ```
pub struct FnProvider<F> {
    func: F,
}

impl<F> FnProvider<F> {
    /// Wrap `func`
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, E> TextGenerator for FnProvider<F>
where
    F: Fn(&str) -> Result<String, E> + Sync,
    E: Display + Send,
{
    type Error = E;

    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>> + Send {
        let result = (self.func)(prompt);
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt").await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("hello").await.unwrap(), "world");
        assert_eq!(provider.generate("foo").await.unwrap(), "bar");
        assert_eq!(provider.generate("unknown").await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_queue_is_consumed_in_order() {
        let provider = MockProvider::with_responses(["one", "two"]);

        assert_eq!(provider.generate("a").await.unwrap(), "one");
        assert_eq!(provider.generate("b").await.unwrap(), "two");
        assert_eq!(provider.generate("c").await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_rules_take_precedence_over_queue() {
        let mut provider = MockProvider::with_responses(["queued"]);
        provider.add_rule("needle", "ruled");

        assert_eq!(provider.generate("hay needle hay").await.unwrap(), "ruled");
        assert_eq!(provider.generate("hay").await.unwrap(), "queued");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").await.unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.generate("prompt2").await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.generate("bad prompt").await;
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));
    }

    #[tokio::test]
    async fn test_mock_provider_queued_error() {
        let provider = MockProvider::default();
        provider.push_error("provider down");

        let err = provider.generate("x").await.unwrap_err();
        assert_eq!(err.to_string(), "LLM error: provider down");
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_script() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_delay() {
        let provider = MockProvider::new("slow").with_delay(Duration::from_millis(20));
        let started = std::time::Instant::now();

        assert_eq!(provider.generate("x").await.unwrap(), "slow");
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_fn_provider_propagates_errors() {
        let provider = FnProvider::new(|_: &str| Err::<String, _>(LlmError::RateLimitExceeded));
        let err = provider.generate("x").await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimitExceeded));
    }
}
