//! Single guarded model call

use crate::error::AggregatorError;
use docmeta_domain::TextGenerator;
use std::time::Duration;
use tokio::time::timeout;

/// Call the generator once, bounded by `limit`
///
/// Provider errors and timeouts both surface as fatal `AggregatorError`s.
pub(crate) async fn call_model<G>(
    generator: &G,
    prompt: &str,
    limit: Duration,
) -> Result<String, AggregatorError>
where
    G: TextGenerator + Sync,
{
    timeout(limit, generator.generate(prompt))
        .await
        .map_err(|_| AggregatorError::Timeout(limit))?
        .map_err(|e| AggregatorError::Llm(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmeta_llm::MockProvider;

    #[tokio::test]
    async fn test_call_returns_response() {
        let provider = MockProvider::new("{}");
        let response = call_model(&provider, "p", Duration::from_secs(5)).await.unwrap();
        assert_eq!(response, "{}");
    }

    #[tokio::test]
    async fn test_provider_error_becomes_llm_error() {
        let provider = MockProvider::default();
        provider.push_error("quota exhausted");

        let err = call_model(&provider, "p", Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, AggregatorError::Llm(_)));
        // The provider's message is passed through with its own prefix only
        assert_eq!(err.to_string(), "LLM error: quota exhausted");
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let provider = MockProvider::new("late").with_delay(Duration::from_millis(200));

        let err = call_model(&provider, "p", Duration::from_millis(10)).await.unwrap_err();
        assert!(matches!(err, AggregatorError::Timeout(limit) if limit == Duration::from_millis(10)));
    }
}
