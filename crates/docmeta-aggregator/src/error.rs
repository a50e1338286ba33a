//! Error types for the aggregation engine

use crate::interaction::InteractionLog;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort an aggregation run
///
/// Parse failures never show up here: they are recovered as empty values and
/// reported through diagnostics instead.
#[derive(Error, Debug)]
pub enum AggregatorError {
    /// The text generator returned an error; carries the provider's message
    #[error("{0}")]
    Llm(String),

    /// A single model call exceeded the configured timeout
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A run stopped on a fatal call error after other calls had completed
    ///
    /// `interactions` holds every call that finished before the failure, in
    /// logical order, so the audit trail survives the abort.
    #[error("{cause}")]
    Interrupted {
        /// The call error that stopped the run
        cause: Box<AggregatorError>,
        /// Calls completed before the failure
        interactions: InteractionLog,
    },
}

impl AggregatorError {
    pub(crate) fn interrupted(cause: AggregatorError, interactions: InteractionLog) -> Self {
        AggregatorError::Interrupted {
            cause: Box::new(cause),
            interactions,
        }
    }

    /// The underlying call or configuration error
    pub fn root_cause(&self) -> &AggregatorError {
        match self {
            AggregatorError::Interrupted { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Calls that completed before an interrupted run failed
    pub fn interactions(&self) -> Option<&InteractionLog> {
        match self {
            AggregatorError::Interrupted { interactions, .. } => Some(interactions),
            _ => None,
        }
    }
}

/// Why a model response could not be read as a JSON object
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No `{ ... }` span anywhere in the response
    #[error("no JSON object found in response")]
    NoJsonObject,

    /// The response is valid JSON but not an object
    #[error("response is JSON but not an object")]
    NotAnObject,

    /// The candidate span is not valid JSON
    #[error("invalid JSON: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_message_is_not_prefixed_twice() {
        let err = AggregatorError::Llm("LLM error: provider down".to_string());
        assert_eq!(err.to_string(), "LLM error: provider down");
    }

    #[test]
    fn test_interrupted_reports_its_cause() {
        let err = AggregatorError::interrupted(
            AggregatorError::Timeout(Duration::from_secs(2)),
            InteractionLog::new(),
        );

        assert_eq!(err.to_string(), "Model call timed out after 2s");
        assert!(matches!(err.root_cause(), AggregatorError::Timeout(_)));
        assert!(err.interactions().is_some_and(InteractionLog::is_empty));
    }
}
