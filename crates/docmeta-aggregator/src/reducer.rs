//! Per-field reduction of chunk values

use crate::error::AggregatorError;
use crate::interaction::{Interaction, InteractionKind};
use crate::invoke::call_model;
use crate::parser::parse_metadata;
use crate::prompt::reduction_prompt;
use crate::types::{FieldReduction, ReductionStatus, ShapeMismatch, TokenUsage};
use docmeta_domain::{TextGenerator, TokenCounter};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::warn;

/// Merges the per-chunk values of one field with a single model call
pub struct FieldReducer<'a, G, C> {
    generator: &'a G,
    counter: &'a C,
    timeout: Duration,
    check_shapes: bool,
}

impl<'a, G, C> FieldReducer<'a, G, C>
where
    G: TextGenerator + Sync,
    C: TokenCounter,
{
    /// Create a reducer
    pub fn new(generator: &'a G, counter: &'a C, timeout: Duration) -> Self {
        Self {
            generator,
            counter,
            timeout,
            check_shapes: false,
        }
    }

    /// Compare the reduced value's JSON type with its inputs
    pub fn with_shape_check(mut self, enabled: bool) -> Self {
        self.check_shapes = enabled;
        self
    }

    /// Reduce `values`, in chunk order, to one value for `field`
    ///
    /// A response that does not parse, or that lacks `field`, reduces to an
    /// empty object.
    pub async fn reduce(
        &self,
        field: &str,
        values: &[Value],
        files: &[String],
    ) -> Result<FieldReduction, AggregatorError> {
        let prompt = reduction_prompt(field, values);
        let response = call_model(self.generator, &prompt, self.timeout).await?;
        let usage = TokenUsage::new(self.counter.count(&prompt), self.counter.count(&response));

        let (value, status) = match parse_metadata(&response) {
            Ok((mut object, _)) => match object.get_mut(field) {
                Some(value) => (value.take(), ReductionStatus::Reduced),
                None => {
                    warn!("Reduction of '{}' returned no such key: {}", field, response);
                    (Value::Object(Map::new()), ReductionStatus::MissingField)
                }
            },
            Err(e) => {
                warn!("Reduction of '{}' could not be parsed ({}): {}", field, e, response);
                (Value::Object(Map::new()), ReductionStatus::ParseFailed(e.to_string()))
            }
        };

        let shape_mismatch = if self.check_shapes && status == ReductionStatus::Reduced {
            shape_mismatch(field, values, &value)
        } else {
            None
        };
        if let Some(mismatch) = &shape_mismatch {
            warn!(
                "Reduced '{}' is {} but its inputs were {}",
                mismatch.field, mismatch.actual, mismatch.expected
            );
        }

        let interaction = Interaction::record(
            InteractionKind::Reduction {
                field: field.to_string(),
            },
            prompt,
            response,
            files,
            usage,
            status == ReductionStatus::Reduced,
        );

        Ok(FieldReduction {
            field: field.to_string(),
            value,
            status,
            shape_mismatch,
            usage,
            interaction,
        })
    }
}

/// JSON type name of a value
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn shape_mismatch(field: &str, inputs: &[Value], reduced: &Value) -> Option<ShapeMismatch> {
    let mut kinds = inputs.iter().filter(|v| !is_blank(v)).map(json_kind);
    let expected = kinds.next()?;
    if kinds.any(|kind| kind != expected) {
        return None;
    }
    let actual = json_kind(reduced);
    (actual != expected).then(|| ShapeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}
