//! Best-effort JSON object recovery from model responses
//!
//! Models often wrap a valid JSON object in prose or markdown fences. Parsing
//! tries the whole response first, then the widest `{ ... }` span (first `{`
//! to last `}`). The widest span over-captures when a response holds two
//! separate objects; that case fails rather than guessing which one was meant.

use crate::error::ParseError;
use crate::types::{ParseStatus, PartialMetadata};
use serde_json::Value;

/// Parse a model response into a JSON object
///
/// ```
/// use docmeta_aggregator::{parse_metadata, ParseStatus};
///
/// let (object, status) = parse_metadata(r#"noise {"a": 1, "b": [2,3]} trailing text"#).unwrap();
/// assert_eq!(object["b"], serde_json::json!([2, 3]));
/// assert_eq!(status, ParseStatus::Recovered);
///
/// assert!(parse_metadata("not json at all").is_err());
/// ```
pub fn parse_metadata(response: &str) -> Result<(PartialMetadata, ParseStatus), ParseError> {
    let direct_error = match serde_json::from_str::<Value>(response.trim()) {
        Ok(Value::Object(object)) => return Ok((object, ParseStatus::Direct)),
        Ok(_) => ParseError::NotAnObject,
        Err(e) => ParseError::Invalid(e.to_string()),
    };

    let Some(span) = json_span(response) else {
        return Err(match direct_error {
            ParseError::NotAnObject => ParseError::NotAnObject,
            _ => ParseError::NoJsonObject,
        });
    };

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(object)) => Ok((object, ParseStatus::Recovered)),
        Ok(_) => Err(ParseError::NotAnObject),
        Err(e) => Err(ParseError::Invalid(e.to_string())),
    }
}

/// The widest brace-delimited span: first `{` through last `}`
pub fn json_span(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_object() {
        let (object, status) = parse_metadata(r#"{"title": "Q3 report", "year": 2024}"#).unwrap();
        assert_eq!(status, ParseStatus::Direct);
        assert_eq!(object["title"], json!("Q3 report"));
        assert_eq!(object["year"], json!(2024));
    }

    #[test]
    fn test_parse_object_with_surrounding_whitespace() {
        let (_, status) = parse_metadata("\n\n  {\"a\": 1}\n").unwrap();
        assert_eq!(status, ParseStatus::Direct);
    }

    #[test]
    fn test_parse_object_inside_prose() {
        let (object, status) = parse_metadata(r#"noise {"a": 1, "b": [2,3]} trailing text"#).unwrap();
        assert_eq!(status, ParseStatus::Recovered);
        assert_eq!(serde_json::Value::Object(object), json!({"a": 1, "b": [2, 3]}));
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = r#"```json
{
    "issuer": "ACME Corp",
    "topics": ["earnings", "guidance"]
}
```"#;
        let (object, status) = parse_metadata(response).unwrap();
        assert_eq!(status, ParseStatus::Recovered);
        assert_eq!(object["topics"], json!(["earnings", "guidance"]));
    }

    #[test]
    fn test_parse_nested_objects_use_outermost_braces() {
        let (object, _) = parse_metadata(r#"Result: {"a": {"b": {"c": 1}}} done"#).unwrap();
        assert_eq!(object["a"]["b"]["c"], json!(1));
    }

    #[test]
    fn test_parse_invalid_text() {
        assert_eq!(parse_metadata("not json at all"), Err(ParseError::NoJsonObject));
    }

    #[test]
    fn test_parse_empty_response() {
        assert_eq!(parse_metadata(""), Err(ParseError::NoJsonObject));
    }

    #[test]
    fn test_parse_array_is_not_an_object() {
        assert_eq!(parse_metadata("[1, 2, 3]"), Err(ParseError::NotAnObject));
    }

    #[test]
    fn test_parse_array_of_objects_recovers_the_span() {
        // The widest span of `[{"a":1},{"b":2}]` is `{"a":1},{"b":2}`, which is invalid.
        assert!(matches!(
            parse_metadata(r#"[{"a": 1}, {"b": 2}]"#),
            Err(ParseError::Invalid(_))
        ));
    }

    #[test]
    fn test_greedy_span_over_captures_two_objects() {
        // A balanced-brace parser would return {"a": 1}; the widest span does not.
        let response = r#"First: {"a": 1} and second: {"b": 2}"#;
        assert_eq!(json_span(response), Some(r#"{"a": 1} and second: {"b": 2}"#));
        assert!(matches!(parse_metadata(response), Err(ParseError::Invalid(_))));
    }

    #[test]
    fn test_broken_json_inside_braces() {
        assert!(matches!(
            parse_metadata("here {title: unquoted} there"),
            Err(ParseError::Invalid(_))
        ));
    }

    #[test]
    fn test_json_span_requires_closing_after_opening() {
        assert_eq!(json_span("} backwards {"), None);
        assert_eq!(json_span("{ never closed"), None);
        assert_eq!(json_span("{}"), Some("{}"));
    }

    #[test]
    fn test_parse_preserves_key_order() {
        let (object, _) = parse_metadata(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }
}
