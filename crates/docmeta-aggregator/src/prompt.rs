//! Prompt construction for extraction and reduction calls

use serde_json::Value;

/// Phrase in extraction templates that implies a complete document
pub const DOCUMENT_PHRASE: &str = "following document";

/// Build the extraction prompt for one chunk
///
/// A single-chunk document keeps the template as is and is introduced as
/// `Document:`. When the document spans several chunks, every occurrence of
/// [`DOCUMENT_PHRASE`] is rewritten to name the chunk position, and the chunk
/// is introduced as `Text:`. The chunk is cut to `budget` characters.
pub fn extraction_prompt(
    template: &str,
    chunk: &str,
    chunk_index: Option<usize>,
    total_chunks: usize,
    budget: usize,
) -> String {
    let text = truncate_chars(chunk, budget);

    match chunk_index {
        Some(index) if total_chunks > 1 => {
            let partial = format!(
                "following text, which is batch {} of {} of a document",
                index + 1,
                total_chunks
            );
            let mut prompt = template.replace(DOCUMENT_PHRASE, &partial);
            prompt.push_str("\n\nText:\n");
            prompt.push_str(text);
            prompt
        }
        _ => {
            let mut prompt = String::with_capacity(template.len() + text.len() + 12);
            prompt.push_str(template);
            prompt.push_str("\n\nDocument:\n");
            prompt.push_str(text);
            prompt
        }
    }
}

/// Build the prompt that merges one field's per-chunk values
pub fn reduction_prompt(field: &str, values: &[Value]) -> String {
    let values = Value::Array(values.to_vec());
    format!(
        "You are combining the results of a document analysis. The key to combine is '{field}'. \
         Here are the values for this key from different batches: {values}\n\
         Generate the final value for '{field}'.Return only a valid JSON object with only one field: \
         the key. And the value must be in the same format as in the inputs: ie, if the inputs are \
         lists, list, if the inputs are strings, string ..."
    )
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
