//! Packing ordered text batches into budget-sized chunks

/// Greedily pack `batches` into chunks of at most `budget` characters.
///
/// Batches are joined by a single space and kept in order. A batch joins the
/// current chunk while the chunk, the separating space and the batch together
/// stay within `budget`; otherwise the chunk is closed and the batch starts a
/// new one. A batch longer than `budget` is never split and becomes its own
/// oversized chunk. Blank chunks are never emitted, so empty input gives no
/// chunks.
///
/// ```
/// use docmeta_aggregator::pack;
///
/// let chunks = pack(&["alpha", "beta", "gamma"], 11);
/// assert_eq!(chunks, vec!["alpha beta", "gamma"]);
/// ```
pub fn pack<S: AsRef<str>>(batches: &[S], budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for batch in batches {
        let batch = batch.as_ref();
        let batch_chars = batch.chars().count();
        let needed = if current.is_empty() {
            batch_chars
        } else {
            current_chars + 1 + batch_chars
        };

        if needed <= budget {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(batch);
            current_chars = needed;
        } else {
            close_chunk(&mut chunks, &current);
            current = batch.to_string();
            current_chars = batch_chars;
        }
    }
    close_chunk(&mut chunks, &current);

    chunks
}

fn close_chunk(chunks: &mut Vec<String>, current: &str) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_gives_no_chunks() {
        let batches: Vec<String> = Vec::new();
        assert!(pack(&batches, 100).is_empty());
    }

    #[test]
    fn test_everything_fits_in_one_chunk() {
        let chunks = pack(&["First batch.", "Second batch."], 100);
        assert_eq!(chunks, vec!["First batch. Second batch."]);
    }

    #[test]
    fn test_oversized_neighbours_split_into_single_batches() {
        let batches = vec!["A".repeat(500), "B".repeat(500), "C".repeat(500)];
        let chunks = pack(&batches, 900);

        assert_eq!(chunks, batches);
    }

    #[test]
    fn test_separator_counts_towards_budget() {
        // "aaaa bbbbb" is exactly 10 chars; adding " c" would overflow.
        let chunks = pack(&["aaaa", "bbbbb", "c"], 10);
        assert_eq!(chunks, vec!["aaaa bbbbb", "c"]);
    }

    #[test]
    fn test_oversized_first_batch_has_no_empty_chunk_before_it() {
        let chunks = pack(&["x".repeat(50), "y".to_string()], 10);
        assert_eq!(chunks, vec!["x".repeat(50), "y".to_string()]);
    }

    #[test]
    fn test_oversized_batch_in_the_middle() {
        let chunks = pack(&["a".to_string(), "z".repeat(30), "b".to_string()], 10);
        assert_eq!(chunks, vec!["a".to_string(), "z".repeat(30), "b".to_string()]);
    }

    #[test]
    fn test_blank_batches_are_dropped() {
        let chunks = pack(&["   ", ""], 10);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_budget_counts_characters() {
        // Each batch is 4 chars but 8 bytes.
        let chunks = pack(&["éééé", "ñññ"], 8);
        assert_eq!(chunks, vec!["éééé ñññ"]);
    }

    #[test]
    fn test_deterministic() {
        let batches: Vec<String> = (0..40).map(|i| format!("batch number {}", i)).collect();
        assert_eq!(pack(&batches, 64), pack(&batches, 64));
    }

    proptest! {
        #[test]
        fn prop_multi_batch_chunks_respect_budget(
            batches in prop::collection::vec("[a-z]{1,40}", 0..30),
            budget in 1usize..120,
        ) {
            for chunk in pack(&batches, budget) {
                let is_single_batch = batches.iter().any(|b| b == &chunk);
                prop_assert!(is_single_batch || chunk.chars().count() <= budget);
            }
        }

        #[test]
        fn prop_order_is_preserved(
            batches in prop::collection::vec("[a-z]{1,40}", 0..30),
            budget in 1usize..120,
        ) {
            let chunks = pack(&batches, budget);
            let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split(' ')).collect();
            let original: Vec<&str> = batches.iter().map(String::as_str).collect();
            prop_assert_eq!(rejoined, original);
        }

        #[test]
        fn prop_non_empty_input_gives_at_least_one_chunk(
            batches in prop::collection::vec("[a-z]{1,40}", 1..30),
            budget in 1usize..120,
        ) {
            prop_assert!(!pack(&batches, budget).is_empty());
        }
    }
}
