//! Turning raw text documents into batch files

use crate::error::{CliError, Result};
use docmeta_domain::ObjectStore;
use docmeta_store::StoreError;
use tracing::{info, warn};

/// Characters per batch unless told otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Suffix of every batch file name
pub const BATCHES_SUFFIX: &str = "_batches.json";

/// Split `text` into consecutive pieces of `batch_size` characters
///
/// The last piece may be shorter. Empty text gives no batches.
pub fn split_into_batches(text: &str, batch_size: usize) -> Result<Vec<String>> {
    if batch_size == 0 {
        return Err(CliError::InvalidInput("batch size must be greater than 0".into()));
    }
    let chars: Vec<char> = text.chars().collect();
    Ok(chars
        .chunks(batch_size)
        .map(|piece| piece.iter().collect())
        .collect())
}

/// Where the batches of a raw document are stored
///
/// A leading `raw` segment becomes `batches` and the file name becomes
/// `{stem}_batches.json`; the rest of the path is kept.
pub fn batches_path(raw_path: &str) -> String {
    let mut segments: Vec<&str> = raw_path.split('/').collect();
    if segments.first() == Some(&"raw") {
        segments[0] = "batches";
    }
    let file_name = segments.pop().unwrap_or_default();
    let file_name = format!("{}{}", file_stem(file_name), BATCHES_SUFFIX);
    segments.push(&file_name);
    segments.join("/")
}

/// File name without its last extension
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Split every text document under `prefix` into a batch file
///
/// Existing batch files and documents that are not UTF-8 are skipped.
/// Returns the paths written.
pub fn prepare_documents<S>(store: &mut S, prefix: &str, batch_size: usize) -> Result<Vec<String>>
where
    S: ObjectStore<Error = StoreError>,
{
    let documents = store.list(prefix)?;
    let mut written = Vec::new();

    for document in documents.iter().filter(|path| !path.ends_with(BATCHES_SUFFIX)) {
        let bytes = store.get(document)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                warn!("Skipping {}: not UTF-8 text", document);
                continue;
            }
        };

        let batches = split_into_batches(&text, batch_size)?;
        let target = batches_path(document);
        store.put(&target, serde_json::to_string_pretty(&batches)?.as_bytes())?;
        info!("Wrote {} batch(es) for {} to {}", batches.len(), document, target);
        written.push(target);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmeta_store::MemoryStore;

    #[test]
    fn test_split_even_and_remainder() {
        let batches = split_into_batches("abcdefgh", 3).unwrap();
        assert_eq!(batches, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_split_counts_chars() {
        let batches = split_into_batches("ñññññ", 2).unwrap();
        assert_eq!(batches, vec!["ññ", "ññ", "ñ"]);
    }

    #[test]
    fn test_split_empty_and_zero() {
        assert!(split_into_batches("", 10).unwrap().is_empty());
        assert!(matches!(split_into_batches("x", 0), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_batches_path_mirrors_raw_tree() {
        assert_eq!(batches_path("raw/2024/q3/report.txt"), "batches/2024/q3/report_batches.json");
        assert_eq!(batches_path("inbox/report.txt"), "inbox/report_batches.json");
        assert_eq!(batches_path("report.v2.txt"), "report.v2_batches.json");
        assert_eq!(batches_path("raw/README"), "batches/README_batches.json");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("batches/2024/report_batches.json"), "report_batches");
        assert_eq!(file_stem(".hidden"), ".hidden");
        assert_eq!(file_stem("plain"), "plain");
    }

    #[test]
    fn test_prepare_documents() {
        let mut store = MemoryStore::new();
        store.put("raw/a.txt", "x".repeat(2500).as_bytes()).unwrap();
        store.put("raw/b.bin", &[0xff, 0xfe]).unwrap();

        let written = prepare_documents(&mut store, "raw/", 1000).unwrap();
        assert_eq!(written, vec!["batches/a_batches.json"]);

        let batches: Vec<String> =
            serde_json::from_slice(&store.get("batches/a_batches.json").unwrap()).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 500);
    }
}
