//! Metadata jobs over an object store

use crate::error::{CliError, Result};
use crate::prepare::file_stem;
use docmeta_aggregator::{
    AggregationOutcome, AggregatorError, InteractionLog, MetadataAggregator, TokenUsage,
};
use docmeta_domain::{ObjectStore, TextGenerator, TokenCounter};
use docmeta_store::StoreError;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Folder that receives mix outputs
pub const MIX_FOLDER: &str = "mix";

/// Folder that receives saved conversations
pub const CONVERSATIONS_FOLDER: &str = "conversations";

/// Chooses which listed batch files a job should read
pub trait FileSelector: Send + Sync {
    /// Return the files to process, in processing order
    fn select(&self, files: Vec<String>) -> Vec<String>;
}

/// Keeps every file
#[derive(Debug, Clone, Copy, Default)]
pub struct AllFiles;

impl FileSelector for AllFiles {
    fn select(&self, files: Vec<String>) -> Vec<String> {
        files
    }
}

/// What one aggregation wrote
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    /// Batch files the metadata was built from
    pub files: Vec<String>,

    /// Path of the written metadata file
    pub output_path: String,

    /// Number of metadata fields, token fields excluded
    pub field_count: usize,

    /// Number of chunks the text was packed into
    pub chunk_count: usize,

    /// Number of model calls
    pub call_count: usize,

    /// Summed token cost
    pub usage: TokenUsage,
}

impl DocumentReport {
    fn new(files: Vec<String>, output_path: String, outcome: &AggregationOutcome) -> Self {
        Self {
            files,
            output_path,
            field_count: outcome.metadata.fields.len(),
            chunk_count: outcome.chunk_count,
            call_count: outcome.call_count(),
            usage: outcome.usage,
        }
    }

    /// True when the model produced no usable field
    pub fn is_empty(&self) -> bool {
        self.field_count == 0
    }
}

/// Generates metadata files from stored batch files
///
/// Every model call made through the job is kept in one conversation log
/// until [`save_conversation`](Self::save_conversation) is called.
pub struct MetadataJob<'a, S, G, C> {
    store: &'a mut S,
    aggregator: &'a MetadataAggregator<G, C>,
    template: String,
    user_id: String,
    session_id: String,
    selector: Box<dyn FileSelector>,
    conversation: InteractionLog,
}

impl<'a, S, G, C> MetadataJob<'a, S, G, C>
where
    S: ObjectStore<Error = StoreError>,
    G: TextGenerator + Sync,
    C: TokenCounter,
{
    /// Create a job using `template` as the extraction prompt
    pub fn new(
        store: &'a mut S,
        aggregator: &'a MetadataAggregator<G, C>,
        template: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            aggregator,
            template: template.into(),
            user_id: user_id.into(),
            session_id: Uuid::now_v7().to_string(),
            selector: Box::new(AllFiles),
            conversation: InteractionLog::new(),
        }
    }

    /// Replace the file selection hook
    pub fn with_selector(mut self, selector: impl FileSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Identifier of this job's conversation
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Calls logged so far
    pub fn conversation(&self) -> &InteractionLog {
        &self.conversation
    }

    /// Batch files under `prefix`, after the selection hook
    pub fn select_relevant_files(&self, prefix: &str) -> Result<Vec<String>> {
        let files: Vec<String> = self
            .store
            .list(prefix)?
            .into_iter()
            .filter(|path| path.ends_with(".json"))
            .collect();
        let selected = self.selector.select(files);
        info!("Selected {} batch file(s) under '{}'", selected.len(), prefix);
        Ok(selected)
    }

    /// Write one `{stem}_metadata.json` per batch file under `input`
    pub async fn run_documents(&mut self, input: &str, output: &str) -> Result<Vec<DocumentReport>> {
        let files = self.select_relevant_files(input)?;
        let mut reports = Vec::with_capacity(files.len());

        for file in files {
            info!("Generating metadata for {}", file);
            let batches = self.read_batches(&file)?;
            let referenced = vec![file.clone()];
            let result = self
                .aggregator
                .aggregate(&batches, &self.template, &referenced)
                .await;
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => return Err(self.keep_completed_calls(e)),
            };

            let output_path = metadata_path(output, &file);
            self.write_outcome(&output_path, outcome, referenced, &mut reports)?;
        }

        Ok(reports)
    }

    /// Aggregate every batch file under `input` into one mix file
    pub async fn run_mix(&mut self, input: &str) -> Result<DocumentReport> {
        let files = self.select_relevant_files(input)?;
        if files.is_empty() {
            return Err(CliError::InvalidInput(format!("no batch files under '{}'", input)));
        }

        let mut batches = Vec::new();
        for file in &files {
            batches.extend(self.read_batches(file)?);
        }
        info!("Generating mix metadata from {} file(s), {} batch(es)", files.len(), batches.len());

        let result = self.aggregator.aggregate(&batches, &self.template, &files).await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.keep_completed_calls(e)),
        };
        let output_path = mix_path(input);
        let mut reports = Vec::with_capacity(1);
        self.write_outcome(&output_path, outcome, files, &mut reports)?;
        reports
            .pop()
            .ok_or_else(|| CliError::InvalidInput("mix produced no report".into()))
    }

    /// Store the conversation log as `conversations/{user}/{session}.json`
    pub fn save_conversation(&mut self) -> Result<String> {
        let path = format!(
            "{}/{}/{}.json",
            CONVERSATIONS_FOLDER, self.user_id, self.session_id
        );
        self.store
            .put(&path, self.conversation.to_json_pretty()?.as_bytes())?;
        info!("Conversation saved to {}", path);
        Ok(path)
    }

    /// Save the conversation whatever `run` returned, then hand `run` back
    ///
    /// On success the saved path is returned next to the run's value. When
    /// the run failed, its error wins over a failure to save.
    pub fn conclude<T>(&mut self, run: Result<T>) -> Result<(T, String)> {
        let saved = self.save_conversation();
        match run {
            Ok(value) => Ok((value, saved?)),
            Err(e) => {
                match saved {
                    Ok(path) => warn!("Run failed; conversation so far saved to {}", path),
                    Err(save_error) => warn!("Run failed and its conversation was lost: {}", save_error),
                }
                Err(e)
            }
        }
    }

    fn keep_completed_calls(&mut self, error: AggregatorError) -> CliError {
        if let Some(completed) = error.interactions() {
            self.conversation.append(completed.clone());
        }
        error.into()
    }

    fn read_batches(&self, file: &str) -> Result<Vec<String>> {
        let bytes = self.store.get(file)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            CliError::InvalidInput(format!("{} is not a JSON array of strings: {}", file, e))
        })
    }

    fn write_outcome(
        &mut self,
        output_path: &str,
        outcome: AggregationOutcome,
        files: Vec<String>,
        reports: &mut Vec<DocumentReport>,
    ) -> Result<()> {
        if outcome.is_empty() {
            warn!("No metadata fields could be extracted for {}", output_path);
        }
        self.store
            .put(output_path, outcome.metadata.to_json_pretty()?.as_bytes())?;
        info!("Metadata written to {}", output_path);

        reports.push(DocumentReport::new(files, output_path.to_string(), &outcome));
        self.conversation.append(outcome.interactions);
        Ok(())
    }
}

/// `{output}/{stem}_metadata.json` for a batch file
pub fn metadata_path(output: &str, file: &str) -> String {
    let name = format!("{}_metadata.json", file_stem(file));
    let output = output.trim_matches('/');
    if output.is_empty() {
        name
    } else {
        format!("{}/{}", output, name)
    }
}

/// `mix/{folder}_mix.json`, with the folder's separators flattened to `_`
pub fn mix_path(input: &str) -> String {
    let folder = input.trim_matches(['/', '\\']).replace(['/', '\\'], "_");
    format!("{}/{}_mix.json", MIX_FOLDER, folder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_path() {
        assert_eq!(
            metadata_path("metadata/2024/", "batches/2024/report_batches.json"),
            "metadata/2024/report_batches_metadata.json"
        );
        assert_eq!(metadata_path("", "a.json"), "a_metadata.json");
    }

    #[test]
    fn test_mix_path() {
        assert_eq!(mix_path("batches/2024/"), "mix/batches_2024_mix.json");
        assert_eq!(mix_path("/batches\\q3/"), "mix/batches_q3_mix.json");
    }

    #[test]
    fn test_all_files_keeps_order() {
        let files = vec!["b.json".to_string(), "a.json".to_string()];
        assert_eq!(AllFiles.select(files.clone()), files);
    }
}
