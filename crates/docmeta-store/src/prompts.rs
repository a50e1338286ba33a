//! Versioned prompt catalogue

use crate::StoreError;
use docmeta_domain::ObjectStore;
use tracing::info;

/// Folder prompts live under unless configured otherwise
pub const DEFAULT_PROMPT_FOLDER: &str = "prompts";

/// Prompt templates stored as `{folder}/{name}/v{N}.txt`
pub struct PromptStore<S> {
    store: S,
    folder: String,
}

impl<S> PromptStore<S>
where
    S: ObjectStore<Error = StoreError>,
{
    /// Catalogue under the default `prompts` folder
    pub fn new(store: S) -> Self {
        Self::with_folder(store, DEFAULT_PROMPT_FOLDER)
    }

    /// Catalogue under a custom folder
    pub fn with_folder(store: S, folder: impl Into<String>) -> Self {
        Self {
            store,
            folder: folder.into().trim_matches('/').to_string(),
        }
    }

    /// Underlying object store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the underlying object store
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Path of one prompt version
    pub fn prompt_path(&self, name: &str, version: u32) -> String {
        format!("{}/{}/v{}.txt", self.folder, name, version)
    }

    /// Stored versions of `name`, ascending
    ///
    /// Files that do not follow the `v{N}.txt` pattern are ignored.
    pub fn versions(&self, name: &str) -> Result<Vec<u32>, StoreError> {
        let prefix = format!("{}/{}/", self.folder, name);
        let mut versions: Vec<u32> = self
            .store
            .list(&prefix)?
            .iter()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter_map(parse_version)
            .collect();
        versions.sort_unstable();
        versions.dedup();
        Ok(versions)
    }

    /// Fetch a prompt; `None` selects the highest stored version
    pub fn get_prompt(&self, name: &str, version: Option<u32>) -> Result<String, StoreError> {
        let not_found = || StoreError::PromptNotFound {
            name: name.to_string(),
            version,
        };

        let versions = self.versions(name)?;
        let chosen = match version {
            Some(wanted) => versions.contains(&wanted).then_some(wanted),
            None => versions.last().copied(),
        }
        .ok_or_else(not_found)?;

        let bytes = self.store.get(&self.prompt_path(name, chosen))?;
        String::from_utf8(bytes)
            .map_err(|e| StoreError::InvalidData(format!("prompt {} v{}: {}", name, chosen, e)))
    }

    /// Store `text` as version `version` of `name`, returning its path
    pub fn upload_prompt(&mut self, name: &str, version: u32, text: &str) -> Result<String, StoreError> {
        let path = self.prompt_path(name, version);
        self.store.put(&path, text.as_bytes())?;
        info!("Prompt {} v{} uploaded to {}", name, version, path);
        Ok(path)
    }
}

/// `v12.txt` → 12; anything else, including nested paths, → None
fn parse_version(file_name: &str) -> Option<u32> {
    file_name.strip_prefix('v')?.strip_suffix(".txt")?.parse().ok()
}
