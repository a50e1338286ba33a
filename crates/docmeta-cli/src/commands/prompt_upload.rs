//! Prompt upload command implementation.

use crate::cli::PromptUploadArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::storage::Storage;
use docmeta_store::PromptStore;
use std::fs;

/// Execute the prompt-upload command.
pub fn execute_prompt_upload(args: PromptUploadArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let text = fs::read_to_string(&args.file)?;
    if text.trim().is_empty() {
        return Err(CliError::InvalidInput(format!("{} is empty", args.file.display())));
    }

    let mut prompts = PromptStore::with_folder(Storage::open(&config.store)?, config.store.prompt_folder.clone());
    let path = prompts.upload_prompt(&args.name, args.version, &text)?;

    println!(
        "{}",
        formatter.success(&format!("Prompt {} v{} uploaded to {}", args.name, args.version, path))
    );
    Ok(())
}
