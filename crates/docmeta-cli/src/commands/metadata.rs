//! Metadata command implementation.

use crate::cli::MetadataArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::pipeline::MetadataJob;
use crate::storage::Storage;
use docmeta_aggregator::MetadataAggregator;
use docmeta_domain::TokenCounter;
use docmeta_llm::OllamaProvider;
use docmeta_store::PromptStore;
use std::time::Duration;

/// Execute the metadata command.
pub async fn execute_metadata(args: MetadataArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let prompt_name = args.prompt.as_deref().unwrap_or(&config.job.prompt_name);
    let prompt_version = args.prompt_version.or(config.job.prompt_version);
    let prompts = PromptStore::with_folder(Storage::open(&config.store)?, config.store.prompt_folder.clone());
    let template = prompts.get_prompt(prompt_name, prompt_version)?;
    let mut store = prompts.into_inner();

    let user_id = args.user.unwrap_or_else(|| config.job.user_id.clone());
    if user_id.is_empty() || user_id.contains(['/', '\\']) {
        return Err(CliError::InvalidInput(format!("invalid user id '{}'", user_id)));
    }

    let mut provider = OllamaProvider::new(&config.llm.endpoint, &config.llm.model)
        .with_max_retries(config.llm.max_retries)
        .with_timeout(Duration::from_secs(config.llm.request_timeout_secs));
    if let Some(temperature) = config.llm.temperature {
        provider = provider.with_temperature(temperature);
    }

    let aggregator = MetadataAggregator::new(provider, token_counter()?, config.aggregator_config())?;
    let mut job = MetadataJob::new(&mut store, &aggregator, template, user_id);

    let run = if args.mix {
        job.run_mix(&args.input).await.map(|report| vec![report])
    } else {
        job.run_documents(&args.input, &args.output).await
    };
    let (reports, conversation) = job.conclude(run)?;

    println!("{}", formatter.format_reports(&reports)?);
    for report in reports.iter().filter(|r| r.is_empty()) {
        eprintln!(
            "{}",
            formatter.warning(&format!("{} holds token totals only", report.output_path))
        );
    }
    eprintln!("{}", formatter.info(&format!("Conversation saved to {}", conversation)));

    Ok(())
}

/// Token counter used by the CLI
#[cfg(feature = "tiktoken")]
pub fn token_counter() -> Result<Box<dyn TokenCounter>> {
    Ok(Box::new(docmeta_aggregator::TiktokenCounter::new()?))
}

/// Token counter used by the CLI
#[cfg(not(feature = "tiktoken"))]
pub fn token_counter() -> Result<Box<dyn TokenCounter>> {
    Ok(Box::new(docmeta_aggregator::HeuristicCounter))
}
