//! docmeta CLI - Document metadata extraction from the command line.

use anyhow::Context;
use clap::Parser;
use docmeta_cli::commands;
use docmeta_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Metadata(args) => {
            let input = args.input.clone();
            commands::execute_metadata(args, &config, &formatter)
                .await
                .with_context(|| format!("metadata run over '{}' failed", input))?;
        }
        Command::Prepare(args) => {
            let input = args.input.clone();
            commands::execute_prepare(args, &config, &formatter)
                .with_context(|| format!("preparing batches under '{}' failed", input))?;
        }
        Command::PromptUpload(args) => {
            commands::execute_prompt_upload(args, &config, &formatter).context("prompt upload failed")?;
        }
    }

    Ok(())
}
