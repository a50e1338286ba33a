//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docmeta - Extract document metadata with a language model.
#[derive(Debug, Parser)]
#[command(name = "docmeta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DOCMETA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (output paths only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate metadata files from prepared batches
    Metadata(MetadataArgs),

    /// Split raw text documents into batch files
    Prepare(PrepareArgs),

    /// Store a prompt template as a new version
    PromptUpload(PromptUploadArgs),
}

/// Arguments for the metadata command.
#[derive(Debug, Parser)]
pub struct MetadataArgs {
    /// Store prefix holding the batch files (e.g., batches/2024/)
    #[arg(short, long)]
    pub input: String,

    /// Store prefix for per-document metadata files
    #[arg(short, long, default_value = "metadata")]
    pub output: String,

    /// Aggregate every document under the input prefix into one mix file
    #[arg(long)]
    pub mix: bool,

    /// Prompt name (overrides the config)
    #[arg(long)]
    pub prompt: Option<String>,

    /// Prompt version (overrides the config; latest when unset)
    #[arg(long)]
    pub prompt_version: Option<u32>,

    /// User the conversation log is filed under (overrides the config)
    #[arg(long)]
    pub user: Option<String>,
}

/// Arguments for the prepare command.
#[derive(Debug, Parser)]
pub struct PrepareArgs {
    /// Store prefix holding raw text documents (e.g., raw/2024/)
    #[arg(short, long)]
    pub input: String,

    /// Characters per batch
    #[arg(short, long, default_value_t = crate::prepare::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

/// Arguments for the prompt-upload command.
#[derive(Debug, Parser)]
pub struct PromptUploadArgs {
    /// Prompt name
    #[arg(short, long)]
    pub name: String,

    /// Version number
    #[arg(short, long)]
    pub version: u32,

    /// File holding the prompt text
    #[arg(long)]
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_metadata_mix() {
        let cli = Cli::parse_from(["docmeta", "metadata", "--input", "batches/2024/", "--mix"]);
        match cli.command {
            Command::Metadata(args) => {
                assert_eq!(args.input, "batches/2024/");
                assert_eq!(args.output, "metadata");
                assert!(args.mix);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_prepare_default_batch_size() {
        let cli = Cli::parse_from(["docmeta", "prepare", "-i", "raw/"]);
        match cli.command {
            Command::Prepare(args) => assert_eq!(args.batch_size, 1000),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_prompt_upload() {
        let cli = Cli::parse_from([
            "docmeta", "--no-color", "prompt-upload", "--name", "metadata", "--version", "5", "--file",
            "metadata_v5.txt",
        ]);
        assert!(cli.no_color);
        match cli.command {
            Command::PromptUpload(args) => {
                assert_eq!(args.name, "metadata");
                assert_eq!(args.version, 5);
                assert_eq!(args.file, PathBuf::from("metadata_v5.txt"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
