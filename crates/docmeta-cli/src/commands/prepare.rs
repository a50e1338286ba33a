//! Prepare command implementation.

use crate::cli::PrepareArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::prepare::prepare_documents;
use crate::storage::Storage;

/// Execute the prepare command.
pub fn execute_prepare(args: PrepareArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut store = Storage::open(&config.store)?;
    let written = prepare_documents(&mut store, &args.input, args.batch_size)?;

    println!("{}", formatter.format_paths("Prepared", &written)?);
    Ok(())
}
