//! Implementation of the `lokal keys` command.

use std::path::PathBuf;

use lokal::Key;
use miette::IntoDiagnostic;

use crate::dictionary::load_store;

/// Arguments for the keys command.
#[derive(Debug, clap::Args)]
pub struct KeysArgs {
    /// Dictionary file (.json)
    #[arg(long)]
    pub dict: PathBuf,

    /// Partially typed key, e.g. `UI.Item.S`
    #[arg(default_value = "")]
    pub partial: String,

    /// List every key below PARTIAL instead of the next segments
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the keys command.
pub fn run_keys(args: KeysArgs) -> miette::Result<i32> {
    let store = load_store(&args.dict)?;

    let names: Vec<String> = if args.all {
        let partial = Key::parse(args.partial.trim_end_matches('.')).into_diagnostic()?;
        store
            .lookup(&partial)
            .iter()
            .map(ToString::to_string)
            .collect()
    } else {
        store.options(&args.partial)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&names).into_diagnostic()?);
    } else {
        for name in &names {
            println!("{name}");
        }
    }

    if names.is_empty() {
        Ok(exitcode::DATAERR)
    } else {
        Ok(exitcode::OK)
    }
}
