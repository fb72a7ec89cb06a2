//! Coverage command implementation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::Args;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::dictionary::read_dictionary;
use crate::output::table::{format_coverage_table, LanguageCoverage};

/// Arguments for the coverage command.
#[derive(Debug, Args)]
pub struct CoverageArgs {
    /// Source language dictionary (e.g., en.json).
    #[arg(long)]
    pub source: PathBuf,

    /// Languages to check coverage for (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub lang: Vec<String>,

    /// Directory containing `<lang>.json` files. Defaults to the source file directory.
    #[arg(long)]
    pub translations: Option<PathBuf>,

    /// Exit with non-zero code if any translation is incomplete.
    #[arg(long)]
    pub strict: bool,

    /// Output results as JSON.
    #[arg(long)]
    pub json: bool,
}

/// JSON output format for coverage data.
#[derive(Debug, Serialize)]
struct CoverageJson {
    language: String,
    translated: usize,
    total: usize,
    missing: Vec<String>,
}

fn key_set(path: &Path) -> Result<BTreeSet<String>> {
    Ok(read_dictionary(path)?
        .into_iter()
        .map(|(key, _)| key)
        .collect())
}

/// Run the coverage command.
pub fn run_coverage(args: CoverageArgs) -> Result<i32> {
    let source_keys = key_set(&args.source)?;
    let source_count = source_keys.len();

    // Determine base directory for translation files
    let base_dir = args
        .translations
        .clone()
        .or_else(|| args.source.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut coverage_data: Vec<LanguageCoverage> = Vec::new();

    for lang in &args.lang {
        let lang_file = base_dir.join(format!("{lang}.json"));

        // A missing file translates nothing
        let translated = if lang_file.exists() {
            key_set(&lang_file)?
        } else {
            BTreeSet::new()
        };

        let missing: Vec<String> = source_keys.difference(&translated).cloned().collect();
        coverage_data.push(LanguageCoverage {
            language: lang.clone(),
            translated: source_count - missing.len(),
            missing,
        });
    }

    let any_incomplete = coverage_data.iter().any(|c| !c.missing.is_empty());

    if args.json {
        let json_data: Vec<CoverageJson> = coverage_data
            .iter()
            .map(|c| CoverageJson {
                language: c.language.clone(),
                translated: c.translated,
                total: source_count,
                missing: c.missing.clone(),
            })
            .collect();

        let json_output = serde_json::to_string_pretty(&json_data).into_diagnostic()?;
        println!("{json_output}");
    } else {
        let table = format_coverage_table(source_count, &coverage_data);
        println!("{table}");

        for lang_coverage in &coverage_data {
            if !lang_coverage.missing.is_empty() {
                println!("\nMissing in {}:", lang_coverage.language);
                for name in &lang_coverage.missing {
                    println!("  - {name}");
                }
            }
        }
    }

    if args.strict && any_incomplete {
        Ok(exitcode::DATAERR)
    } else {
        Ok(exitcode::OK)
    }
}
