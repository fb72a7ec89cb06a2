//! Implementation of the `lokal check` command.
//!
//! Renders every key of a dictionary and reports the diagnostics. Variables
//! that no `--param` binds resolve to the placeholder `1`, so only problems
//! in the templates themselves are reported.

use std::path::PathBuf;

use lokal::interpreter::Arguments;
use lokal::{Key, Params, Translator, Value};
use miette::{IntoDiagnostic, Report};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::dictionary::load_store;
use crate::output::TemplateDiagnostic;
use crate::output::table::{KeyReport, format_check_table};

/// Arguments for the check command.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Dictionary file (.json)
    #[arg(long)]
    pub dict: PathBuf,

    /// Expansion depth limit
    #[arg(long, env = "LOKAL_MAX_DEPTH", default_value_t = 16)]
    pub max_depth: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for one key with diagnostics.
#[derive(Serialize)]
struct KeyJson<'a> {
    key: String,
    diagnostics: &'a lokal::Diagnostics,
}

/// Run the check command.
pub fn run_check(args: CheckArgs) -> miette::Result<i32> {
    let store = load_store(&args.dict)?;
    let keys: Vec<Key> = store.keys();
    let translator = Translator::builder()
        .store(store)
        .max_depth(args.max_depth)
        .build();

    let placeholder = |_: &str, _: &Arguments<'_>| Some(Value::Number(1));
    let params = Params::new();
    let ctx = translator.context(&params).with_source(&placeholder);

    let mut evaluations = Vec::new();
    for key in &keys {
        let evaluation = translator.translate_with(key, ctx);
        if !evaluation.diagnostics.is_empty() {
            evaluations.push((key, evaluation));
        }
    }

    let any_errors = evaluations.iter().any(|(_, e)| e.diagnostics.has_errors());

    if args.json {
        let output: Vec<KeyJson<'_>> = evaluations
            .iter()
            .map(|(key, evaluation)| KeyJson {
                key: key.to_string(),
                diagnostics: &evaluation.diagnostics,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else if evaluations.is_empty() {
        println!("{} {} keys checked", "ok:".green().bold(), keys.len());
    } else {
        let mut reports = Vec::new();
        for (key, evaluation) in &evaluations {
            let template = translator.store().get(key).unwrap_or_default();
            for diagnostic in &evaluation.diagnostics {
                let report = Report::new(TemplateDiagnostic::new(
                    key.as_str(),
                    template,
                    diagnostic.clone(),
                ));
                eprintln!("{report:?}");
            }
            let errors = evaluation
                .diagnostics
                .iter()
                .filter(|d| d.severity >= lokal::Severity::Error)
                .count();
            reports.push(KeyReport {
                key: key.to_string(),
                errors,
                warnings: evaluation.diagnostics.len() - errors,
            });
        }
        println!("{}", format_check_table(&reports));
        println!(
            "{} of {} keys have diagnostics",
            evaluations.len().yellow(),
            keys.len()
        );
    }

    if any_errors {
        Ok(exitcode::DATAERR)
    } else {
        Ok(exitcode::OK)
    }
}
