//! Implementation of the `lokal eval` command.

use std::path::PathBuf;

use clap::ValueEnum;
use lokal::{Evaluation, Key, Params, SubtractionMode, TranslationStore, Translator, Value};
use miette::{IntoDiagnostic, miette};
use serde::Serialize;

use crate::dictionary::load_store;

/// Arguments for the eval command.
#[derive(Debug, clap::Args)]
pub struct EvalArgs {
    /// Dictionary file (.json) that `$key$` references resolve against
    #[arg(long)]
    pub dict: Option<PathBuf>,

    /// Template string to evaluate
    #[arg(long, conflicts_with = "key", required_unless_present = "key")]
    pub template: Option<String>,

    /// Dictionary key whose text is evaluated
    #[arg(long)]
    pub key: Option<String>,

    /// Parameters in name=value format (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Expansion depth limit
    #[arg(long, env = "LOKAL_MAX_DEPTH", default_value_t = 16)]
    pub max_depth: usize,

    /// How `a - b` evaluates
    #[arg(long, value_enum, default_value_t = Subtraction::Legacy)]
    pub subtraction: Subtraction,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// `-` operator behavior.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Subtraction {
    /// `a - b` adds, as existing dictionaries expect
    Legacy,
    /// `a - b` subtracts
    Arithmetic,
}

impl From<Subtraction> for SubtractionMode {
    fn from(value: Subtraction) -> Self {
        match value {
            Subtraction::Legacy => SubtractionMode::Legacy,
            Subtraction::Arithmetic => SubtractionMode::Arithmetic,
        }
    }
}

/// JSON output for eval results.
#[derive(Serialize)]
pub struct EvalResult<'a> {
    pub result: &'a str,
    pub diagnostics: &'a lokal::Diagnostics,
}

/// Parse a key=value parameter string.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid parameter format '{s}': expected name=value"))?;
    Ok((name.to_string(), value.to_string()))
}

/// Run the eval command.
pub fn run_eval(args: EvalArgs) -> miette::Result<i32> {
    let store = match &args.dict {
        Some(path) => load_store(path)?,
        None => TranslationStore::new(),
    };
    let translator = Translator::builder()
        .store(store)
        .max_depth(args.max_depth)
        .subtraction(args.subtraction.into())
        .build();

    let params: Params = args
        .params
        .into_iter()
        .map(|(name, value)| (name, Value::parse_literal(&value)))
        .collect();
    let ctx = translator.context(&params);

    let evaluation: Evaluation = match (&args.key, &args.template) {
        (Some(key), _) => {
            let key = Key::parse(key).into_diagnostic()?;
            translator.translate_with(&key, ctx)
        }
        (None, Some(template)) => translator.render(template, ctx),
        (None, None) => return Err(miette!("either --template or --key is required")),
    };

    if args.json {
        let output = EvalResult {
            result: &evaluation.text,
            diagnostics: &evaluation.diagnostics,
        };
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else {
        println!("{}", evaluation.text);
        if !evaluation.diagnostics.is_empty() {
            eprintln!("{}", evaluation.diagnostics.summary());
        }
    }

    if evaluation.diagnostics.has_errors() {
        Ok(exitcode::DATAERR)
    } else {
        Ok(exitcode::OK)
    }
}
