//! lokal CLI entry point.
//!
//! Provides command-line tools for working with translation dictionaries:
//! - `lokal eval` - Render a template or a key
//! - `lokal keys` - Browse keys by prefix
//! - `lokal check` - Render every key and report diagnostics
//! - `lokal coverage` - Compare key sets across languages

mod commands;
mod dictionary;
mod output;

use std::io::stderr;
use std::process::exit;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{
    run_check, run_coverage, run_eval, run_keys, CheckArgs, CoverageArgs, EvalArgs, KeysArgs,
};
use tracing_subscriber::EnvFilter;

/// Translation dictionary tools.
#[derive(Debug, Parser)]
#[command(name = "lokal")]
#[command(about = "Translation dictionary tools", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Color output control
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, global = true)]
    pub color: ColorWhen,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// When to use colored output.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render every key of a dictionary and report diagnostics
    Check(CheckArgs),
    /// Report translation coverage across languages
    Coverage(CoverageArgs),
    /// Evaluate a template string or a dictionary key
    Eval(EvalArgs),
    /// List completions or all keys below a partial key
    Keys(KeysArgs),
}

/// Set up color output based on user preference.
fn setup_colors(color_when: ColorWhen) {
    match color_when {
        ColorWhen::Auto => {
            // owo-colors automatically checks TTY, NO_COLOR, FORCE_COLOR
        }
        ColorWhen::Always => {
            owo_colors::set_override(true);
        }
        ColorWhen::Never => {
            owo_colors::set_override(false);
        }
    }
}

/// Install the stderr log subscriber. `LOKAL_LOG` overrides `-v`.
fn setup_logging(verbose: u8, color_when: ColorWhen) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("LOKAL_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stderr)
        .with_ansi(!matches!(color_when, ColorWhen::Never))
        .with_target(false)
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    setup_colors(cli.color);
    setup_logging(cli.verbose, cli.color);

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let result = match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Coverage(args) => run_coverage(args),
        Commands::Eval(args) => run_eval(args),
        Commands::Keys(args) => run_keys(args),
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("{:?}", e);
            exit(exitcode::SOFTWARE);
        }
    }
}
