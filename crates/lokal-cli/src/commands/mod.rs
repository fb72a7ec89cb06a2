//! CLI command implementations.

mod check;
mod coverage;
mod eval;
mod keys;

pub use check::{run_check, CheckArgs};
pub use coverage::{run_coverage, CoverageArgs};
pub use eval::{run_eval, EvalArgs};
pub use keys::{run_keys, KeysArgs};
