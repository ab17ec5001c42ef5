//! Command implementations for iflow-action.
//!
//! The action has a single command; [`dispatch`] stays the one entry point
//! `main` calls so that CLI parsing and execution remain separate.

mod run;

use crate::cli::Cli;
use crate::error::Result;

/// Dispatch the parsed command line to its implementation.
pub fn dispatch(cli: &Cli) -> Result<()> {
    run::cmd_run(cli)
}
