//! iflow-action: runs the iFlow CLI as a GitHub Action or a local command.
//!
//! This is the main entry point. It parses arguments, sets up logging,
//! dispatches to the run, and maps errors to process exit codes.

mod actions;
mod cli;
mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod exit_codes;
pub mod fs;
mod install;
mod logging;
mod settings;
mod summary;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init_logging(cli.log_level);

    match commands::dispatch(&cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);

            // Child exit codes above 255 cannot be represented; report plain failure.
            let code = u8::try_from(err.exit_code()).unwrap_or(exit_codes::FAILURE as u8);
            ExitCode::from(code)
        }
    }
}
